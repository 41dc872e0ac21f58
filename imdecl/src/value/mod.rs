//! Lattice values attached to properties.
//!
//! Every ordered value kind implements [`Lattice`]: a total order whose
//! [`Lattice::meet`] is the most conservative of two values. The remaining
//! kinds (field references, accessor equivalences, commutativity records,
//! modification maps and messages) are plain data carried in [`Value`].

mod level;
mod record;

use std::fmt;

use strum::{EnumDiscriminants, EnumIs, EnumTryAs};

pub use level::{Immutable, Independent, IndependentLevel, NotNull};
pub use record::{CommutableData, FieldValue, GetSetEquivalent, VariableBooleanMap};

/// A bounded, totally ordered lattice.
///
/// `meet` is the lattice `min` ("most conservative wins"), `join` the `max`.
/// Both are derived from the total order, which makes them associative,
/// commutative and idempotent.
pub trait Lattice: Ord + Clone {
    /// The least element.
    fn bottom() -> Self;

    /// The greatest element.
    fn top() -> Self;

    fn meet(&self, other: &Self) -> Self {
        if self <= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    fn join(&self, other: &Self) -> Self {
        if self >= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    fn is_at_least(&self, other: &Self) -> bool {
        self >= other
    }
}

impl Lattice for bool {
    fn bottom() -> Self {
        false
    }

    fn top() -> Self {
        true
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash, PartialOrd, Ord, strum::Display))]
pub enum Value {
    Immutable(Immutable),
    Independent(Independent),
    Bool(bool),
    NotNull(NotNull),
    FieldValue(FieldValue),
    GetSetEquivalent(GetSetEquivalent),
    Commutable(CommutableData),
    VariableBooleanMap(VariableBooleanMap),
    Message(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        ValueKind::from(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Immutable(v) => write!(f, "{v}"),
            Value::Independent(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::NotNull(v) => write!(f, "{v}"),
            Value::FieldValue(v) => write!(
                f,
                "{}({})",
                if v.setter { "set" } else { "get" },
                v.field
            ),
            Value::GetSetEquivalent(v) => {
                write!(f, "equivalent({}, {:?})", v.method, v.convert_to_get_set)
            }
            Value::Commutable(v) => write!(f, "commutable({}|{}|{})", v.seq, v.par, v.multi),
            Value::VariableBooleanMap(v) => write!(f, "{:?}", v.0),
            Value::Message(m) => write!(f, "{m:?}"),
        }
    }
}

/// Bridges a concrete value type and the [`Value`] variant that carries it.
pub trait TypedValue: Clone + Into<Value> {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<&Self>;
}

macro_rules! typed_value {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl TypedValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

typed_value!(Immutable, Immutable);
typed_value!(Independent, Independent);
typed_value!(bool, Bool);
typed_value!(NotNull, NotNull);
typed_value!(FieldValue, FieldValue);
typed_value!(GetSetEquivalent, GetSetEquivalent);
typed_value!(CommutableData, Commutable);
typed_value!(VariableBooleanMap, VariableBooleanMap);
typed_value!(String, Message);
