//! Property keys.
//!
//! A property names what is measured and on which kind of declaration. Its
//! camelCase name doubles as the key in persisted analyses.

use enum_map::Enum;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    decl::DeclKind,
    value::{CommutableData, Immutable, Independent, NotNull, Value, ValueKind, VariableBooleanMap},
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Enum,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Property {
    // types
    ImmutableType,
    IndependentType,
    ContainerType,

    // methods and constructors
    FluentMethod,
    IdentityMethod,
    GetSetField,
    GetSetEquivalent,
    ImmutableMethod,
    IndependentMethod,
    ContainerMethod,
    NotNullMethod,
    ModifiedMethod,
    AllowsInterrupts,
    StaticSideEffects,
    CommutableMethods,
    ModifiedComponentsMethod,

    // fields
    ImmutableField,
    IndependentField,
    ContainerField,
    NotNullField,
    ModifiedField,
    FinalField,
    IgnoreModificationsField,

    // parameters
    ImmutableParameter,
    IndependentParameter,
    ContainerParameter,
    NotNullParameter,
    ModifiedParameter,
    IgnoreModificationsParameter,
    ModifiedComponentsParameter,

    /// Analyzer note, legal everywhere.
    Message,
}

impl Property {
    /// Whether the property may be stored on a declaration of this kind.
    pub fn is_legal_on(self, kind: DeclKind) -> bool {
        use Property::*;
        match self {
            ImmutableType | IndependentType | ContainerType => kind == DeclKind::Type,
            FluentMethod
            | IdentityMethod
            | GetSetField
            | GetSetEquivalent
            | ImmutableMethod
            | IndependentMethod
            | ContainerMethod
            | NotNullMethod
            | ModifiedMethod
            | AllowsInterrupts
            | StaticSideEffects
            | CommutableMethods
            | ModifiedComponentsMethod => kind == DeclKind::Method,
            ImmutableField | IndependentField | ContainerField | NotNullField | ModifiedField
            | FinalField | IgnoreModificationsField => kind == DeclKind::Field,
            ImmutableParameter
            | IndependentParameter
            | ContainerParameter
            | NotNullParameter
            | ModifiedParameter
            | IgnoreModificationsParameter
            | ModifiedComponentsParameter => kind == DeclKind::Parameter,
            Message => true,
        }
    }

    pub fn value_kind(self) -> ValueKind {
        use Property::*;
        match self {
            ImmutableType | ImmutableMethod | ImmutableField | ImmutableParameter => {
                ValueKind::Immutable
            }
            IndependentType | IndependentMethod | IndependentField | IndependentParameter => {
                ValueKind::Independent
            }
            NotNullMethod | NotNullField | NotNullParameter => ValueKind::NotNull,
            ContainerType | FluentMethod | IdentityMethod | ContainerMethod | ModifiedMethod
            | AllowsInterrupts | StaticSideEffects | ContainerField | ModifiedField
            | FinalField | IgnoreModificationsField | ContainerParameter | ModifiedParameter
            | IgnoreModificationsParameter => ValueKind::Bool,
            GetSetField => ValueKind::FieldValue,
            GetSetEquivalent => ValueKind::GetSetEquivalent,
            CommutableMethods => ValueKind::Commutable,
            ModifiedComponentsMethod | ModifiedComponentsParameter => {
                ValueKind::VariableBooleanMap
            }
            Message => ValueKind::Message,
        }
    }

    /// The conservative value assumed when the property is absent.
    ///
    /// Reference-like properties (field references, accessor equivalences,
    /// messages) have no meaningful default and return `None`.
    pub fn default_value(self) -> Option<Value> {
        match self.value_kind() {
            ValueKind::Immutable => Some(Immutable::Mutable.into()),
            ValueKind::Independent => Some(Independent::DEPENDENT.into()),
            ValueKind::NotNull => Some(NotNull::Nullable.into()),
            ValueKind::Bool => Some(false.into()),
            ValueKind::Commutable => Some(CommutableData::default().into()),
            ValueKind::VariableBooleanMap => Some(VariableBooleanMap::default().into()),
            ValueKind::FieldValue | ValueKind::GetSetEquivalent | ValueKind::Message => None,
        }
    }

    pub fn key(self) -> &'static str {
        self.into()
    }
}
