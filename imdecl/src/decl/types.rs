use std::fmt;

use strum::{Display, EnumIter, EnumString};

/// Fully qualified names of class types that behave like primitives for sharing purposes.
pub const STRING_LIKE: &[&str] = &["java.lang.String", "java.lang.Class"];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeBase {
    Void,
    Primitive(Primitive),
    Class { fqn: String, args: Vec<TypeRef> },
    /// A named type parameter; bounds are not tracked.
    TypeParameter { name: String },
}

/// A (possibly parameterized, possibly array) type as written in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef {
    pub base: TypeBase,
    pub arrays: u8,
}

impl TypeRef {
    pub fn void() -> Self {
        TypeRef {
            base: TypeBase::Void,
            arrays: 0,
        }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        TypeRef {
            base: TypeBase::Primitive(primitive),
            arrays: 0,
        }
    }

    pub fn class(fqn: impl Into<String>) -> Self {
        TypeRef {
            base: TypeBase::Class {
                fqn: fqn.into(),
                args: Vec::new(),
            },
            arrays: 0,
        }
    }

    pub fn generic(fqn: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        TypeRef {
            base: TypeBase::Class {
                fqn: fqn.into(),
                args: args.into_iter().collect(),
            },
            arrays: 0,
        }
    }

    pub fn type_parameter(name: impl Into<String>) -> Self {
        TypeRef {
            base: TypeBase::TypeParameter { name: name.into() },
            arrays: 0,
        }
    }

    pub fn string() -> Self {
        TypeRef::class("java.lang.String")
    }

    pub fn with_arrays(mut self, arrays: u8) -> Self {
        self.arrays = arrays;
        self
    }

    pub fn is_void(&self) -> bool {
        self.arrays == 0 && self.base == TypeBase::Void
    }

    pub fn is_primitive_excluding_void(&self) -> bool {
        self.arrays == 0 && matches!(self.base, TypeBase::Primitive(_))
    }

    /// Primitive, or one of the [`STRING_LIKE`] classes, without array dimensions.
    pub fn is_primitive_string_class(&self) -> bool {
        if self.arrays > 0 {
            return false;
        }
        match &self.base {
            TypeBase::Primitive(_) => true,
            TypeBase::Class { fqn, .. } => STRING_LIKE.contains(&fqn.as_str()),
            _ => false,
        }
    }

    pub fn is_type_parameter(&self) -> bool {
        matches!(self.base, TypeBase::TypeParameter { .. })
    }

    /// The class this type is built on, ignoring arrays and type arguments.
    pub fn best_type_fqn(&self) -> Option<&str> {
        match &self.base {
            TypeBase::Class { fqn, .. } => Some(fqn),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[TypeRef] {
        match &self.base {
            TypeBase::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Parameter-type compatibility used when matching stand-in declarations.
    ///
    /// A type parameter matches any type parameter, whatever its name or
    /// bound. A concrete type matches the same concrete type (type arguments
    /// ignored) at the same array depth.
    pub fn is_transfer_compatible(&self, other: &TypeRef) -> bool {
        match (&self.base, &other.base) {
            (TypeBase::TypeParameter { .. }, TypeBase::TypeParameter { .. }) => true,
            (TypeBase::TypeParameter { .. }, _) | (_, TypeBase::TypeParameter { .. }) => false,
            (TypeBase::Class { fqn: a, .. }, TypeBase::Class { fqn: b, .. }) => {
                a == b && self.arrays == other.arrays
            }
            (a, b) => a == b && self.arrays == other.arrays,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            TypeBase::Void => write!(f, "void")?,
            TypeBase::Primitive(p) => write!(f, "{p}")?,
            TypeBase::Class { fqn, args } => {
                write!(f, "{fqn}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
            }
            TypeBase::TypeParameter { name } => write!(f, "{name}")?,
        }
        for _ in 0..self.arrays {
            write!(f, "[]")?;
        }
        Ok(())
    }
}
