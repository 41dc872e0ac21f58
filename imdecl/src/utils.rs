use strum::EnumIs;
use thiserror::Error;

use crate::{decl::DeclKind, property::Property, value::ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum Error {
    /// Raw components do not describe a valid lattice value.
    #[error("Malformed value: {reason}")]
    MalformedValue { reason: String },

    /// A marker carries an attribute its kind does not accept, or an attribute of the wrong type.
    #[error("Marker `{marker}` is malformed: {reason}")]
    MalformedMarker { marker: String, reason: String },

    /// The marker name is not part of the closed marker catalog.
    #[error(
        "Unknown marker `{name}`. Only markers of the `{namespace}` namespace with a known kind are accepted."
    )]
    UnknownMarker {
        name: String,
        namespace: &'static str,
    },

    /// Property maps are set-once per key.
    #[error(
        "Property `{property}` already holds `{old}`; refusing to overwrite it with the different value `{new}`."
    )]
    ValueOverwrite {
        property: Property,
        old: String,
        new: String,
    },

    /// The property is not defined for this kind of declaration.
    #[error("Property `{property}` is not legal on a {kind} declaration.")]
    IllegalProperty { property: Property, kind: DeclKind },

    /// The value does not have the kind the property expects.
    #[error("Property `{property}` expects a value of kind {expected}, but a value of kind {found} was supplied.")]
    ValueKindMismatch {
        property: Property,
        expected: ValueKind,
        found: ValueKind,
    },
}

pub type ModelResult<T> = Result<T, Error>;
