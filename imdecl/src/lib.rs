//! Declaration and property model for the shallow immutability analyzer.
//!
//! The crate holds everything the engine reasons about but does not compute:
//! the declaration graph handed over by a front end ([`decl`]), the closed
//! catalog of property markers ([`marker`]), the properties and their lattice
//! values ([`property`], [`value`]) and the per-declaration stores those values
//! live in ([`map`]).

pub mod decl;
pub mod map;
pub mod marker;
pub mod property;
pub mod utils;
pub mod value;

pub use decl::{
    DeclKind, Declaration, DeclarationGraph, FieldId, MethodId, ParamRef, TypeId, TypeResolver,
};
pub use map::{AnalysisState, AnalysisStore, PropertyMap};
pub use marker::{AttrValue, Marker, MarkerKind};
pub use property::Property;
pub use value::{Immutable, Independent, Lattice, NotNull, Value, ValueKind};
