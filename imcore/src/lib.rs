//! Shallow property inference engine.
//!
//! Property markers are compiled into property maps ([`compiler`]), propagated
//! and checked over the supertype hierarchy ([`analyzer`]), transferred from
//! stand-in declarations onto real ones ([`transfer`]) and persisted keyed by
//! structural position ([`codec`], [`library`]). [`pipeline::Pipeline`] runs
//! the whole chain from a [`conf::ShallowConfig`].

pub mod analyzer;
pub mod codec;
pub mod compiler;
pub mod conf;
pub mod diagnostics;
pub mod getset;
pub mod hierarchy;
pub mod library;
pub mod pipeline;
pub mod provider;
pub mod transfer;
pub mod utils;

pub use imdecl;
