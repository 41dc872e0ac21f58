use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("I/O error on '{}': {source}", file.display())]
    FileError {
        source: std::io::Error,
        file: PathBuf,
    },

    #[error("Failed to parse analysis file '{}': {source}", file.display())]
    JsonParseError {
        source: serde_json::Error,
        file: PathBuf,
    },

    #[error("Invalid analysis JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to write configuration file '{}': {source}", file.display())]
    ConfigWriteError {
        source: toml::ser::Error,
        file: PathBuf,
    },

    #[error("Malformed structural path `{path}`: {reason}")]
    MalformedPath { path: String, reason: String },

    #[error(
        "Structural path `{path}` points at {kind} #{index}, but only {len} exist. The declaration graph changed since the analysis was written."
    )]
    PathIndexOutOfRange {
        path: String,
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error(
        "Structural path `{path}` expects `{expected}` at its position, but the declaration graph has `{found}` there. Sibling order changed since the analysis was written."
    )]
    NameMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Type '{fqn}' cannot be resolved")]
    UnknownType { fqn: String },

    #[error("Unknown property key '{key}' in entry `{path}`")]
    UnknownProperty { key: String, path: String },

    #[error("Cannot decode value of '{property}' in entry `{path}`: {reason}")]
    UndecodableValue {
        property: String,
        path: String,
        reason: String,
    },

    #[error("{0}")]
    Model(#[from] imdecl::utils::Error),
}

pub type ShResult<T> = Result<T, ShError>;
