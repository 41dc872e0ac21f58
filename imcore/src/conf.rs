use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::utils::error::{ShError, ShResult};

/// Environment variable overriding the location of the configuration file.
pub const ENV_CONFIG_PATH: &str = "SHALLOW_CONFIG_PATH";

/// Subdirectory of packages that belong to no configured library.
pub const DEFAULT_LIBRARY: &str = "default";

/// Identity of a library the persisted analysis is grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryId {
    pub name: String,
    /// Content hash of the analyzed library, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl LibraryId {
    pub fn new(name: impl Into<String>) -> Self {
        LibraryId {
            name: name.into(),
            hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowConfig {
    /// Directories holding analyses written by earlier runs, loaded before analyzing.
    #[serde(default)]
    pub analyzed_dirs: Vec<PathBuf>,

    /// Where the analysis is written; nothing is written without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,

    /// Target packages the transfer is restricted to; empty means all.
    #[serde(default)]
    pub packages: BTreeSet<String>,

    /// Library identity per package prefix.
    #[serde(default)]
    pub libraries: BTreeMap<String, LibraryId>,
}

impl ShallowConfig {
    /// Get the default path of the configuration file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }
        PathBuf::from("shallow.toml")
    }

    pub fn with_analyzed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.analyzed_dirs.push(dir.into());
        self
    }

    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.packages.insert(package.into());
        self
    }

    pub fn with_library(mut self, prefix: impl Into<String>, library: LibraryId) -> Self {
        self.libraries.insert(prefix.into(), library);
        self
    }

    /// Parses a configuration; `file` only names the source in errors.
    pub fn from_toml_str(text: &str, file: &str) -> ShResult<Self> {
        toml::from_str(text).map_err(|e| ShError::ConfigParseError {
            source: e,
            file: file.to_string(),
        })
    }

    pub fn load_from_toml(path: &Path) -> ShResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ShError::FileError {
            source: e,
            file: path.to_path_buf(),
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    pub fn save_to_toml(&self, path: &Path) -> ShResult<()> {
        let text = toml::to_string(self).map_err(|e| ShError::ConfigWriteError {
            source: e,
            file: path.to_path_buf(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text).map_err(|e| ShError::FileError {
            source: e,
            file: path.to_path_buf(),
        })
    }

    /// The library of `package`: the one with the longest matching prefix.
    ///
    /// A prefix matches the package itself and every package below it.
    pub fn library_of(&self, package: &str) -> Option<&LibraryId> {
        self.libraries
            .iter()
            .filter(|(prefix, _)| {
                package == prefix.as_str()
                    || package
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, library)| library)
    }

    /// Name of the subdirectory `package` is written to.
    pub fn library_dir(&self, package: &str) -> &str {
        self.library_of(package)
            .map_or(DEFAULT_LIBRARY, |library| library.name.as_str())
    }
}
