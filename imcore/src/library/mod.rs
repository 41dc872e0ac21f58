//! Persisted analyses on disk: one file per package, one directory per library.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use imdecl::{AnalysisStore, DeclarationGraph, TypeId};
use log::{debug, info, warn};

use crate::{
    codec::{self, Decoder, EncodedEntry, Encoder},
    conf::ShallowConfig,
    utils::error::{ShError, ShResult},
};

/// Extension of persisted analysis files.
pub const EXTENSION: &str = "json";

/// Primary types grouped by package, one node per package name part.
#[derive(Debug, Clone, Default)]
pub struct PackageTrie {
    types: Vec<TypeId>,
    children: BTreeMap<String, PackageTrie>,
}

impl PackageTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: &str, ty: TypeId) {
        let mut node = self;
        for part in package.split('.').filter(|p| !p.is_empty()) {
            node = node.children.entry(part.to_string()).or_default();
        }
        if !node.types.contains(&ty) {
            node.types.push(ty);
        }
    }

    /// Packages holding types, in lexicographic order of their parts.
    pub fn packages(&self) -> Vec<(String, &[TypeId])> {
        let mut out = Vec::new();
        self.collect(&mut Vec::new(), &mut out);
        out
    }

    fn collect<'a>(&'a self, prefix: &mut Vec<&'a str>, out: &mut Vec<(String, &'a [TypeId])>) {
        if !self.types.is_empty() {
            out.push((prefix.join("."), self.types.as_slice()));
        }
        for (part, child) in &self.children {
            prefix.push(part);
            child.collect(prefix, out);
            prefix.pop();
        }
    }
}

/// File name of a package: its capitalized parts joined, `org.e2immu` → `OrgE2immu.json`.
pub fn file_name(package: &str) -> String {
    let mut name: String = package
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if name.is_empty() {
        name.push_str("DefaultPackage");
    }
    format!("{name}.{EXTENSION}")
}

pub struct LibraryWriter<'a> {
    config: &'a ShallowConfig,
}

impl<'a> LibraryWriter<'a> {
    pub fn new(config: &'a ShallowConfig) -> Self {
        LibraryWriter { config }
    }

    /// Writes the primary types of `types` below `target`; returns the files written.
    pub fn write(
        &self,
        graph: &DeclarationGraph,
        store: &AnalysisStore,
        types: &[TypeId],
        target: &Path,
    ) -> ShResult<Vec<PathBuf>> {
        let mut trie = PackageTrie::new();
        for ty in types {
            let primary = graph.primary_type_of(*ty);
            trie.insert(&graph.ty(primary).package, primary);
        }

        let encoder = Encoder::new(graph, store);
        let mut written = Vec::new();
        for (package, types) in trie.packages() {
            let entries: Vec<EncodedEntry> = encoder.encode_all(types);
            if entries.is_empty() {
                debug!("Nothing to write for package {package}");
                continue;
            }
            let dir = target.join(self.config.library_dir(&package));
            std::fs::create_dir_all(&dir).map_err(|e| ShError::FileError {
                source: e,
                file: dir.clone(),
            })?;
            let file = dir.join(file_name(&package));
            std::fs::write(&file, Encoder::to_json(&entries)?).map_err(|e| ShError::FileError {
                source: e,
                file: file.clone(),
            })?;
            info!("Wrote {} types of {package} to {}", entries.len(), file.display());
            written.push(file);
        }
        Ok(written)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub values: usize,
    /// Directories that could not be read.
    pub skipped: usize,
}

pub struct LibraryLoader<'a> {
    graph: &'a DeclarationGraph,
}

impl<'a> LibraryLoader<'a> {
    pub fn new(graph: &'a DeclarationGraph) -> Self {
        LibraryLoader { graph }
    }

    /// Loads every analysis file below `dirs`, recursively.
    ///
    /// Directories that cannot be read are skipped with a warning. A file that
    /// fails to decode aborts the load; the files before it stay applied.
    pub fn load(&self, dirs: &[PathBuf], store: &mut AnalysisStore) -> ShResult<LoadSummary> {
        let mut summary = LoadSummary::default();
        let mut files = Vec::new();
        for dir in dirs {
            summary.skipped += collect_files(dir, &mut files)?;
        }
        for file in files {
            summary.values += self.load_file(&file, store)?;
            summary.files += 1;
        }
        info!(
            "Loaded {} values from {} analysis files",
            summary.values, summary.files
        );
        Ok(summary)
    }

    pub fn load_file(&self, file: &Path, store: &mut AnalysisStore) -> ShResult<usize> {
        let text = std::fs::read_to_string(file).map_err(|e| ShError::FileError {
            source: e,
            file: file.to_path_buf(),
        })?;
        let entries: Vec<EncodedEntry> =
            serde_json::from_str(&text).map_err(|e| ShError::JsonParseError {
                source: e,
                file: file.to_path_buf(),
            })?;
        let decoded = Decoder::new(self.graph).decode_entries(&entries)?;
        let stored = codec::apply(decoded, store)?;
        debug!("Loaded {stored} values from {}", file.display());
        Ok(stored)
    }
}

/// Collects analysis files below `dir`; returns the number of unreadable directories.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> ShResult<usize> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            warn!("Skipping analyzed directory {}: {e}", dir.display());
            return Ok(1);
        }
    };
    let mut paths = read
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ShError::FileError {
            source: e,
            file: dir.to_path_buf(),
        })?;
    paths.sort();
    let mut skipped = 0;
    for path in paths {
        if path.is_dir() {
            skipped += collect_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == EXTENSION) {
            out.push(path);
        }
    }
    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_capitalize_package_parts() {
        assert_eq!(file_name("org.e2immu"), "OrgE2immu.json");
        assert_eq!(file_name("java.util.function"), "JavaUtilFunction.json");
        assert_eq!(file_name(""), "DefaultPackage.json");
    }

    #[test]
    fn trie_lists_packages_in_order() {
        let mut trie = PackageTrie::new();
        trie.insert("java.util", TypeId(2));
        trie.insert("java.lang", TypeId(0));
        trie.insert("java.util", TypeId(1));
        trie.insert("java.util", TypeId(2));
        trie.insert("java.util.function", TypeId(3));
        let packages = trie.packages();
        let names: Vec<&str> = packages.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["java.lang", "java.util", "java.util.function"]);
        assert_eq!(packages[1].1, &[TypeId(2), TypeId(1)]);
    }
}
