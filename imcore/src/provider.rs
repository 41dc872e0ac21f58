use std::collections::BTreeMap;

use imdecl::{Declaration, DeclarationGraph, Marker};

/// Supplies the ordered property markers of a declaration.
pub trait MarkerProvider {
    fn markers<'a>(&'a self, graph: &'a DeclarationGraph, decl: Declaration) -> &'a [Marker];
}

/// Markers written directly on the declarations of the analyzed graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredMarkers;

impl MarkerProvider for DeclaredMarkers {
    fn markers<'a>(&'a self, graph: &'a DeclarationGraph, decl: Declaration) -> &'a [Marker] {
        graph.markers(decl)
    }
}

/// Markers kept apart from the graph, keyed by declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerMap {
    markers: BTreeMap<Declaration, Vec<Marker>>,
}

impl MarkerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the markers of `decl`, returning the previous ones.
    pub fn insert(&mut self, decl: Declaration, markers: Vec<Marker>) -> Option<Vec<Marker>> {
        self.markers.insert(decl, markers)
    }

    pub fn get(&self, decl: Declaration) -> Option<&[Marker]> {
        self.markers.get(&decl).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Declaration, &[Marker])> {
        self.markers.iter().map(|(d, m)| (*d, m.as_slice()))
    }
}

impl MarkerProvider for MarkerMap {
    fn markers<'a>(&'a self, _graph: &'a DeclarationGraph, decl: Declaration) -> &'a [Marker] {
        self.get(decl).unwrap_or(&[])
    }
}
