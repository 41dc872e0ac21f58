//! The shallow analyzer: hierarchy propagation and consistency checking.
//!
//! Starting from a set of root types, the analyzer collects every publicly
//! reachable type together with its public supertypes, orders them so that
//! supertypes come first, and then runs three passes:
//!
//! 1. types: markers are compiled and type-level defaults are filled in;
//! 2. members: fields, then constructors and methods with their parameters,
//!    type by type, with defaults derived from the owner and from overridden
//!    methods;
//! 3. checks: type-level values are compared with the values of the public
//!    supertypes, and violations become diagnostics.
//!
//! Declarations already marked [`AnalysisState::Done`](imdecl::AnalysisState)
//! in the store are left alone. Diagnostics about a declaration end up both in
//! [`ShallowAnalyzer::diagnostics`] and as the declaration's `message` value.

mod check;
pub mod formal;
pub mod linearize;
mod members;
mod types;

use std::collections::BTreeMap;

use imdecl::{AnalysisStore, Declaration, DeclarationGraph, Property, TypeId};
use log::{debug, info};

use crate::{
    compiler::{CompiledMap, MarkerCompiler},
    diagnostics::Diagnostics,
    provider::MarkerProvider,
    utils::error::ShResult,
};

pub use linearize::TypeGraph;

pub struct ShallowAnalyzer<'a, P: MarkerProvider> {
    graph: &'a DeclarationGraph,
    provider: &'a P,
    all_types: Vec<TypeId>,
    type_graph: TypeGraph,
    sorted: Vec<TypeId>,
    diagnostics: Diagnostics,
}

impl<'a, P: MarkerProvider> ShallowAnalyzer<'a, P> {
    pub fn new(graph: &'a DeclarationGraph, provider: &'a P) -> Self {
        ShallowAnalyzer {
            graph,
            provider,
            all_types: Vec::new(),
            type_graph: TypeGraph::new(),
            sorted: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Analyzes `roots`, their public nested types and all public supertypes.
    ///
    /// Returns the types in the order they were analyzed.
    pub fn go(&mut self, roots: &[TypeId], store: &mut AnalysisStore) -> ShResult<Vec<TypeId>> {
        self.all_types = self.collect_types(roots);
        self.type_graph = TypeGraph::build(self.graph, &self.all_types);
        self.sorted = self.type_graph.linearize(self.graph);
        info!(
            "Shallow analysis of {} types ({} roots)",
            self.sorted.len(),
            roots.len()
        );

        let sorted = self.sorted.clone();
        for ty in &sorted {
            self.analyze_type(*ty, store)?;
        }
        for ty in &sorted {
            self.analyze_members(*ty, store)?;
        }
        for ty in &sorted {
            self.check(*ty, store);
        }
        self.attach_messages(store)?;
        info!(
            "Shallow analysis done, {} diagnostics",
            self.diagnostics.len()
        );
        Ok(sorted)
    }

    fn collect_types(&self, roots: &[TypeId]) -> Vec<TypeId> {
        let mut seen = bit_set::BitSet::new();
        let mut out = Vec::new();
        let mut push = |ty: TypeId, out: &mut Vec<TypeId>| {
            if seen.insert(ty.index()) {
                out.push(ty);
            }
        };
        for root in roots {
            for ty in self.graph.recursive_subtypes(*root) {
                if self.graph.is_type_publicly_accessible(ty) {
                    push(ty, &mut out);
                }
            }
        }
        let reachable = out.clone();
        for ty in reachable {
            for sup in self.graph.recursive_super_types(ty) {
                if self.graph.is_public(sup) {
                    push(sup, &mut out);
                }
            }
        }
        out
    }

    /// Compiles the markers of `decl`; a malformed marker leaves it with no explicit values.
    fn compile(&mut self, decl: Declaration, store: &AnalysisStore) -> CompiledMap {
        let provider = self.provider;
        let markers = provider.markers(self.graph, decl);
        match MarkerCompiler::new(self.graph, store).compile(decl, markers, &mut self.diagnostics) {
            Ok(map) => map,
            Err(err) => {
                self.diagnostics
                    .warn_on(decl, self.graph.describe(decl), err.to_string());
                CompiledMap::new()
            }
        }
    }

    /// Stores explicit values; values already present (loaded from a previous run) win.
    fn store_compiled(
        &self,
        decl: Declaration,
        compiled: CompiledMap,
        store: &mut AnalysisStore,
    ) -> ShResult<()> {
        for (property, value) in compiled {
            if !store.set_if_absent(decl, property, value)? {
                debug!(
                    "Keeping stored {property} of {}",
                    self.graph.describe(decl)
                );
            }
        }
        Ok(())
    }

    fn attach_messages(&self, store: &mut AnalysisStore) -> ShResult<()> {
        let mut messages: BTreeMap<Declaration, Vec<&str>> = BTreeMap::new();
        for diagnostic in self.diagnostics.iter() {
            if let Some(decl) = diagnostic.decl {
                messages.entry(decl).or_default().push(&diagnostic.text);
            }
        }
        for (decl, texts) in messages {
            store.set_if_absent(decl, Property::Message, texts.join("; ").into())?;
        }
        Ok(())
    }

    /// Every type considered, roots and nested types first, then supertypes.
    pub fn all_types(&self) -> &[TypeId] {
        &self.all_types
    }

    pub fn type_graph(&self) -> &TypeGraph {
        &self.type_graph
    }

    /// Types in analysis order.
    pub fn sorted(&self) -> &[TypeId] {
        &self.sorted
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}
