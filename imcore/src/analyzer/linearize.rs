//! Supertype graph and its cycle-tolerant linearization.

use std::collections::BTreeMap;

use imdecl::{DeclarationGraph, TypeId};
use log::debug;
use petgraph::{algo::tarjan_scc, prelude::DiGraphMap};

/// Edges go from a type to each of its public supertypes; the weight counts
/// along how many inheritance paths the supertype is reached.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    graph: DiGraphMap<TypeId, u64>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph over `types` and their public supertypes.
    pub fn build(decls: &DeclarationGraph, types: &[TypeId]) -> Self {
        let mut graph = TypeGraph::new();
        for ty in types {
            graph.add_type(*ty);
            for sup in decls.recursive_super_types(*ty) {
                if decls.is_public(sup) {
                    graph.add_edge(*ty, sup);
                }
            }
        }
        graph
    }

    pub fn add_type(&mut self, ty: TypeId) {
        self.graph.add_node(ty);
    }

    /// Adds one path from `sub` to `sup`, creating both nodes if needed.
    pub fn add_edge(&mut self, sub: TypeId, sup: TypeId) {
        if let Some(weight) = self.graph.edge_weight_mut(sub, sup) {
            *weight += 1;
        } else {
            self.graph.add_edge(sub, sup, 1);
        }
    }

    /// Number of paths from `sub` to `sup`; zero when unrelated.
    pub fn multiplicity(&self, sub: TypeId, sup: TypeId) -> u64 {
        self.graph.edge_weight(sub, sup).copied().unwrap_or(0)
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        self.graph.contains_node(ty)
    }

    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.graph.nodes()
    }

    pub fn supertypes(&self, ty: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.graph.neighbors(ty)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Orders every type after its supertypes.
    ///
    /// Types on a cycle are still emitted: edges inside a strongly connected
    /// component are ignored, so its members come out together once all of
    /// their supertypes outside the component are placed. Types are emitted
    /// level by level; within a level they are sorted by fully qualified name.
    pub fn linearize(&self, decls: &DeclarationGraph) -> Vec<TypeId> {
        let mut component = BTreeMap::new();
        for (index, scc) in tarjan_scc(&self.graph).into_iter().enumerate() {
            if scc.len() > 1 {
                debug!("Supertype cycle through {} types", scc.len());
            }
            for ty in scc {
                component.insert(ty, index);
            }
        }
        let outside = |sub: &TypeId, sup: &TypeId| component.get(sub) != component.get(sup);

        let mut waiting: BTreeMap<TypeId, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<TypeId, Vec<TypeId>> = BTreeMap::new();
        for ty in self.graph.nodes() {
            let mut count = 0;
            for sup in self.graph.neighbors(ty) {
                if sup != ty && outside(&ty, &sup) {
                    count += 1;
                    dependents.entry(sup).or_default().push(ty);
                }
            }
            waiting.insert(ty, count);
        }

        let mut level: Vec<TypeId> = waiting
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(ty, _)| *ty)
            .collect();
        let mut sorted = Vec::with_capacity(waiting.len());
        while !level.is_empty() {
            level.sort_by(|a, b| decls.ty(*a).fqn.cmp(&decls.ty(*b).fqn).then(a.cmp(b)));
            let mut next = Vec::new();
            for ty in &level {
                for sub in dependents.get(ty).into_iter().flatten() {
                    if let Some(count) = waiting.get_mut(sub) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(*sub);
                        }
                    }
                }
            }
            sorted.append(&mut level);
            level = next;
        }
        sorted
    }
}

#[cfg(test)]
mod tests {
    use imdecl::decl::TypeRef;

    use super::*;

    #[test]
    fn diamond_edges_are_counted() {
        let mut decls = DeclarationGraph::new();
        let top = decls.add_type("p", "Top");
        let left = decls.add_type("p", "Left");
        let right = decls.add_type("p", "Right");
        let bottom = decls.add_type("p", "Bottom");
        decls.ty_mut(left).interfaces.push(TypeRef::class("p.Top"));
        decls.ty_mut(right).interfaces.push(TypeRef::class("p.Top"));
        decls.ty_mut(bottom).interfaces.push(TypeRef::class("p.Left"));
        decls.ty_mut(bottom).interfaces.push(TypeRef::class("p.Right"));

        let graph = TypeGraph::build(&decls, &[bottom, left, right, top]);
        assert_eq!(graph.multiplicity(bottom, top), 2);
        assert_eq!(graph.multiplicity(bottom, left), 1);
        assert_eq!(graph.multiplicity(top, bottom), 0);
        assert_eq!(
            graph.linearize(&decls),
            vec![top, left, right, bottom]
        );
    }

    #[test]
    fn independent_chains_are_emitted_level_by_level() {
        let mut decls = DeclarationGraph::new();
        let a = decls.add_type("p", "A");
        let z = decls.add_type("p", "Z");
        let c = decls.add_type("p", "C");
        let b = decls.add_type("p", "B");
        decls.ty_mut(c).parent = Some(TypeRef::class("p.A"));
        decls.ty_mut(b).parent = Some(TypeRef::class("p.Z"));

        let graph = TypeGraph::build(&decls, &[a, z, c, b]);
        assert_eq!(graph.linearize(&decls), vec![a, z, b, c]);
    }
}
