//! Values combined over a type's supertype hierarchy.

use bit_set::BitSet;
use imdecl::{
    AnalysisStore, Declaration, DeclarationGraph, Property, TypeId,
    value::{Immutable, Independent, Lattice, TypedValue},
};

/// The most conservative value of `property` among the public supertypes of `ty`.
///
/// Starts from `ceiling` and takes the lattice minimum with the stored value of
/// every public parent class and public interface, recursively, using
/// `default` for supertypes without a value. `ty` itself does not contribute.
/// Each type is visited once; a type reached again (through a diamond or a
/// cycle) contributes nothing beyond what it already did, which is the same
/// as contributing `ceiling`.
pub fn least_of_hierarchy<T>(
    graph: &DeclarationGraph,
    store: &AnalysisStore,
    ty: TypeId,
    property: Property,
    default: T,
    ceiling: T,
) -> T
where
    T: TypedValue + Lattice,
{
    let mut visited = BitSet::new();
    visited.insert(ty.index());
    let mut stack = graph.direct_super_types(ty);
    stack.reverse();
    let mut least = ceiling;
    while let Some(sup) = stack.pop() {
        if !visited.insert(sup.index()) || !graph.is_public(sup) {
            continue;
        }
        let value = store.get_or(Declaration::Type(sup), property, default.clone());
        least = least.meet(&value);
        let mut supers = graph.direct_super_types(sup);
        supers.reverse();
        stack.extend(supers);
    }
    least
}

/// Whether every publicly accessible constructor and method of `ty` only takes
/// and returns primitive or string-like values.
pub fn only_primitive_signatures(graph: &DeclarationGraph, ty: TypeId) -> bool {
    graph
        .constructors_and_methods(ty)
        .filter(|m| graph.is_method_publicly_accessible(*m))
        .all(|m| {
            let method = graph.method(m);
            let returns_ok = method.kind.is_constructor()
                || method.return_type.is_void()
                || method.return_type.is_primitive_string_class();
            returns_ok
                && method
                    .params
                    .iter()
                    .all(|p| p.ty.is_primitive_string_class())
        })
}

/// Default sharing level of a type, or of a member of that type, without an explicit marker.
///
/// `immutable` is the mutability of the type; it is passed in because the
/// type's own map may still be under construction.
pub fn structural_independence(
    graph: &DeclarationGraph,
    store: &AnalysisStore,
    ty: TypeId,
    immutable: Option<Immutable>,
) -> Independent {
    if let Some(immutable) = immutable {
        if immutable.is_immutable() {
            return Independent::INDEPENDENT;
        }
        if immutable.is_at_least_immutable_hc() {
            return Independent::INDEPENDENT_HC;
        }
    }
    if only_primitive_signatures(graph, ty) {
        return least_of_hierarchy(
            graph,
            store,
            ty,
            Property::IndependentType,
            Independent::DEPENDENT,
            Independent::INDEPENDENT,
        );
    }
    Independent::DEPENDENT
}

#[cfg(test)]
mod tests {
    use imdecl::decl::{Access, Primitive, TypeRef};

    use super::*;

    #[test]
    fn least_of_hierarchy_ignores_non_public_supertypes() {
        let mut graph = DeclarationGraph::new();
        let hidden = graph.add_type("p", "Hidden");
        let visible = graph.add_type("p", "Visible");
        let sub = graph.add_type("p", "Sub");
        graph.ty_mut(hidden).access = Access::Package;
        graph.ty_mut(sub).parent = Some(TypeRef::class("p.Hidden"));
        graph.ty_mut(sub).interfaces.push(TypeRef::class("p.Visible"));

        let mut store = AnalysisStore::new();
        store
            .set(
                Declaration::Type(visible),
                Property::ImmutableType,
                Immutable::FinalFields.into(),
            )
            .unwrap();
        let least = least_of_hierarchy(
            &graph,
            &store,
            sub,
            Property::ImmutableType,
            Immutable::Mutable,
            Immutable::Immutable,
        );
        assert_eq!(least, Immutable::FinalFields);
    }

    #[test]
    fn least_of_hierarchy_terminates_on_cycles() {
        let mut graph = DeclarationGraph::new();
        let a = graph.add_type("p", "A");
        let b = graph.add_type("p", "B");
        graph.ty_mut(a).parent = Some(TypeRef::class("p.B"));
        graph.ty_mut(b).parent = Some(TypeRef::class("p.A"));
        let store = AnalysisStore::new();
        let least = least_of_hierarchy(
            &graph,
            &store,
            a,
            Property::ContainerType,
            true,
            true,
        );
        assert!(least);
    }

    #[test]
    fn non_primitive_signatures_default_to_dependent() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "Holder");
        let get = graph.add_method(ty, "get", TypeRef::class("java.util.List"));
        let size = graph.add_method(ty, "size", TypeRef::primitive(Primitive::Int));
        graph.add_parameter(size, "from", TypeRef::string());
        let store = AnalysisStore::new();
        assert!(!only_primitive_signatures(&graph, ty));
        assert_eq!(
            structural_independence(&graph, &store, ty, None),
            Independent::DEPENDENT
        );
        graph.method_mut(get).access = Access::Private;
        assert!(only_primitive_signatures(&graph, ty));
        assert_eq!(
            structural_independence(&graph, &store, ty, Some(Immutable::ImmutableHc)),
            Independent::INDEPENDENT_HC
        );
    }
}
