//! Properties a type reference has by its form alone.

use imdecl::{
    AnalysisStore, Declaration, DeclarationGraph, Property,
    decl::{STRING_LIKE, TypeBase, TypeRef},
    value::Immutable,
};

/// Package whose interfaces are the platform's functional interfaces.
pub const FUNCTIONAL_PACKAGE: &str = "java.util.function";

/// Immutability of values of type `ty`; `None` for `void`.
///
/// Arrays are `FINAL_FIELDS`, type parameters `IMMUTABLE_HC`, primitives
/// `IMMUTABLE`. Types of the graph use their stored value; unknown types are
/// mutable unless string-like.
pub fn type_immutable(
    graph: &DeclarationGraph,
    store: &AnalysisStore,
    ty: &TypeRef,
) -> Option<Immutable> {
    if ty.arrays > 0 {
        return Some(Immutable::FinalFields);
    }
    match &ty.base {
        TypeBase::Void => None,
        TypeBase::TypeParameter { .. } => Some(Immutable::ImmutableHc),
        TypeBase::Primitive(_) => Some(Immutable::Immutable),
        TypeBase::Class { fqn, .. } => Some(match graph.type_by_fqn(fqn) {
            Some(id) => store.get_or(
                Declaration::Type(id),
                Property::ImmutableType,
                Immutable::Mutable,
            ),
            None if STRING_LIKE.contains(&fqn.as_str()) => Immutable::Immutable,
            None => Immutable::Mutable,
        }),
    }
}

/// Whether values of type `ty` are containers.
pub fn type_container(graph: &DeclarationGraph, store: &AnalysisStore, ty: &TypeRef) -> bool {
    if ty.arrays > 0 {
        return true;
    }
    match &ty.base {
        TypeBase::Void | TypeBase::TypeParameter { .. } | TypeBase::Primitive(_) => true,
        TypeBase::Class { fqn, .. } => match graph.type_by_fqn(fqn) {
            Some(id) => store.get_or(Declaration::Type(id), Property::ContainerType, false),
            None => STRING_LIKE.contains(&fqn.as_str()),
        },
    }
}

/// Whether `ty` is one of the platform's functional interfaces.
pub fn is_functional_interface(ty: &TypeRef) -> bool {
    ty.arrays == 0
        && ty
            .best_type_fqn()
            .and_then(|fqn| fqn.rsplit_once('.'))
            .is_some_and(|(package, _)| package == FUNCTIONAL_PACKAGE)
}
