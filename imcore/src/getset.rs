//! Accessor markers: plain getter/setter field references and accessor equivalences.

use std::collections::BTreeSet;

use imdecl::{
    DeclarationGraph, MethodId,
    value::{FieldValue, GetSetEquivalent},
};
use log::debug;

/// Methods an accessor-equivalent method is compared with.
///
/// All constructors for a constructor, otherwise all methods of the owning type
/// with the same name. The target itself is never a candidate.
pub fn equivalence_candidates(graph: &DeclarationGraph, target: MethodId) -> Vec<MethodId> {
    let method = graph.method(target);
    let owner = graph.ty(method.owner);
    if method.kind.is_constructor() {
        owner
            .constructors
            .iter()
            .copied()
            .filter(|c| *c != target)
            .collect()
    } else {
        owner
            .methods
            .iter()
            .copied()
            .filter(|m| *m != target && graph.method(*m).name == method.name)
            .collect()
    }
}

/// Parameters of `target` not absorbed by `candidate`, or `None` when the two are not compatible.
///
/// `candidate` must take strictly fewer parameters, and each of them must
/// match a distinct parameter of `target` with the same name and type.
pub fn unmatched_parameters(
    graph: &DeclarationGraph,
    candidate: MethodId,
    target: MethodId,
) -> Option<BTreeSet<usize>> {
    let candidate_params = &graph.method(candidate).params;
    let target_params = &graph.method(target).params;
    if candidate_params.len() >= target_params.len() {
        return None;
    }
    let mut remaining: BTreeSet<usize> = (0..target_params.len()).collect();
    for param in candidate_params {
        let hit = remaining.iter().copied().find(|i| {
            let other = &target_params[*i];
            other.name == param.name && other.ty == param.ty
        })?;
        remaining.remove(&hit);
    }
    Some(remaining)
}

/// Outcome of accessor-equivalence resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceResolution {
    pub equivalent: GetSetEquivalent,
    /// Other candidates that absorb as many parameters as the selected one.
    pub tied_with: Vec<MethodId>,
}

/// Picks the smallest compatible candidate for `target`.
///
/// The candidate leaving the most target parameters unmatched wins. Equal
/// counts are broken by the candidate's signature, then by declaration order,
/// so the outcome does not depend on the order candidates are listed in.
pub fn resolve_equivalence(
    graph: &DeclarationGraph,
    target: MethodId,
) -> Option<EquivalenceResolution> {
    let mut compatible: Vec<(usize, String, MethodId, BTreeSet<usize>)> =
        equivalence_candidates(graph, target)
            .into_iter()
            .filter_map(|candidate| {
                let unmatched = unmatched_parameters(graph, candidate, target)?;
                Some((
                    unmatched.len(),
                    graph.method_signature(candidate),
                    candidate,
                    unmatched,
                ))
            })
            .collect();
    // most unmatched parameters first, then by signature and declaration order
    compatible.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    let mut ranked = compatible.into_iter();
    let (count, signature, method, convert_to_get_set) = ranked.next()?;
    let tied_with: Vec<MethodId> = ranked
        .take_while(|(c, ..)| *c == count)
        .map(|(_, _, m, _)| m)
        .collect();
    debug!(
        "Accessor equivalence of {}: {} absorbs all but {:?}",
        graph.method_signature(target),
        signature,
        convert_to_get_set
    );
    Some(EquivalenceResolution {
        equivalent: GetSetEquivalent {
            convert_to_get_set,
            method,
        },
        tied_with,
    })
}

/// Field name an accessor refers to by naming convention.
///
/// `getX`, `setX`, `isX` and `hasX` refer to `x`; any other name is taken as
/// the field name itself, as record-style accessors do.
pub fn field_name_of_accessor(method_name: &str) -> String {
    for prefix in ["get", "set", "is", "has"] {
        if let Some(rest) = method_name.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next().filter(|c| c.is_uppercase()) {
                return first.to_lowercase().chain(chars).collect();
            }
        }
    }
    method_name.to_string()
}

/// Resolves a plain getter or setter to the field it accesses.
///
/// A setter returns nothing or returns its own type (fluent); its value is
/// taken from the last parameter. Returns the missing field name on failure.
pub fn resolve_field_reference(
    graph: &DeclarationGraph,
    method: MethodId,
    explicit_field: Option<&str>,
) -> Result<FieldValue, String> {
    let decl = graph.method(method);
    let name = explicit_field
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| field_name_of_accessor(&decl.name));
    let field = graph.field_by_name(decl.owner, &name).ok_or(name)?;
    let setter = decl.return_type.is_void() || graph.returns_owner(method);
    let parameter_index = if setter {
        decl.params.len().checked_sub(1)
    } else {
        None
    };
    Ok(FieldValue {
        field,
        setter,
        parameter_index,
    })
}

#[cfg(test)]
mod tests {
    use imdecl::decl::{Primitive, TypeRef};

    use super::*;

    #[test]
    fn accessor_names_map_to_fields() {
        assert_eq!(field_name_of_accessor("getName"), "name");
        assert_eq!(field_name_of_accessor("isEmpty"), "empty");
        assert_eq!(field_name_of_accessor("hasNext"), "next");
        assert_eq!(field_name_of_accessor("setURL"), "uRL");
        assert_eq!(field_name_of_accessor("getter"), "getter");
        assert_eq!(field_name_of_accessor("size"), "size");
    }

    #[test]
    fn setters_take_their_value_from_the_last_parameter() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "Bean");
        let field = graph.add_field(ty, "size", TypeRef::primitive(Primitive::Int));
        let set = graph.add_method(ty, "setSize", TypeRef::class("p.Bean"));
        graph.add_parameter(set, "size", TypeRef::primitive(Primitive::Int));
        let get = graph.add_method(ty, "getSize", TypeRef::primitive(Primitive::Int));
        let missing = graph.add_method(ty, "getColor", TypeRef::string());

        assert_eq!(
            resolve_field_reference(&graph, set, None),
            Ok(FieldValue {
                field,
                setter: true,
                parameter_index: Some(0)
            })
        );
        assert_eq!(
            resolve_field_reference(&graph, get, None),
            Ok(FieldValue {
                field,
                setter: false,
                parameter_index: None
            })
        );
        assert_eq!(
            resolve_field_reference(&graph, missing, None),
            Err("color".to_string())
        );
        assert!(resolve_field_reference(&graph, missing, Some("size")).is_ok());
    }

    #[test]
    fn equal_candidates_are_broken_by_signature() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "Pair");
        let target = graph.add_constructor(ty);
        graph.add_parameter(target, "b", TypeRef::string());
        graph.add_parameter(target, "a", TypeRef::string());
        let with_b = graph.add_constructor(ty);
        graph.add_parameter(with_b, "b", TypeRef::string());
        let with_a = graph.add_constructor(ty);
        graph.add_parameter(with_a, "a", TypeRef::string());

        // both candidates leave one parameter unmatched and have the same signature
        let first = resolve_equivalence(&graph, target).unwrap();
        assert_eq!(first.equivalent.method, with_b);
        assert_eq!(first.equivalent.convert_to_get_set, BTreeSet::from([1]));
        assert_eq!(first.tied_with, vec![with_a]);
        assert_eq!(resolve_equivalence(&graph, target), Some(first));
    }

    #[test]
    fn incompatible_candidates_are_skipped() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let target = graph.add_method(ty, "of", TypeRef::class("p.T"));
        graph.add_parameter(target, "x", TypeRef::primitive(Primitive::Int));
        let wrong_type = graph.add_method(ty, "of", TypeRef::class("p.T"));
        graph.add_parameter(wrong_type, "x", TypeRef::primitive(Primitive::Long));
        let same_size = graph.add_method(ty, "of", TypeRef::class("p.T"));
        graph.add_parameter(same_size, "x", TypeRef::primitive(Primitive::Int));

        assert_eq!(unmatched_parameters(&graph, wrong_type, target), None);
        assert_eq!(unmatched_parameters(&graph, same_size, target), None);
        assert_eq!(resolve_equivalence(&graph, target), None);
    }
}
