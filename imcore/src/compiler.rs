//! Marker compiler: turns the property markers of one declaration into a property map.
//!
//! Markers are processed in order. Within a mutually exclusive group (for
//! example the markers deciding immutability) the first marker wins; markers
//! of other groups layer on top. The resulting map only holds keys legal for
//! the declaration's kind. A malformed marker fails the whole declaration with
//! an [`imdecl::utils::Error`], so the caller can fall back to defaults.

use std::collections::BTreeMap;

use imdecl::{
    AnalysisStore, Declaration, DeclarationGraph, Marker, MarkerKind, Property,
    utils::{Error, ModelResult},
    value::{
        CommutableData, FieldValue, GetSetEquivalent, Immutable, Independent, NotNull, Value,
        VariableBooleanMap,
    },
};
use log::debug;

use crate::{diagnostics::Diagnostics, getset, hierarchy};

/// Property values produced for one declaration.
pub type CompiledMap = BTreeMap<Property, Value>;

/// Values gathered from the markers, before they are keyed by declaration kind.
#[derive(Debug, Default)]
struct Collected {
    immutable: Option<Immutable>,
    independent: Option<Independent>,
    not_null: Option<NotNull>,
    container: Option<bool>,
    fluent: Option<bool>,
    identity: Option<bool>,
    modified: Option<bool>,
    ignore_modifications: Option<bool>,
    is_final: Option<bool>,
    get_set_field: Option<FieldValue>,
    get_set_equivalent: Option<GetSetEquivalent>,
    allows_interrupt: Option<bool>,
    static_side_effects: Option<bool>,
    commutable: Option<CommutableData>,
    modified_components: Option<VariableBooleanMap>,
}

fn first<T>(slot: &mut Option<T>, value: T) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

pub struct MarkerCompiler<'a> {
    graph: &'a DeclarationGraph,
    store: &'a AnalysisStore,
}

impl<'a> MarkerCompiler<'a> {
    pub fn new(graph: &'a DeclarationGraph, store: &'a AnalysisStore) -> Self {
        MarkerCompiler { graph, store }
    }

    pub fn compile(
        &self,
        decl: Declaration,
        markers: &[Marker],
        diagnostics: &mut Diagnostics,
    ) -> ModelResult<CompiledMap> {
        let mut c = Collected::default();
        for marker in markers {
            marker.validate()?;
            self.apply(decl, marker, &mut c, diagnostics)?;
        }

        if let Declaration::Type(ty) = decl {
            if c.independent.is_none() {
                c.independent = Some(hierarchy::structural_independence(
                    self.graph,
                    self.store,
                    ty,
                    c.immutable,
                ));
            }
        }
        self.key_by_kind(decl, c)
    }

    fn apply(
        &self,
        decl: Declaration,
        marker: &Marker,
        c: &mut Collected,
        diagnostics: &mut Diagnostics,
    ) -> ModelResult<()> {
        let absent = marker.is_absent();
        match marker.kind() {
            MarkerKind::Immutable => first(&mut c.immutable, deep_immutable(marker)?),
            MarkerKind::ImmutableContainer => {
                first(&mut c.immutable, deep_immutable(marker)?);
                first(&mut c.container, !absent);
            }
            MarkerKind::FinalFields => first(
                &mut c.immutable,
                if absent {
                    Immutable::Mutable
                } else {
                    Immutable::FinalFields
                },
            ),
            MarkerKind::Container => first(&mut c.container, !absent),
            MarkerKind::Independent => first(&mut c.independent, independent(marker)?),
            MarkerKind::NotModified => first(&mut c.modified, absent),
            MarkerKind::Modified => {
                first(&mut c.modified, !absent);
                if let Some(name) = marker.str_attr("value")?.filter(|n| !n.trim().is_empty()) {
                    let owner = self.graph.owning_type(decl);
                    match self.graph.field_by_name(owner, name) {
                        Some(field) => first(
                            &mut c.modified_components,
                            VariableBooleanMap::single(field, true),
                        ),
                        None => diagnostics.warn_on(
                            decl,
                            self.graph.describe(decl),
                            format!(
                                "Cannot find field {name} in {}",
                                self.graph.ty(owner).fqn
                            ),
                        ),
                    }
                }
            }
            MarkerKind::Identity => first(&mut c.identity, !absent),
            MarkerKind::Fluent => first(&mut c.fluent, !absent),
            MarkerKind::NotNull => {
                let value = if absent {
                    NotNull::Nullable
                } else if marker.bool_attr("content")? {
                    NotNull::ContentNotNull
                } else {
                    NotNull::NotNull
                };
                first(&mut c.not_null, value);
            }
            MarkerKind::Final => first(&mut c.is_final, !absent),
            MarkerKind::IgnoreModifications => first(&mut c.ignore_modifications, !absent),
            MarkerKind::GetSet => self.apply_get_set(decl, marker, c, diagnostics)?,
            MarkerKind::Commutable => {
                if matches!(decl, Declaration::Method(_)) {
                    let value = CommutableData::new(
                        marker.str_attr("seq")?.unwrap_or_default(),
                        marker.str_attr("par")?.unwrap_or_default(),
                        marker.str_attr("multi")?.unwrap_or_default(),
                    );
                    first(&mut c.commutable, value);
                } else {
                    debug!("Ignoring {marker} on {}", self.graph.describe(decl));
                }
            }
            // overrides any immutability or independence marker
            MarkerKind::UtilityClass => {
                c.immutable = Some(Immutable::Immutable);
                c.independent = Some(Independent::INDEPENDENT);
            }
            MarkerKind::AllowsInterrupt => first(&mut c.allows_interrupt, !absent),
            MarkerKind::StaticSideEffects => first(&mut c.static_side_effects, !absent),
        }
        Ok(())
    }

    fn apply_get_set(
        &self,
        decl: Declaration,
        marker: &Marker,
        c: &mut Collected,
        diagnostics: &mut Diagnostics,
    ) -> ModelResult<()> {
        let Declaration::Method(method) = decl else {
            debug!("Ignoring {marker} on {}", self.graph.describe(decl));
            return Ok(());
        };
        let equivalent = marker.bool_attr("equivalent")?;
        if self.graph.is_constructor(method) || self.graph.is_factory_method(method) || equivalent
        {
            match getset::resolve_equivalence(self.graph, method) {
                Some(resolution) => {
                    if !resolution.tied_with.is_empty() {
                        let tied: Vec<String> = resolution
                            .tied_with
                            .iter()
                            .map(|m| self.graph.method_signature(*m))
                            .collect();
                        diagnostics.warn_on(
                            decl,
                            self.graph.describe(decl),
                            format!(
                                "Ambiguous accessor equivalence, selected {} over {}",
                                self.graph.method_signature(resolution.equivalent.method),
                                tied.join(", ")
                            ),
                        );
                    }
                    first(&mut c.get_set_equivalent, resolution.equivalent);
                }
                None => debug!(
                    "No accessor equivalent for {}",
                    self.graph.describe(decl)
                ),
            }
        } else {
            match getset::resolve_field_reference(self.graph, method, marker.str_attr("value")?) {
                Ok(value) => first(&mut c.get_set_field, value),
                Err(name) => diagnostics.warn_on(
                    decl,
                    self.graph.describe(decl),
                    format!(
                        "Cannot find field {name} in {}",
                        self.graph.ty(self.graph.method(method).owner).fqn
                    ),
                ),
            }
        }
        Ok(())
    }

    fn key_by_kind(&self, decl: Declaration, c: Collected) -> ModelResult<CompiledMap> {
        let mut map = CompiledMap::new();
        let mut put = |property: Property, value: Option<Value>| {
            if let Some(value) = value {
                map.insert(property, value);
            }
        };
        if !matches!(decl, Declaration::Parameter(_)) {
            if let Some(independent) = c.independent.as_ref().filter(|i| i.has_links()) {
                return Err(Error::MalformedValue {
                    reason: format!(
                        "per-position independence {independent} is only allowed on parameters, found on {}",
                        self.graph.describe(decl)
                    ),
                });
            }
        }
        match decl {
            Declaration::Type(_) => {
                put(Property::ImmutableType, c.immutable.map(Into::into));
                put(Property::IndependentType, c.independent.map(Into::into));
                put(Property::ContainerType, c.container.map(Into::into));
            }
            Declaration::Method(_) => {
                put(Property::FluentMethod, c.fluent.map(Into::into));
                put(Property::IdentityMethod, c.identity.map(Into::into));
                put(Property::GetSetField, c.get_set_field.map(Into::into));
                put(Property::ImmutableMethod, c.immutable.map(Into::into));
                put(Property::IndependentMethod, c.independent.map(Into::into));
                put(Property::ContainerMethod, c.container.map(Into::into));
                put(Property::NotNullMethod, c.not_null.map(Into::into));
                put(Property::ModifiedMethod, c.modified.map(Into::into));
                put(Property::AllowsInterrupts, c.allows_interrupt.map(Into::into));
                put(Property::StaticSideEffects, c.static_side_effects.map(Into::into));
                put(
                    Property::GetSetEquivalent,
                    c.get_set_equivalent.map(Into::into),
                );
                put(Property::CommutableMethods, c.commutable.map(Into::into));
                put(
                    Property::ModifiedComponentsMethod,
                    c.modified_components.map(Into::into),
                );
            }
            Declaration::Field(_) => {
                put(Property::ImmutableField, c.immutable.map(Into::into));
                put(Property::IndependentField, c.independent.map(Into::into));
                put(Property::ContainerField, c.container.map(Into::into));
                put(Property::NotNullField, c.not_null.map(Into::into));
                put(Property::ModifiedField, c.modified.map(Into::into));
                put(Property::FinalField, c.is_final.map(Into::into));
                put(
                    Property::IgnoreModificationsField,
                    c.ignore_modifications.map(Into::into),
                );
            }
            Declaration::Parameter(_) => {
                put(Property::ImmutableParameter, c.immutable.map(Into::into));
                put(Property::IndependentParameter, c.independent.map(Into::into));
                put(Property::ContainerParameter, c.container.map(Into::into));
                put(Property::NotNullParameter, c.not_null.map(Into::into));
                put(Property::ModifiedParameter, c.modified.map(Into::into));
                put(
                    Property::IgnoreModificationsParameter,
                    c.ignore_modifications.map(Into::into),
                );
                put(
                    Property::ModifiedComponentsParameter,
                    c.modified_components.map(Into::into),
                );
            }
        }
        Ok(map)
    }
}

fn deep_immutable(marker: &Marker) -> ModelResult<Immutable> {
    Ok(if marker.is_absent() {
        Immutable::Mutable
    } else if marker.bool_attr("hc")? {
        Immutable::ImmutableHc
    } else {
        Immutable::Immutable
    })
}

fn independent(marker: &Marker) -> ModelResult<Independent> {
    if marker.is_absent() {
        return Ok(Independent::DEPENDENT);
    }
    let hc = marker.bool_attr("hc")?;
    let links = Independent::link_map(
        &marker.int_array_attr("dependentParameters")?,
        &marker.int_array_attr("hcParameters")?,
        marker.bool_attr("dependentReturnValue")?,
        marker.bool_attr("hcReturnValue")?,
    )?;
    if links.is_empty() {
        Ok(if hc {
            Independent::INDEPENDENT_HC
        } else {
            Independent::INDEPENDENT
        })
    } else {
        Independent::with_links(u8::from(hc), links)
    }
}

#[cfg(test)]
mod tests {
    use imdecl::decl::{Modifiers, Primitive, TypeRef};

    use super::*;

    fn compile(graph: &DeclarationGraph, decl: Declaration, markers: &[Marker]) -> CompiledMap {
        let store = AnalysisStore::new();
        let mut diagnostics = Diagnostics::new();
        MarkerCompiler::new(graph, &store)
            .compile(decl, markers, &mut diagnostics)
            .unwrap()
    }

    #[test]
    fn first_marker_of_a_group_wins() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let map = compile(
            &graph,
            ty.into(),
            &[
                Marker::new(MarkerKind::FinalFields),
                Marker::new(MarkerKind::Immutable),
                Marker::new(MarkerKind::Container),
            ],
        );
        assert_eq!(
            map[&Property::ImmutableType],
            Value::Immutable(Immutable::FinalFields)
        );
        assert_eq!(map[&Property::ContainerType], Value::Bool(true));
    }

    #[test]
    fn utility_class_forces_immutable_and_independent() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "Util");
        let map = compile(
            &graph,
            ty.into(),
            &[
                Marker::new(MarkerKind::FinalFields),
                Marker::new(MarkerKind::Independent).with("hc", true),
                Marker::new(MarkerKind::UtilityClass),
                Marker::new(MarkerKind::Immutable).with("hc", true),
            ],
        );
        assert_eq!(
            map[&Property::ImmutableType],
            Value::Immutable(Immutable::Immutable)
        );
        assert_eq!(
            map[&Property::IndependentType],
            Value::Independent(Independent::INDEPENDENT)
        );
    }

    #[test]
    fn commutable_only_applies_to_methods() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "Counter");
        let m = graph.add_method(ty, "increment", TypeRef::void());
        let marker = Marker::new(MarkerKind::Commutable).with("seq", "increment");
        let on_type = compile(&graph, ty.into(), &[marker.clone()]);
        assert!(!on_type.contains_key(&Property::CommutableMethods));
        let on_method = compile(&graph, m.into(), &[marker]);
        assert_eq!(
            on_method[&Property::CommutableMethods],
            Value::Commutable(CommutableData::new("increment", "", ""))
        );
    }

    #[test]
    fn immutable_container_sets_both_groups() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let map = compile(
            &graph,
            ty.into(),
            &[Marker::new(MarkerKind::ImmutableContainer).with("hc", true)],
        );
        assert_eq!(
            map[&Property::ImmutableType],
            Value::Immutable(Immutable::ImmutableHc)
        );
        assert_eq!(map[&Property::ContainerType], Value::Bool(true));
        assert_eq!(
            map[&Property::IndependentType],
            Value::Independent(Independent::INDEPENDENT_HC)
        );
        let absent = compile(
            &graph,
            ty.into(),
            &[Marker::new(MarkerKind::ImmutableContainer).absent()],
        );
        assert_eq!(
            absent[&Property::ImmutableType],
            Value::Immutable(Immutable::Mutable)
        );
        assert_eq!(absent[&Property::ContainerType], Value::Bool(false));
    }

    #[test]
    fn parameters_keep_per_position_independence() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let m = graph.add_method(ty, "add", TypeRef::void());
        let p = graph.add_parameter(m, "x", TypeRef::type_parameter("E"));
        let marker = Marker::new(MarkerKind::Independent)
            .with("hc", true)
            .with("hcParameters", [1i64])
            .with("dependentReturnValue", true);
        let map = compile(&graph, p.into(), &[marker.clone()]);
        let Value::Independent(value) = &map[&Property::IndependentParameter] else {
            panic!("expected an independence value");
        };
        assert!(value.has_links());

        let store = AnalysisStore::new();
        let err = MarkerCompiler::new(&graph, &store)
            .compile(m.into(), &[marker], &mut Diagnostics::new())
            .unwrap_err();
        assert!(err.is_malformed_value());
    }

    #[test]
    fn keys_are_restricted_to_the_declaration_kind() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let f = graph.add_field(ty, "count", TypeRef::primitive(Primitive::Int));
        let map = compile(
            &graph,
            f.into(),
            &[
                Marker::new(MarkerKind::Final),
                Marker::new(MarkerKind::Fluent),
                Marker::new(MarkerKind::NotNull).with("content", true),
            ],
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map[&Property::FinalField], Value::Bool(true));
        assert_eq!(
            map[&Property::NotNullField],
            Value::NotNull(NotNull::ContentNotNull)
        );
    }

    #[test]
    fn modified_names_the_field_it_modifies() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let items = graph.add_field(ty, "items", TypeRef::class("java.util.List"));
        let m = graph.add_method(ty, "clear", TypeRef::void());
        let store = AnalysisStore::new();
        let mut diagnostics = Diagnostics::new();
        let compiler = MarkerCompiler::new(&graph, &store);
        let map = compiler
            .compile(
                m.into(),
                &[Marker::new(MarkerKind::Modified).with("value", "items")],
                &mut diagnostics,
            )
            .unwrap();
        assert_eq!(map[&Property::ModifiedMethod], Value::Bool(true));
        assert_eq!(
            map[&Property::ModifiedComponentsMethod],
            Value::VariableBooleanMap(VariableBooleanMap::single(items, true))
        );

        compiler
            .compile(
                m.into(),
                &[Marker::new(MarkerKind::Modified).with("value", "nothing")],
                &mut diagnostics,
            )
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn factory_get_set_resolves_equivalence() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "Range");
        let of2 = graph.add_method(ty, "of", TypeRef::class("p.Range"));
        graph.add_parameter(of2, "from", TypeRef::primitive(Primitive::Int));
        graph.add_parameter(of2, "to", TypeRef::primitive(Primitive::Int));
        let of1 = graph.add_method(ty, "of", TypeRef::class("p.Range"));
        graph.add_parameter(of1, "to", TypeRef::primitive(Primitive::Int));
        for m in [of1, of2] {
            graph.method_mut(m).modifiers = Modifiers::STATIC;
        }
        let map = compile(&graph, of2.into(), &[Marker::new(MarkerKind::GetSet)]);
        assert_eq!(
            map[&Property::GetSetEquivalent],
            Value::GetSetEquivalent(GetSetEquivalent {
                convert_to_get_set: [0].into(),
                method: of1,
            })
        );
    }

    #[test]
    fn unknown_attribute_fails_the_declaration() {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("p", "T");
        let store = AnalysisStore::new();
        let err = MarkerCompiler::new(&graph, &store)
            .compile(
                ty.into(),
                &[Marker::new(MarkerKind::Container).with("deep", true)],
                &mut Diagnostics::new(),
            )
            .unwrap_err();
        assert!(err.is_malformed_marker());
    }
}
