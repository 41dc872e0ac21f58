use enum_map::EnumMap;
use imdecl::{
    AnalysisStore, Declaration, FieldId, Marker, MarkerKind, MethodId, ParamRef, Property, TypeId,
    decl::{Modifiers, TypeNature},
    value::{Immutable, Independent, Lattice, NotNull, TypedValue},
};
use log::debug;

use super::{
    ShallowAnalyzer,
    formal::{is_functional_interface, type_container, type_immutable},
};
use crate::{hierarchy, provider::MarkerProvider, utils::error::ShResult};

/// Modification defaults of the unmarked methods and parameters of one type.
#[derive(Debug, Clone, Copy, Default)]
struct ModificationDefaults {
    method: bool,
    parameter: bool,
}

impl<P: MarkerProvider> ShallowAnalyzer<'_, P> {
    /// Pass 2 for one type: fields, then constructors and methods.
    pub(super) fn analyze_members(
        &mut self,
        ty: TypeId,
        store: &mut AnalysisStore,
    ) -> ShResult<()> {
        let graph = self.graph;
        for field in &graph.ty(ty).fields {
            self.analyze_field(*field, store)?;
        }
        let defaults = self.modification_defaults(ty, store);
        let members: Vec<MethodId> = graph
            .constructors_and_methods(ty)
            .filter(|m| graph.is_method_publicly_accessible(*m))
            .collect();
        for method in members {
            self.analyze_method(method, defaults, store)?;
        }
        Ok(())
    }

    fn modification_defaults(&mut self, ty: TypeId, store: &AnalysisStore) -> ModificationDefaults {
        let mut on_methods: EnumMap<MarkerKind, usize> = EnumMap::default();
        let mut on_parameters: EnumMap<MarkerKind, usize> = EnumMap::default();
        for method in self.graph.constructors_and_methods(ty) {
            if !self.graph.is_method_publicly_accessible(method) {
                continue;
            }
            count_modification(
                self.provider.markers(self.graph, method.into()),
                &mut on_methods,
            );
            for param in self.graph.params(method) {
                count_modification(
                    self.provider.markers(self.graph, param.into()),
                    &mut on_parameters,
                );
            }
        }

        let fqn = &self.graph.ty(ty).fqn;
        if on_methods[MarkerKind::Modified] > 0 && on_methods[MarkerKind::NotModified] > 0 {
            self.diagnostics.warn_on(
                ty.into(),
                fqn.clone(),
                "Mixing @NotModified and @Modified methods; unmarked methods default to @Modified",
            );
        }
        if on_parameters[MarkerKind::Modified] > 0 && on_parameters[MarkerKind::NotModified] > 0 {
            self.diagnostics.warn_on(
                ty.into(),
                fqn.clone(),
                "Mixing @NotModified and @Modified parameters; unmarked parameters default to @Modified",
            );
        }
        let mutable = store
            .get_or(ty.into(), Property::ImmutableType, Immutable::Mutable)
            .is_mutable();
        ModificationDefaults {
            method: mutable && on_methods[MarkerKind::NotModified] > 0,
            parameter: on_parameters[MarkerKind::NotModified] > 0,
        }
    }

    fn analyze_field(&mut self, field: FieldId, store: &mut AnalysisStore) -> ShResult<()> {
        let decl = Declaration::Field(field);
        if store.is_done(decl) {
            return Ok(());
        }
        let mut compiled = self.compile(decl, store);
        let graph = self.graph;
        let f = graph.field(field);
        let enum_constant = graph.ty(f.owner).nature == TypeNature::Enum
            && f.modifiers.contains(Modifiers::SYNTHETIC);

        let formal = type_immutable(graph, store, &f.ty).unwrap_or(Immutable::Mutable);
        let immutable = match compiled
            .remove(&Property::ImmutableField)
            .and_then(|v| v.try_as_immutable())
        {
            Some(explicit) => formal.join(&explicit),
            None => formal,
        };
        self.store_compiled(decl, compiled, store)?;
        store.set_if_absent(decl, Property::ImmutableField, immutable.into())?;
        store.set_if_absent(
            decl,
            Property::FinalField,
            (f.modifiers.contains(Modifiers::FINAL) || enum_constant).into(),
        )?;
        let not_null = if enum_constant || f.ty.is_primitive_excluding_void() {
            NotNull::NotNull
        } else {
            NotNull::Nullable
        };
        store.set_if_absent(decl, Property::NotNullField, not_null.into())?;
        store.set_if_absent(
            decl,
            Property::ContainerField,
            type_container(graph, store, &f.ty).into(),
        )?;
        let independent = self.owner_independence(f.owner, store);
        store.set_if_absent(decl, Property::IndependentField, independent.into())?;
        store.mark_done(decl);
        Ok(())
    }

    /// Structural sharing default of a member of `owner`.
    fn owner_independence(&self, owner: TypeId, store: &AnalysisStore) -> Independent {
        let immutable = store
            .get_typed::<Immutable>(owner.into(), Property::ImmutableType)
            .copied();
        hierarchy::structural_independence(self.graph, store, owner, immutable)
    }

    fn analyze_method(
        &mut self,
        method: MethodId,
        defaults: ModificationDefaults,
        store: &mut AnalysisStore,
    ) -> ShResult<()> {
        let decl = Declaration::Method(method);
        if store.is_done(decl) {
            return Ok(());
        }
        let compiled = self.compile(decl, store);
        self.store_compiled(decl, compiled, store)?;

        let graph = self.graph;
        let m = graph.method(method);
        let overrides: Vec<MethodId> = graph
            .overrides(method)
            .into_iter()
            .filter(|o| graph.is_method_publicly_accessible(*o))
            .collect();
        if !overrides.is_empty() {
            debug!(
                "{} overrides {} public methods",
                graph.describe(decl),
                overrides.len()
            );
        }
        let any_override = |property: Property, store: &AnalysisStore| {
            overrides
                .iter()
                .any(|o| store.get_or(Declaration::Method(*o), property, false))
        };

        if m.kind.is_constructor() {
            store.set_if_absent(decl, Property::FluentMethod, false.into())?;
            store.set_if_absent(decl, Property::IdentityMethod, false.into())?;
            store.set_if_absent(decl, Property::ModifiedMethod, true.into())?;
            store.set_if_absent(decl, Property::StaticSideEffects, false.into())?;
            store.set_if_absent(decl, Property::AllowsInterrupts, false.into())?;
        } else {
            let fluent =
                graph.returns_owner(method) && any_override(Property::FluentMethod, store);
            store.set_if_absent(decl, Property::FluentMethod, fluent.into())?;
            let identity = !m.params.is_empty() && any_override(Property::IdentityMethod, store);
            store.set_if_absent(decl, Property::IdentityMethod, identity.into())?;
            let side_effects = any_override(Property::StaticSideEffects, store);
            store.set_if_absent(decl, Property::StaticSideEffects, side_effects.into())?;
            let interrupts = any_override(Property::AllowsInterrupts, store);
            store.set_if_absent(decl, Property::AllowsInterrupts, interrupts.into())?;

            if !store.contains(decl, Property::ModifiedMethod) {
                let modified = if store.get_or(decl, Property::StaticSideEffects, false) {
                    false
                } else if store.get_or(decl, Property::FluentMethod, false)
                    || (m.return_type.is_void() && !graph.is_static(method))
                {
                    true
                } else {
                    let stated: Vec<bool> = overrides
                        .iter()
                        .filter_map(|o| {
                            store
                                .get_typed::<bool>(Declaration::Method(*o), Property::ModifiedMethod)
                                .copied()
                        })
                        .collect();
                    if stated.is_empty() {
                        defaults.method
                    } else {
                        stated.into_iter().any(|b| b)
                    }
                };
                store.set(decl, Property::ModifiedMethod, modified.into())?;
            }
        }

        for param in graph.params(method) {
            self.analyze_parameter(param, &overrides, defaults, store)?;
        }

        let independent = self.owner_independence(m.owner, store);
        store.set_if_absent(decl, Property::IndependentMethod, independent.into())?;
        if !m.kind.is_constructor() {
            self.method_result_defaults(method, &overrides, store)?;
        }
        store.mark_done(decl);
        Ok(())
    }

    /// Containment, immutability and nullability of what a method returns.
    fn method_result_defaults(
        &self,
        method: MethodId,
        overrides: &[MethodId],
        store: &mut AnalysisStore,
    ) -> ShResult<()> {
        let decl = Declaration::Method(method);
        let m = self.graph.method(method);
        let ret = &m.return_type;

        let container = if ret.arrays > 0 || ret.is_void() || ret.is_primitive_excluding_void() {
            true
        } else if ret.is_type_parameter() {
            false
        } else if store.get_or(decl, Property::IdentityMethod, false) && !m.params.is_empty() {
            store.get_or(
                ParamRef { method, index: 0 }.into(),
                Property::ContainerParameter,
                false,
            )
        } else {
            type_container(self.graph, store, ret)
                || overrides
                    .iter()
                    .any(|o| store.get_or((*o).into(), Property::ContainerMethod, false))
        };
        store.set_if_absent(decl, Property::ContainerMethod, container.into())?;

        if let Some(immutable) = type_immutable(self.graph, store, ret) {
            store.set_if_absent(decl, Property::ImmutableMethod, immutable.into())?;
        }

        if !ret.is_void() {
            let not_null = if ret.is_primitive_excluding_void()
                || store.get_or(decl, Property::FluentMethod, false)
            {
                NotNull::NotNull
            } else {
                best_of(overrides.iter().map(|o| {
                    store.get_or((*o).into(), Property::NotNullMethod, NotNull::Nullable)
                }))
            };
            store.set_if_absent(decl, Property::NotNullMethod, not_null.into())?;
        }
        Ok(())
    }

    fn analyze_parameter(
        &mut self,
        param: ParamRef,
        overrides: &[MethodId],
        defaults: ModificationDefaults,
        store: &mut AnalysisStore,
    ) -> ShResult<()> {
        let decl = Declaration::Parameter(param);
        if store.is_done(decl) {
            return Ok(());
        }
        let compiled = self.compile(decl, store);
        self.store_compiled(decl, compiled, store)?;

        let graph = self.graph;
        let ty = &graph.param(param).ty;
        let owner = graph.method(param.method).owner;
        // the same position in every overridden method
        let overridden: Vec<Declaration> = overrides
            .iter()
            .map(|o| {
                Declaration::Parameter(ParamRef {
                    method: *o,
                    index: param.index,
                })
            })
            .collect();

        let immutable = type_immutable(graph, store, ty).unwrap_or(Immutable::Mutable);
        store.set_if_absent(decl, Property::ImmutableParameter, immutable.into())?;

        if !store.contains(decl, Property::IndependentParameter) {
            let modifying = store.get_or(param.method.into(), Property::ModifiedMethod, false)
                || graph.is_factory_method(param.method);
            let base = if ty.is_primitive_excluding_void() || immutable.is_immutable() {
                Independent::INDEPENDENT
            } else if modifying {
                let of_owner = store.get_or(
                    owner.into(),
                    Property::IndependentType,
                    Independent::DEPENDENT,
                );
                of_owner.join(&immutable.to_corresponding_independent())
            } else {
                Independent::INDEPENDENT
            };
            let independent = overridden.iter().fold(base, |acc, o| {
                match store.get_typed::<Independent>(*o, Property::IndependentParameter) {
                    Some(value) => acc.join(value),
                    None => acc,
                }
            });
            store.set(decl, Property::IndependentParameter, independent.into())?;
        }

        if !store.contains(decl, Property::ModifiedParameter) {
            let modified = if store.get_or(owner.into(), Property::ContainerType, false)
                || ty.is_primitive_string_class()
                || immutable.is_at_least_immutable_hc()
            {
                false
            } else {
                let stated: Vec<bool> = overridden
                    .iter()
                    .filter_map(|o| store.get_typed::<bool>(*o, Property::ModifiedParameter).copied())
                    .collect();
                if stated.is_empty() {
                    defaults.parameter
                } else {
                    stated.into_iter().any(|b| b)
                }
            };
            store.set(decl, Property::ModifiedParameter, modified.into())?;
        }

        let not_null = if ty.is_primitive_excluding_void() {
            NotNull::NotNull
        } else {
            best_of(
                overridden
                    .iter()
                    .map(|o| store.get_or(*o, Property::NotNullParameter, NotNull::Nullable)),
            )
        };
        store.set_if_absent(decl, Property::NotNullParameter, not_null.into())?;
        store.set_if_absent(
            decl,
            Property::IgnoreModificationsParameter,
            is_functional_interface(ty).into(),
        )?;
        store.set_if_absent(
            decl,
            Property::ContainerParameter,
            type_container(graph, store, ty).into(),
        )?;
        store.mark_done(decl);
        Ok(())
    }
}

fn count_modification(markers: &[Marker], counts: &mut EnumMap<MarkerKind, usize>) {
    for marker in markers {
        if !marker.is_absent()
            && matches!(marker.kind(), MarkerKind::Modified | MarkerKind::NotModified)
        {
            counts[marker.kind()] += 1;
        }
    }
}

/// The highest of `values`, or the bottom of the lattice when there are none.
fn best_of<T: TypedValue + Lattice>(values: impl Iterator<Item = T>) -> T {
    values.fold(T::bottom(), |acc, v| acc.join(&v))
}
