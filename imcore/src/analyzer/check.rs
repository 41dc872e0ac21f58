use imdecl::{
    AnalysisStore, Declaration, Property, TypeId,
    value::{Immutable, Independent},
};

use super::ShallowAnalyzer;
use crate::{hierarchy::least_of_hierarchy, provider::MarkerProvider};

impl<P: MarkerProvider> ShallowAnalyzer<'_, P> {
    /// Pass 3 for one type. Stored values are never changed.
    pub(super) fn check(&mut self, ty: TypeId, store: &AnalysisStore) {
        let graph = self.graph;
        let decl = Declaration::Type(ty);
        let fqn = &graph.ty(ty).fqn;

        let immutable = store.get_or(decl, Property::ImmutableType, Immutable::Mutable);
        if immutable.is_at_least_immutable_hc() {
            let least = least_of_hierarchy(
                graph,
                store,
                ty,
                Property::ImmutableType,
                Immutable::Mutable,
                Immutable::ImmutableHc,
            );
            if !least.is_at_least_immutable_hc() {
                self.diagnostics.warn_on(
                    decl,
                    fqn.clone(),
                    format!("Type is {immutable}, but a public supertype is only {least}"),
                );
            }
            for field in &graph.ty(ty).fields {
                if store.get_or(Declaration::Field(*field), Property::ModifiedField, false) {
                    self.diagnostics.warn_on(
                        Declaration::Field(*field),
                        graph.describe(Declaration::Field(*field)),
                        format!("Field is @Modified in a type that is {immutable}"),
                    );
                }
            }
            for method in &graph.ty(ty).methods {
                if store.get_or(Declaration::Method(*method), Property::ModifiedMethod, false) {
                    self.diagnostics.warn_on(
                        Declaration::Method(*method),
                        graph.describe(Declaration::Method(*method)),
                        format!("Method is @Modified in a type that is {immutable}"),
                    );
                }
            }
        }

        if store.get_or(decl, Property::ContainerType, false)
            && !least_of_hierarchy(graph, store, ty, Property::ContainerType, false, true)
        {
            self.diagnostics.warn_on(
                decl,
                fqn.clone(),
                "Type is a container, but a public supertype is not",
            );
        }

        let independent = store.get_or(decl, Property::IndependentType, Independent::DEPENDENT);
        if independent.is_at_least_independent_hc() {
            let least = least_of_hierarchy(
                graph,
                store,
                ty,
                Property::IndependentType,
                Independent::DEPENDENT,
                Independent::INDEPENDENT,
            );
            if least.level() < independent.level() {
                self.diagnostics.warn_on(
                    decl,
                    fqn.clone(),
                    format!("Type is {independent}, but a public supertype is only {least}"),
                );
            }
        }

        if (immutable.is_immutable() && !independent.is_independent())
            || (immutable.is_at_least_immutable_hc() && !independent.is_at_least_independent_hc())
        {
            self.diagnostics.warn_on(
                decl,
                fqn.clone(),
                format!("Type is {immutable}, which requires more independence than {independent}"),
            );
        }
    }
}
