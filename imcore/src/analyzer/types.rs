use imdecl::{
    AnalysisStore, Declaration, MarkerKind, Property, TypeId,
    value::{Immutable, Independent},
};
use log::debug;

use super::ShallowAnalyzer;
use crate::{hierarchy, provider::MarkerProvider, utils::error::ShResult};

impl<P: MarkerProvider> ShallowAnalyzer<'_, P> {
    /// Pass 1 for one type.
    pub(super) fn analyze_type(&mut self, ty: TypeId, store: &mut AnalysisStore) -> ShResult<()> {
        let decl = Declaration::Type(ty);
        if store.is_done(decl) {
            debug!("{} already analyzed", self.graph.ty(ty).fqn);
            return Ok(());
        }
        let mut compiled = self.compile(decl, store);
        let utility_class = self
            .provider
            .markers(self.graph, decl)
            .iter()
            .any(|m| m.kind() == MarkerKind::UtilityClass && !m.is_absent());

        let explicit = compiled
            .remove(&Property::ImmutableType)
            .and_then(|v| v.try_as_immutable());
        let mut immutable = explicit.unwrap_or(Immutable::Mutable);
        if immutable.is_immutable() && !utility_class && self.graph.is_extensible(ty) {
            debug!(
                "{} is extensible, storing {} instead of {}",
                self.graph.ty(ty).fqn,
                Immutable::ImmutableHc,
                immutable
            );
            immutable = Immutable::ImmutableHc;
        }
        store.set_if_absent(decl, Property::ImmutableType, immutable.into())?;

        // a malformed marker leaves the compiled map empty
        if !compiled.contains_key(&Property::IndependentType) {
            let independent: Independent =
                hierarchy::structural_independence(self.graph, store, ty, Some(immutable));
            compiled.insert(Property::IndependentType, independent.into());
        }
        self.store_compiled(decl, compiled, store)?;
        store.mark_done(decl);
        Ok(())
    }
}
