//! Moves property markers from stand-in declarations onto real ones.
//!
//! The stand-in source is a separate [`DeclarationGraph`]. Each of its
//! top-level types is a namespace: it carries a string constant field
//! [`PACKAGE_SENTINEL`] naming a package of the target graph, and its nested
//! types named `Real$` stand in for the target type `package.Real`. Members of
//! a stand-in are matched against the members of the real type:
//!
//! * nested types by simple name (a trailing `$` is ignored),
//! * methods by name (a trailing `$` is ignored), parameter count and
//!   parameter-type compatibility,
//! * constructors by parameter count and parameter-type compatibility,
//! * fields by name,
//! * parameters by position, once their method matched.
//!
//! A declaration whose leading comment starts with `?` is unconfirmed: its own
//! markers stay behind but its children are still transferred.

use std::collections::BTreeSet;

use imdecl::{Declaration, DeclarationGraph, MethodId, ParamRef, TypeId};
use log::{debug, info};

use crate::{diagnostics::Diagnostics, provider::MarkerMap};

/// Name of the string constant field naming the target package of a namespace type.
pub const PACKAGE_SENTINEL: &str = "PACKAGE_NAME";

/// Suffix of stand-in type names, and of method names that would otherwise clash.
pub const STAND_IN_SUFFIX: char = '$';

/// Leading comment prefix of an unconfirmed declaration.
pub const UNCONFIRMED_PREFIX: char = '?';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferCounters {
    pub types: usize,
    pub constructors: usize,
    pub methods: usize,
    pub fields: usize,
    pub parameters: usize,
    /// Matched declarations whose markers were held back.
    pub unconfirmed: usize,
    /// Stand-in declarations without a counterpart.
    pub unmatched: usize,
}

#[derive(Debug, Default)]
pub struct TransferResult {
    /// Real types matched at namespace level, in stand-in order.
    pub types: Vec<TypeId>,
    /// Transferred markers, keyed by real declaration.
    pub markers: MarkerMap,
    pub counters: TransferCounters,
    pub diagnostics: Diagnostics,
}

pub struct TransferMatcher<'a> {
    source: &'a DeclarationGraph,
    target: &'a DeclarationGraph,
    packages: BTreeSet<String>,
}

impl<'a> TransferMatcher<'a> {
    pub fn new(source: &'a DeclarationGraph, target: &'a DeclarationGraph) -> Self {
        TransferMatcher {
            source,
            target,
            packages: BTreeSet::new(),
        }
    }

    /// Restricts the transfer to these target packages; empty means all.
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Runs over every top-level type of the stand-in source.
    pub fn transfer(&self) -> TransferResult {
        let mut result = TransferResult::default();
        for namespace in self.source.primary_types() {
            self.transfer_namespace(namespace, &mut result);
        }
        info!(
            "Transferred markers onto {} declarations of {} types ({} stand-ins unmatched)",
            result.markers.len(),
            result.counters.types,
            result.counters.unmatched
        );
        result
    }

    /// The target package named by the sentinel field of a namespace type.
    pub fn package_of(&self, namespace: TypeId) -> Option<&'a str> {
        let source = self.source;
        source
            .field_by_name(namespace, PACKAGE_SENTINEL)
            .and_then(|f| source.field(f).constant.as_deref())
    }

    fn transfer_namespace(&self, namespace: TypeId, result: &mut TransferResult) {
        let fqn = &self.source.ty(namespace).fqn;
        let Some(package) = self.package_of(namespace) else {
            result.diagnostics.warn(
                fqn.clone(),
                format!("Ignoring type without a string constant {PACKAGE_SENTINEL} field"),
            );
            return;
        };
        if !self.packages.is_empty() && !self.packages.contains(package) {
            debug!("Skipping {fqn}, package {package} is not selected");
            return;
        }
        debug!("Transferring {fqn} onto package {package}");

        for stand_in in &self.source.ty(namespace).subtypes {
            let decl = self.source.ty(*stand_in);
            let Some(simple) = decl.simple_name.strip_suffix(STAND_IN_SUFFIX) else {
                result.diagnostics.warn(
                    decl.fqn.clone(),
                    format!("Ignoring nested type not ending in {STAND_IN_SUFFIX}"),
                );
                continue;
            };
            let target_fqn = format!("{package}.{simple}");
            match self.target.type_by_fqn(&target_fqn) {
                Some(target) => {
                    result.types.push(target);
                    self.transfer_type(*stand_in, target, result);
                }
                None if self.source.is_type_publicly_accessible(*stand_in) => {
                    result.counters.unmatched += 1;
                    result
                        .diagnostics
                        .warn(decl.fqn.clone(), format!("Cannot load {target_fqn}"));
                }
                None => debug!("No target {target_fqn} for non-public {}", decl.fqn),
            }
        }
    }

    fn transfer_type(&self, stand_in: TypeId, target: TypeId, result: &mut TransferResult) {
        let source = self.source;
        let real = self.target;
        result.counters.types += 1;
        self.copy_markers(stand_in.into(), target.into(), result);

        for sub in &source.ty(stand_in).subtypes {
            let name = strip_suffix(&source.ty(*sub).simple_name);
            match real.find_subtype(target, name) {
                Some(real_sub) => self.transfer_type(*sub, real_sub, result),
                None => self.unmatched(Declaration::Type(*sub), real.ty(target).fqn.as_str(), result),
            }
        }
        for field in &source.ty(stand_in).fields {
            let name = &source.field(*field).name;
            match real.field_by_name(target, name) {
                Some(real_field) => {
                    result.counters.fields += 1;
                    self.copy_markers((*field).into(), real_field.into(), result);
                }
                None => self.unmatched((*field).into(), real.ty(target).fqn.as_str(), result),
            }
        }
        for ctor in &source.ty(stand_in).constructors {
            let found = real
                .ty(target)
                .constructors
                .iter()
                .copied()
                .find(|c| self.same_parameters(*ctor, *c));
            self.transfer_method(*ctor, found, target, result);
        }
        for method in &source.ty(stand_in).methods {
            let name = strip_suffix(&source.method(*method).name);
            let found = real
                .ty(target)
                .methods
                .iter()
                .copied()
                .find(|m| real.method(*m).name == name && self.same_parameters(*method, *m));
            self.transfer_method(*method, found, target, result);
        }
    }

    fn transfer_method(
        &self,
        stand_in: MethodId,
        found: Option<MethodId>,
        target: TypeId,
        result: &mut TransferResult,
    ) {
        let Some(real) = found else {
            self.unmatched(stand_in.into(), self.target.ty(target).fqn.as_str(), result);
            return;
        };
        if self.source.is_constructor(stand_in) {
            result.counters.constructors += 1;
        } else {
            result.counters.methods += 1;
        }
        self.copy_markers(stand_in.into(), real.into(), result);
        for index in 0..self.source.method(stand_in).params.len() {
            result.counters.parameters += 1;
            self.copy_markers(
                ParamRef {
                    method: stand_in,
                    index,
                }
                .into(),
                ParamRef {
                    method: real,
                    index,
                }
                .into(),
                result,
            );
        }
    }

    /// Same parameter count, and pairwise compatible parameter types.
    fn same_parameters(&self, stand_in: MethodId, real: MethodId) -> bool {
        let a = &self.source.method(stand_in).params;
        let b = &self.target.method(real).params;
        a.len() == b.len()
            && a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| x.ty.is_transfer_compatible(&y.ty))
    }

    fn copy_markers(&self, from: Declaration, to: Declaration, result: &mut TransferResult) {
        if !is_confirmed(self.source.comments(from)) {
            result.counters.unconfirmed += 1;
            debug!("Not transferring unconfirmed {}", self.source.describe(from));
            return;
        }
        let markers = self.source.markers(from);
        if markers.is_empty() {
            return;
        }
        if let Some(previous) = result.markers.insert(to, markers.to_vec()) {
            result.diagnostics.warn_on(
                to,
                self.target.describe(to),
                format!(
                    "Markers transferred twice, replacing {} markers with those of {}",
                    previous.len(),
                    self.source.describe(from)
                ),
            );
        }
    }

    fn unmatched(&self, decl: Declaration, target_fqn: &str, result: &mut TransferResult) {
        if self.source.is_publicly_accessible(decl) {
            result.counters.unmatched += 1;
            result.diagnostics.warn(
                self.source.describe(decl),
                format!("No counterpart in {target_fqn}"),
            );
        }
    }
}

fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(STAND_IN_SUFFIX).unwrap_or(name)
}

/// A declaration is confirmed unless its leading comment starts with `?`.
pub fn is_confirmed(comments: &[String]) -> bool {
    comments
        .first()
        .is_none_or(|c| !c.trim_start().starts_with(UNCONFIRMED_PREFIX))
}
