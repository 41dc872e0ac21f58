use std::collections::{BTreeMap, BTreeSet};

use crate::decl::{FieldId, MethodId};

/// The field an accessor method reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldValue {
    pub field: FieldId,
    pub setter: bool,
    /// Index of the parameter supplying the written value, for setters.
    pub parameter_index: Option<usize>,
}

/// Relates a constructor, factory or flagged method to a smaller method of the same name.
///
/// The parameters in `convert_to_get_set` are the ones of the larger method
/// that the smaller `method` does not take; they are the ones a builder-style
/// API would set through accessors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GetSetEquivalent {
    pub convert_to_get_set: BTreeSet<usize>,
    pub method: MethodId,
}

/// Which call orders of a type's methods preserve behavior.
///
/// The three groups are free-form tokens kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommutableData {
    pub seq: String,
    pub par: String,
    pub multi: String,
}

impl CommutableData {
    pub fn new(seq: impl Into<String>, par: impl Into<String>, multi: impl Into<String>) -> Self {
        CommutableData {
            seq: seq.into(),
            par: par.into(),
            multi: multi.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty() && self.par.is_empty() && self.multi.is_empty()
    }
}

/// Per referenced field: whether a write through the declaration modifies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableBooleanMap(pub BTreeMap<FieldId, bool>);

impl VariableBooleanMap {
    pub fn single(field: FieldId, modified: bool) -> Self {
        VariableBooleanMap(BTreeMap::from([(field, modified)]))
    }
}
