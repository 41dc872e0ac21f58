//! Property maps and the store holding one map per declaration.

use std::collections::{BTreeMap, btree_map};

use crate::{
    decl::Declaration,
    property::Property,
    utils::{Error, ModelResult},
    value::{TypedValue, Value},
};

/// Whether the shallow analyzer already processed a declaration.
///
/// Kept next to the values rather than as a boolean property, so it never
/// collides with a genuine boolean property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnalysisState {
    #[default]
    Pending,
    Done,
}

/// Set-once key/value store of one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    values: BTreeMap<Property, Value>,
    state: AnalysisState,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: Property) -> Option<&Value> {
        self.values.get(&property)
    }

    pub fn get_typed<T: TypedValue>(&self, property: Property) -> Option<&T> {
        self.values.get(&property).and_then(T::from_value)
    }

    /// The stored value, or `default` when absent.
    pub fn get_or<T: TypedValue>(&self, property: Property, default: T) -> T {
        self.get_typed(property).cloned().unwrap_or(default)
    }

    pub fn contains(&self, property: Property) -> bool {
        self.values.contains_key(&property)
    }

    /// Stores a value.
    ///
    /// Storing the value already present is a no-op; storing a different one
    /// fails with [`Error::ValueOverwrite`].
    pub fn set(&mut self, property: Property, value: Value) -> ModelResult<()> {
        check_kind(property, &value)?;
        match self.values.entry(property) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
            btree_map::Entry::Occupied(entry) if *entry.get() == value => Ok(()),
            btree_map::Entry::Occupied(entry) => Err(Error::ValueOverwrite {
                property,
                old: entry.get().to_string(),
                new: value.to_string(),
            }),
        }
    }

    /// Stores a value unless the property already has one; returns whether it was stored.
    pub fn set_if_absent(&mut self, property: Property, value: Value) -> ModelResult<bool> {
        check_kind(property, &value)?;
        match self.values.entry(property) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(true)
            }
            btree_map::Entry::Occupied(_) => Ok(false),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &Value)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == AnalysisState::Done
    }

    pub fn mark_done(&mut self) {
        self.state = AnalysisState::Done;
    }
}

fn check_kind(property: Property, value: &Value) -> ModelResult<()> {
    if value.kind() == property.value_kind() {
        Ok(())
    } else {
        Err(Error::ValueKindMismatch {
            property,
            expected: property.value_kind(),
            found: value.kind(),
        })
    }
}

/// Property maps of all declarations of a graph.
///
/// The declaration graph is owned elsewhere; the store only keys maps by
/// declaration and enforces that a property is legal on the declaration kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisStore {
    maps: BTreeMap<Declaration, PropertyMap>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, decl: Declaration) -> Option<&PropertyMap> {
        self.maps.get(&decl)
    }

    pub fn get(&self, decl: Declaration, property: Property) -> Option<&Value> {
        self.maps.get(&decl).and_then(|m| m.get(property))
    }

    pub fn get_typed<T: TypedValue>(&self, decl: Declaration, property: Property) -> Option<&T> {
        self.maps.get(&decl).and_then(|m| m.get_typed(property))
    }

    pub fn get_or<T: TypedValue>(&self, decl: Declaration, property: Property, default: T) -> T {
        self.get_typed(decl, property).cloned().unwrap_or(default)
    }

    pub fn contains(&self, decl: Declaration, property: Property) -> bool {
        self.maps.get(&decl).is_some_and(|m| m.contains(property))
    }

    fn check_legal(decl: Declaration, property: Property) -> ModelResult<()> {
        if property.is_legal_on(decl.kind()) {
            Ok(())
        } else {
            Err(Error::IllegalProperty {
                property,
                kind: decl.kind(),
            })
        }
    }

    pub fn set(&mut self, decl: Declaration, property: Property, value: Value) -> ModelResult<()> {
        Self::check_legal(decl, property)?;
        self.maps.entry(decl).or_default().set(property, value)
    }

    pub fn set_if_absent(
        &mut self,
        decl: Declaration,
        property: Property,
        value: Value,
    ) -> ModelResult<bool> {
        Self::check_legal(decl, property)?;
        self.maps.entry(decl).or_default().set_if_absent(property, value)
    }

    pub fn is_done(&self, decl: Declaration) -> bool {
        self.maps.get(&decl).is_some_and(PropertyMap::is_done)
    }

    pub fn mark_done(&mut self, decl: Declaration) {
        self.maps.entry(decl).or_default().mark_done();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Declaration, &PropertyMap)> {
        self.maps.iter().map(|(d, m)| (*d, m))
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
