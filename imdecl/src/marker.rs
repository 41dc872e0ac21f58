//! The closed catalog of property markers.
//!
//! A marker is a structured tag attached to a declaration in source: a kind,
//! an `absent` flag negating it, and a bag of named attributes. Names are
//! resolved against [`MARKER_NAMESPACE`] when a marker is built, so an unknown
//! marker is rejected up front instead of being silently ignored. Attributes
//! are checked against the kind when the marker is compiled.

use std::{collections::BTreeMap, fmt, str::FromStr};

use enum_map::Enum;
use smallvec::SmallVec;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::utils::{Error, ModelResult};

/// Namespace every marker name lives in.
pub const MARKER_NAMESPACE: &str = "org.e2immu.annotation";

/// Sub-namespaces below [`MARKER_NAMESPACE`] that may precede a marker kind.
const SUB_NAMESPACES: &[&str] = &["method", "rare", "type"];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Enum,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
pub enum MarkerKind {
    Immutable,
    ImmutableContainer,
    FinalFields,
    Container,
    Independent,
    NotModified,
    Modified,
    Identity,
    Fluent,
    NotNull,
    Final,
    IgnoreModifications,
    GetSet,
    Commutable,
    UtilityClass,
    AllowsInterrupt,
    StaticSideEffects,
}

impl MarkerKind {
    /// Attribute names this kind accepts; `absent` is carried separately.
    pub fn allowed_attributes(self) -> &'static [&'static str] {
        match self {
            MarkerKind::Immutable | MarkerKind::ImmutableContainer => &["hc"],
            MarkerKind::Independent => &[
                "hc",
                "dependentParameters",
                "hcParameters",
                "dependentReturnValue",
                "hcReturnValue",
            ],
            MarkerKind::Modified => &["value"],
            MarkerKind::NotNull => &["content"],
            MarkerKind::GetSet => &["value", "equivalent"],
            MarkerKind::Commutable => &["seq", "par", "multi"],
            MarkerKind::FinalFields
            | MarkerKind::Container
            | MarkerKind::NotModified
            | MarkerKind::Identity
            | MarkerKind::Fluent
            | MarkerKind::Final
            | MarkerKind::IgnoreModifications
            | MarkerKind::UtilityClass
            | MarkerKind::AllowsInterrupt
            | MarkerKind::StaticSideEffects => &[],
        }
    }

    /// Resolves a fully qualified marker name such as `org.e2immu.annotation.method.GetSet`.
    pub fn from_qualified_name(name: &str) -> ModelResult<Self> {
        let unknown = || Error::UnknownMarker {
            name: name.to_string(),
            namespace: MARKER_NAMESPACE,
        };
        let rest = name
            .strip_prefix(MARKER_NAMESPACE)
            .and_then(|r| r.strip_prefix('.'))
            .ok_or_else(unknown)?;
        let simple = match rest.split_once('.') {
            Some((sub, simple)) if SUB_NAMESPACES.contains(&sub) => simple,
            Some(_) => return Err(unknown()),
            None => rest,
        };
        MarkerKind::from_str(simple).map_err(|_| unknown())
    }
}

/// An attribute value of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    IntArray(SmallVec<i64, 4>),
    Str(String),
}

impl AttrValue {
    fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "boolean",
            AttrValue::Int(_) => "integer",
            AttrValue::IntArray(_) => "integer array",
            AttrValue::Str(_) => "string",
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<&[i64]> for AttrValue {
    fn from(value: &[i64]) -> Self {
        AttrValue::IntArray(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[i64; N]> for AttrValue {
    fn from(value: [i64; N]) -> Self {
        AttrValue::IntArray(value.into_iter().collect())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker {
    kind: MarkerKind,
    absent: bool,
    attributes: BTreeMap<String, AttrValue>,
}

impl Marker {
    pub fn new(kind: MarkerKind) -> Self {
        Marker {
            kind,
            absent: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Builds a marker from its fully qualified name.
    pub fn named(name: &str) -> ModelResult<Self> {
        MarkerKind::from_qualified_name(name).map(Marker::new)
    }

    pub fn absent(mut self) -> Self {
        self.absent = true;
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn is_absent(&self) -> bool {
        self.absent
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    /// Checks every attribute name against the kind.
    pub fn validate(&self) -> ModelResult<()> {
        let allowed = self.kind.allowed_attributes();
        match self.attributes.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(self.malformed(format!(
                "attribute `{key}` is not accepted, expected one of {allowed:?}"
            ))),
            None => Ok(()),
        }
    }

    fn malformed(&self, reason: String) -> Error {
        Error::MalformedMarker {
            marker: self.to_string(),
            reason,
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &AttrValue) -> Error {
        self.malformed(format!(
            "attribute `{key}` must be a {expected}, found a {}",
            found.type_name()
        ))
    }

    /// A boolean attribute, `false` when missing.
    pub fn bool_attr(&self, key: &str) -> ModelResult<bool> {
        match self.attributes.get(key) {
            None => Ok(false),
            Some(AttrValue::Bool(b)) => Ok(*b),
            Some(other) => Err(self.wrong_type(key, "boolean", other)),
        }
    }

    /// An integer array attribute, empty when missing; a single integer counts as a one-element array.
    pub fn int_array_attr(&self, key: &str) -> ModelResult<SmallVec<i64, 4>> {
        match self.attributes.get(key) {
            None => Ok(SmallVec::new()),
            Some(AttrValue::IntArray(values)) => Ok(values.clone()),
            Some(AttrValue::Int(value)) => Ok(SmallVec::from_iter([*value])),
            Some(other) => Err(self.wrong_type(key, "integer array", other)),
        }
    }

    pub fn str_attr(&self, key: &str) -> ModelResult<Option<&str>> {
        match self.attributes.get(key) {
            None => Ok(None),
            Some(AttrValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(self.wrong_type(key, "string", other)),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind)?;
        if self.absent || !self.attributes.is_empty() {
            write!(f, "(")?;
            let mut first = true;
            if self.absent {
                write!(f, "absent=true")?;
                first = false;
            }
            for (key, value) in &self.attributes {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                match value {
                    AttrValue::Bool(b) => write!(f, "{key}={b}")?,
                    AttrValue::Int(i) => write!(f, "{key}={i}")?,
                    AttrValue::IntArray(values) => write!(f, "{key}={values:?}")?,
                    AttrValue::Str(s) => write!(f, "{key}={s:?}")?,
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
