use std::{collections::BTreeMap, fmt};

use strum::{Display, EnumIter};

use super::Lattice;
use crate::utils::{Error, ModelResult};

/// Depth of immutability of a type, or of the object a field, method or parameter refers to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Display,
)]
#[repr(u8)]
pub enum Immutable {
    #[default]
    #[strum(serialize = "MUTABLE")]
    Mutable = 0,
    #[strum(serialize = "FINAL_FIELDS")]
    FinalFields = 1,
    /// Immutable up to the identity of unbound type parameters ("hidden content").
    #[strum(serialize = "IMMUTABLE_HC")]
    ImmutableHc = 2,
    #[strum(serialize = "IMMUTABLE")]
    Immutable = 3,
}

impl Immutable {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> ModelResult<Self> {
        match level {
            0 => Ok(Immutable::Mutable),
            1 => Ok(Immutable::FinalFields),
            2 => Ok(Immutable::ImmutableHc),
            3 => Ok(Immutable::Immutable),
            _ => Err(Error::MalformedValue {
                reason: format!("immutability level must be in 0..=3, got {level}"),
            }),
        }
    }

    pub fn is_mutable(self) -> bool {
        self == Immutable::Mutable
    }

    pub fn is_immutable(self) -> bool {
        self == Immutable::Immutable
    }

    pub fn is_at_least_immutable_hc(self) -> bool {
        self >= Immutable::ImmutableHc
    }

    /// The sharing level implied by this immutability level.
    pub fn to_corresponding_independent(self) -> Independent {
        match self {
            Immutable::Immutable => Independent::INDEPENDENT,
            Immutable::ImmutableHc => Independent::INDEPENDENT_HC,
            _ => Independent::DEPENDENT,
        }
    }
}

impl Lattice for Immutable {
    fn bottom() -> Self {
        Immutable::Mutable
    }

    fn top() -> Self {
        Immutable::Immutable
    }
}

/// Coarse sharing level, also used as the per-position classification of an [`Independent`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Display,
)]
#[repr(u8)]
pub enum IndependentLevel {
    #[default]
    #[strum(serialize = "DEPENDENT")]
    Dependent = 0,
    #[strum(serialize = "INDEPENDENT_HC")]
    IndependentHc = 1,
    #[strum(serialize = "INDEPENDENT")]
    Independent = 2,
}

impl IndependentLevel {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> ModelResult<Self> {
        match level {
            0 => Ok(IndependentLevel::Dependent),
            1 => Ok(IndependentLevel::IndependentHc),
            2 => Ok(IndependentLevel::Independent),
            _ => Err(Error::MalformedValue {
                reason: format!("independence level must be in 0..=2, got {level}"),
            }),
        }
    }
}

/// Sharing between an object and the objects reachable from it.
///
/// A parameter can refine its level with a map from positions to a
/// classification, where position `-1` is the return value and every other key
/// is a parameter index. Ordering compares the level first and the map second.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Independent {
    level: IndependentLevel,
    links: BTreeMap<i32, IndependentLevel>,
}

impl Independent {
    /// Position key of the return value in [`Independent::links`].
    pub const RETURN_VALUE: i32 = -1;

    pub const DEPENDENT: Independent = Independent::plain(IndependentLevel::Dependent);
    pub const INDEPENDENT_HC: Independent = Independent::plain(IndependentLevel::IndependentHc);
    pub const INDEPENDENT: Independent = Independent::plain(IndependentLevel::Independent);

    pub const fn plain(level: IndependentLevel) -> Self {
        Independent {
            level,
            links: BTreeMap::new(),
        }
    }

    /// Builds a value from raw components.
    ///
    /// With a non-empty map the level is the hidden-content flag and must be 0
    /// or 1; map entries must classify positions `>= -1` as 0 (dependent) or
    /// 1 (hidden-content dependent).
    pub fn with_links(level: u8, links: BTreeMap<i32, u8>) -> ModelResult<Self> {
        if links.is_empty() {
            return Ok(Independent::plain(IndependentLevel::from_level(level)?));
        }
        if level > 1 {
            return Err(Error::MalformedValue {
                reason: format!(
                    "an independence value with per-position links needs hidden-content level 0 or 1, got {level}"
                ),
            });
        }
        let mut converted = BTreeMap::new();
        for (position, link) in links {
            if position < Self::RETURN_VALUE {
                return Err(Error::MalformedValue {
                    reason: format!("invalid link position {position}"),
                });
            }
            if link > 1 {
                return Err(Error::MalformedValue {
                    reason: format!("link of position {position} must be 0 or 1, got {link}"),
                });
            }
            converted.insert(position, IndependentLevel::from_level(link)?);
        }
        Ok(Independent {
            level: IndependentLevel::from_level(level)?,
            links: converted,
        })
    }

    /// Collects the positional attributes of an independence marker.
    ///
    /// Hidden-content entries are applied after dependent ones, so a position
    /// listed in both ends up hidden-content dependent.
    pub fn link_map(
        dependent_parameters: &[i64],
        hc_parameters: &[i64],
        dependent_return_value: bool,
        hc_return_value: bool,
    ) -> ModelResult<BTreeMap<i32, u8>> {
        let mut map = BTreeMap::new();
        for (parameters, link) in [(dependent_parameters, 0u8), (hc_parameters, 1u8)] {
            for &index in parameters {
                let position = i32::try_from(index)
                    .ok()
                    .filter(|p| *p >= 0)
                    .ok_or_else(|| Error::MalformedValue {
                        reason: format!("parameter index {index} is out of range"),
                    })?;
                map.insert(position, link);
            }
        }
        if dependent_return_value {
            map.insert(Self::RETURN_VALUE, 0);
        }
        if hc_return_value {
            map.insert(Self::RETURN_VALUE, 1);
        }
        Ok(map)
    }

    pub fn level(&self) -> IndependentLevel {
        self.level
    }

    pub fn links(&self) -> &BTreeMap<i32, IndependentLevel> {
        &self.links
    }

    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn is_independent(&self) -> bool {
        self.level == IndependentLevel::Independent
    }

    pub fn is_at_least_independent_hc(&self) -> bool {
        self.level >= IndependentLevel::IndependentHc
    }
}

impl From<IndependentLevel> for Independent {
    fn from(level: IndependentLevel) -> Self {
        Independent::plain(level)
    }
}

impl fmt::Display for Independent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if !self.links.is_empty() {
            write!(f, "{{")?;
            for (i, (position, link)) in self.links.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{position}: {link}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

impl Lattice for Independent {
    fn bottom() -> Self {
        Independent::DEPENDENT
    }

    fn top() -> Self {
        Independent::INDEPENDENT
    }
}

/// Nullability of a field, method result or parameter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Display,
)]
#[repr(u8)]
pub enum NotNull {
    #[default]
    #[strum(serialize = "NULLABLE")]
    Nullable = 0,
    #[strum(serialize = "NOT_NULL")]
    NotNull = 1,
    /// Not null, and neither are the elements it contains.
    #[strum(serialize = "CONTENT_NOT_NULL")]
    ContentNotNull = 2,
}

impl NotNull {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> ModelResult<Self> {
        match level {
            0 => Ok(NotNull::Nullable),
            1 => Ok(NotNull::NotNull),
            2 => Ok(NotNull::ContentNotNull),
            _ => Err(Error::MalformedValue {
                reason: format!("nullability level must be in 0..=2, got {level}"),
            }),
        }
    }

    pub fn is_nullable(self) -> bool {
        self == NotNull::Nullable
    }
}

impl Lattice for NotNull {
    fn bottom() -> Self {
        NotNull::Nullable
    }

    fn top() -> Self {
        NotNull::ContentNotNull
    }
}
