//! Structural path segments.
//!
//! A segment names one declaration relative to its owner: `T<fqn>` for a
//! primary type, and `S`, `F`, `C`, `M` or `P` followed by the member name and
//! its position among the owner's subtypes, fields, constructors, methods or
//! parameters, e.g. `Mget(3)` or `C<init>(0)`.

use std::fmt;

use chumsky::{prelude::*, text::digits};
use strum::{Display, EnumIs};

use crate::utils::error::{ShError, ShResult};

/// Name of every constructor in a segment.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SegmentKind {
    Type,
    Subtype,
    Field,
    Constructor,
    Method,
    Parameter,
}

impl SegmentKind {
    pub fn tag(self) -> char {
        match self {
            SegmentKind::Type => 'T',
            SegmentKind::Subtype => 'S',
            SegmentKind::Field => 'F',
            SegmentKind::Constructor => 'C',
            SegmentKind::Method => 'M',
            SegmentKind::Parameter => 'P',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub kind: SegmentKind,
    pub name: String,
    /// Position among the siblings of the same kind; `None` for primary types.
    pub index: Option<usize>,
}

impl Segment {
    pub fn primary(fqn: impl Into<String>) -> Self {
        Segment {
            kind: SegmentKind::Type,
            name: fqn.into(),
            index: None,
        }
    }

    pub fn member(kind: SegmentKind, name: impl Into<String>, index: usize) -> Self {
        Segment {
            kind,
            name: name.into(),
            index: Some(index),
        }
    }

    pub fn parse(text: &str) -> ShResult<Self> {
        segment_parser()
            .then_ignore(end())
            .parse(text)
            .into_result()
            .map_err(|errors| ShError::MalformedPath {
                path: text.to_string(),
                reason: errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.name)?;
        if let Some(index) = self.index {
            write!(f, "({index})")?;
        }
        Ok(())
    }
}

fn name_parser<'src>() -> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone
{
    any()
        .filter(|c: &char| *c != '(' && *c != ')' && !c.is_whitespace())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .labelled("name")
}

fn index_parser<'src>() -> impl Parser<'src, &'src str, usize, extra::Err<Rich<'src, char>>> + Clone
{
    digits(10)
        .at_least(1)
        .to_slice()
        .try_map(|digits: &str, span| {
            digits
                .parse::<usize>()
                .map_err(|_| Rich::custom(span, format!("invalid index: {digits}")))
        })
        .delimited_by(just('('), just(')'))
        .labelled("index")
}

pub fn segment_parser<'src>()
-> impl Parser<'src, &'src str, Segment, extra::Err<Rich<'src, char>>> + Clone {
    let member_kind = choice((
        just('S').to(SegmentKind::Subtype),
        just('F').to(SegmentKind::Field),
        just('C').to(SegmentKind::Constructor),
        just('M').to(SegmentKind::Method),
        just('P').to(SegmentKind::Parameter),
    ))
    .labelled("segment kind");

    let primary = just('T')
        .ignore_then(name_parser())
        .map(Segment::primary)
        .labelled("primary type");

    let member = member_kind
        .then(name_parser())
        .then(index_parser())
        .try_map(|((kind, name), index), span| {
            if kind.is_constructor() && name != CONSTRUCTOR_NAME {
                return Err(Rich::custom(
                    span,
                    format!("constructors are named {CONSTRUCTOR_NAME}, found {name}"),
                ));
            }
            Ok(Segment::member(kind, name, index))
        })
        .labelled("member");

    choice((primary, member)).labelled("structural path segment")
}

/// Segments from a primary type down to one declaration, for messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralPath(pub Vec<Segment>);

impl StructuralPath {
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        StructuralPath(segments)
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
