//! JSON encoding of property values.
//!
//! Field and method references are written as segments relative to the type
//! owning the declaration, so a value never mentions arena identifiers.

use std::collections::{BTreeMap, BTreeSet};

use imdecl::{
    DeclarationGraph, FieldId, MethodId, Property, TypeId, Value, ValueKind,
    value::{
        CommutableData, FieldValue, GetSetEquivalent, Immutable, Independent, NotNull,
        VariableBooleanMap,
    },
};
use serde_json::{Map, Value as Json, json};

use super::path::{CONSTRUCTOR_NAME, Segment, SegmentKind};
use crate::utils::error::{ShError, ShResult};

pub(crate) fn field_segment(graph: &DeclarationGraph, field: FieldId) -> Segment {
    let decl = graph.field(field);
    let index = graph
        .ty(decl.owner)
        .fields
        .iter()
        .position(|f| *f == field)
        .unwrap_or_default();
    Segment::member(SegmentKind::Field, decl.name.clone(), index)
}

pub(crate) fn method_segment(graph: &DeclarationGraph, method: MethodId) -> Segment {
    let decl = graph.method(method);
    let owner = graph.ty(decl.owner);
    if decl.kind.is_constructor() {
        let index = owner
            .constructors
            .iter()
            .position(|m| *m == method)
            .unwrap_or_default();
        Segment::member(SegmentKind::Constructor, CONSTRUCTOR_NAME, index)
    } else {
        let index = owner
            .methods
            .iter()
            .position(|m| *m == method)
            .unwrap_or_default();
        Segment::member(SegmentKind::Method, decl.name.clone(), index)
    }
}

pub fn encode_value(graph: &DeclarationGraph, value: &Value) -> Json {
    match value {
        Value::Immutable(v) => json!(v.level()),
        Value::NotNull(v) => json!(v.level()),
        Value::Bool(b) => json!(u8::from(*b)),
        Value::Independent(v) if !v.has_links() => json!(v.level().level()),
        Value::Independent(v) => {
            let links: Map<String, Json> = v
                .links()
                .iter()
                .map(|(position, link)| (position.to_string(), json!(link.level())))
                .collect();
            json!([v.level().level(), links])
        }
        Value::FieldValue(v) => json!([
            field_segment(graph, v.field).to_string(),
            u8::from(v.setter),
            v.parameter_index.map_or(-1, |i| i as i64)
        ]),
        Value::GetSetEquivalent(v) => json!([
            v.convert_to_get_set.iter().collect::<Vec<_>>(),
            method_segment(graph, v.method).to_string()
        ]),
        Value::Commutable(v) => json!([v.seq, v.par, v.multi]),
        Value::VariableBooleanMap(v) => {
            let map: Map<String, Json> = v
                .0
                .iter()
                .map(|(field, b)| (field_segment(graph, *field).to_string(), json!(u8::from(*b))))
                .collect();
            Json::Object(map)
        }
        Value::Message(m) => json!(m),
    }
}

/// Decodes one value; `owner` is the type the decoded declaration belongs to.
pub struct ValueDecoder<'a> {
    pub graph: &'a DeclarationGraph,
    pub owner: TypeId,
    pub path: &'a str,
    pub property: Property,
}

impl ValueDecoder<'_> {
    fn error(&self, reason: impl Into<String>) -> ShError {
        ShError::UndecodableValue {
            property: self.property.to_string(),
            path: self.path.to_string(),
            reason: reason.into(),
        }
    }

    fn level(&self, json: &Json) -> ShResult<u8> {
        json.as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| self.error(format!("expected a level, found {json}")))
    }

    fn flag(&self, json: &Json) -> ShResult<bool> {
        match json.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(self.error(format!("expected 0 or 1, found {json}"))),
        }
    }

    fn string<'j>(&self, json: &'j Json) -> ShResult<&'j str> {
        json.as_str()
            .ok_or_else(|| self.error(format!("expected a string, found {json}")))
    }

    fn array<'j>(&self, json: &'j Json, len: usize) -> ShResult<&'j [Json]> {
        match json.as_array() {
            Some(items) if items.len() == len => Ok(items),
            _ => Err(self.error(format!("expected an array of {len} elements, found {json}"))),
        }
    }

    fn field(&self, json: &Json) -> ShResult<FieldId> {
        let segment = Segment::parse(self.string(json)?)?;
        let fields = &self.graph.ty(self.owner).fields;
        let index = match (segment.kind, segment.index) {
            (SegmentKind::Field, Some(index)) => index,
            _ => return Err(self.error(format!("expected a field segment, found {segment}"))),
        };
        let field = *fields.get(index).ok_or_else(|| ShError::PathIndexOutOfRange {
            path: format!("{}:{segment}", self.path),
            kind: "field",
            index,
            len: fields.len(),
        })?;
        let found = &self.graph.field(field).name;
        if *found != segment.name {
            return Err(ShError::NameMismatch {
                path: format!("{}:{segment}", self.path),
                expected: segment.name,
                found: found.clone(),
            });
        }
        Ok(field)
    }

    fn method(&self, json: &Json) -> ShResult<MethodId> {
        let segment = Segment::parse(self.string(json)?)?;
        let owner = self.graph.ty(self.owner);
        let (siblings, kind) = match segment.kind {
            SegmentKind::Constructor => (&owner.constructors, "constructor"),
            SegmentKind::Method => (&owner.methods, "method"),
            _ => return Err(self.error(format!("expected a method segment, found {segment}"))),
        };
        let index = segment.index.unwrap_or_default();
        let method = *siblings.get(index).ok_or_else(|| ShError::PathIndexOutOfRange {
            path: format!("{}:{segment}", self.path),
            kind,
            index,
            len: siblings.len(),
        })?;
        let found = &self.graph.method(method).name;
        if *found != segment.name {
            return Err(ShError::NameMismatch {
                path: format!("{}:{segment}", self.path),
                expected: segment.name,
                found: found.clone(),
            });
        }
        Ok(method)
    }

    pub fn decode(&self, json: &Json) -> ShResult<Value> {
        let value = match self.property.value_kind() {
            ValueKind::Immutable => Immutable::from_level(self.level(json)?)?.into(),
            ValueKind::NotNull => NotNull::from_level(self.level(json)?)?.into(),
            ValueKind::Bool => self.flag(json)?.into(),
            ValueKind::Independent => self.independent(json)?.into(),
            ValueKind::FieldValue => {
                let items = self.array(json, 3)?;
                let parameter_index = match items[2].as_i64() {
                    Some(-1) => None,
                    Some(i) if i >= 0 => Some(i as usize),
                    _ => return Err(self.error(format!("invalid parameter index {}", items[2]))),
                };
                FieldValue {
                    field: self.field(&items[0])?,
                    setter: self.flag(&items[1])?,
                    parameter_index,
                }
                .into()
            }
            ValueKind::GetSetEquivalent => {
                let items = self.array(json, 2)?;
                let indices = items[0]
                    .as_array()
                    .ok_or_else(|| self.error("expected an array of parameter indices"))?;
                let convert_to_get_set = indices
                    .iter()
                    .map(|i| {
                        i.as_u64()
                            .map(|i| i as usize)
                            .ok_or_else(|| self.error(format!("invalid parameter index {i}")))
                    })
                    .collect::<ShResult<BTreeSet<usize>>>()?;
                GetSetEquivalent {
                    convert_to_get_set,
                    method: self.method(&items[1])?,
                }
                .into()
            }
            ValueKind::Commutable => {
                let items = self.array(json, 3)?;
                CommutableData::new(
                    self.string(&items[0])?,
                    self.string(&items[1])?,
                    self.string(&items[2])?,
                )
                .into()
            }
            ValueKind::VariableBooleanMap => {
                let object = json
                    .as_object()
                    .ok_or_else(|| self.error(format!("expected an object, found {json}")))?;
                let mut map = BTreeMap::new();
                for (key, flag) in object {
                    map.insert(self.field(&Json::String(key.clone()))?, self.flag(flag)?);
                }
                VariableBooleanMap(map).into()
            }
            ValueKind::Message => self.string(json)?.to_string().into(),
        };
        Ok(value)
    }

    fn independent(&self, json: &Json) -> ShResult<Independent> {
        if let Some(items) = json.as_array() {
            let [level, links] = items.as_slice() else {
                return Err(self.error(format!("expected [level, links], found {json}")));
            };
            let links = links
                .as_object()
                .ok_or_else(|| self.error(format!("expected a link object, found {links}")))?;
            let mut map = BTreeMap::new();
            for (position, link) in links {
                let position: i32 = position
                    .parse()
                    .map_err(|_| self.error(format!("invalid link position {position}")))?;
                map.insert(position, self.level(link)?);
            }
            Ok(Independent::with_links(self.level(level)?, map)?)
        } else {
            Ok(Independent::with_links(self.level(json)?, BTreeMap::new())?)
        }
    }
}
