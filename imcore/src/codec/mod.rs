//! Persistence of property maps keyed by structural position.
//!
//! Every primary type becomes one nested [`EncodedEntry`]. Below it, entries
//! for subtypes, fields, constructors and methods follow in that order, and a
//! method's entry holds the entries of its parameters. An entry's `name` is a
//! single [`Segment`]; its position among the owner's siblings is the key, the
//! name is only verified. Entries with neither data nor children are left out.
//!
//! Decoding a document first resolves and decodes every entry. Only when the
//! whole document is valid are the values written to the store, without
//! overwriting values already present.

pub mod path;
pub mod value;

use std::str::FromStr;

use imdecl::{
    AnalysisStore, Declaration, DeclarationGraph, MethodId, ParamRef, Property, TypeId,
    TypeResolver, Value,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use self::{
    path::{CONSTRUCTOR_NAME, Segment, SegmentKind, StructuralPath},
    value::{ValueDecoder, encode_value},
};
use crate::utils::error::{ShError, ShResult};

/// Data key recording that a declaration was fully analyzed.
pub const ANALYZED_KEY: &str = "shallowAnalyzed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedEntry {
    pub name: String,
    #[serde(default)]
    pub data: Map<String, Json>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub: Vec<EncodedEntry>,
}

impl EncodedEntry {
    fn is_empty(&self) -> bool {
        self.data.is_empty() && self.sub.is_empty()
    }
}

pub struct Encoder<'a> {
    graph: &'a DeclarationGraph,
    store: &'a AnalysisStore,
}

impl<'a> Encoder<'a> {
    pub fn new(graph: &'a DeclarationGraph, store: &'a AnalysisStore) -> Self {
        Encoder { graph, store }
    }

    /// Entry of a primary type, or `None` when nothing in it carries data.
    pub fn encode_primary(&self, ty: TypeId) -> Option<EncodedEntry> {
        let entry = self.encode_type(ty, Segment::primary(self.graph.ty(ty).fqn.clone()));
        (!entry.is_empty()).then_some(entry)
    }

    pub fn encode_all(&self, types: &[TypeId]) -> Vec<EncodedEntry> {
        types.iter().filter_map(|ty| self.encode_primary(*ty)).collect()
    }

    fn data(&self, decl: Declaration) -> Map<String, Json> {
        let mut data = Map::new();
        if let Some(map) = self.store.map(decl) {
            for (property, value) in map.iter() {
                data.insert(property.key().to_string(), encode_value(self.graph, value));
            }
            if map.is_done() {
                data.insert(ANALYZED_KEY.to_string(), Json::from(1));
            }
        }
        data
    }

    fn encode_type(&self, ty: TypeId, segment: Segment) -> EncodedEntry {
        let decl = self.graph.ty(ty);
        let mut sub = Vec::new();
        for (i, nested) in decl.subtypes.iter().enumerate() {
            let name = self.graph.ty(*nested).simple_name.clone();
            sub.push(self.encode_type(*nested, Segment::member(SegmentKind::Subtype, name, i)));
        }
        for (i, field) in decl.fields.iter().enumerate() {
            sub.push(EncodedEntry {
                name: Segment::member(SegmentKind::Field, self.graph.field(*field).name.clone(), i)
                    .to_string(),
                data: self.data(Declaration::Field(*field)),
                sub: Vec::new(),
            });
        }
        for (i, ctor) in decl.constructors.iter().enumerate() {
            sub.push(self.encode_method(
                *ctor,
                Segment::member(SegmentKind::Constructor, CONSTRUCTOR_NAME, i),
            ));
        }
        for (i, method) in decl.methods.iter().enumerate() {
            let name = self.graph.method(*method).name.clone();
            sub.push(self.encode_method(*method, Segment::member(SegmentKind::Method, name, i)));
        }
        sub.retain(|e| !e.is_empty());
        EncodedEntry {
            name: segment.to_string(),
            data: self.data(Declaration::Type(ty)),
            sub,
        }
    }

    fn encode_method(&self, method: MethodId, segment: Segment) -> EncodedEntry {
        let sub = self
            .graph
            .params(method)
            .map(|p| EncodedEntry {
                name: Segment::member(SegmentKind::Parameter, self.graph.param(p).name.clone(), p.index)
                    .to_string(),
                data: self.data(Declaration::Parameter(p)),
                sub: Vec::new(),
            })
            .filter(|e| !e.is_empty())
            .collect();
        EncodedEntry {
            name: segment.to_string(),
            data: self.data(Declaration::Method(method)),
            sub,
        }
    }

    /// One entry per line, as the persisted files are laid out.
    pub fn to_json(entries: &[EncodedEntry]) -> ShResult<String> {
        let lines = entries
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("[\n{}\n]", lines.join(",\n")))
    }
}

/// Values decoded for one declaration, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    pub decl: Declaration,
    pub values: Vec<(Property, Value)>,
    pub analyzed: bool,
}

pub struct Decoder<'a, R: TypeResolver + ?Sized = DeclarationGraph> {
    graph: &'a DeclarationGraph,
    resolver: &'a R,
}

impl<'a> Decoder<'a> {
    pub fn new(graph: &'a DeclarationGraph) -> Self {
        Decoder {
            graph,
            resolver: graph,
        }
    }
}

impl<'a, R: TypeResolver + ?Sized> Decoder<'a, R> {
    /// Decodes against `graph`, locating primary types through `resolver`.
    pub fn with_resolver(graph: &'a DeclarationGraph, resolver: &'a R) -> Self {
        Decoder { graph, resolver }
    }

    /// Parses and decodes a whole document without touching any store.
    pub fn decode_str(&self, text: &str) -> ShResult<Vec<DecodedEntry>> {
        let entries: Vec<EncodedEntry> = serde_json::from_str(text)?;
        self.decode_entries(&entries)
    }

    pub fn decode_entries(&self, entries: &[EncodedEntry]) -> ShResult<Vec<DecodedEntry>> {
        let mut out = Vec::new();
        for entry in entries {
            let segment = Segment::parse(&entry.name)?;
            if !segment.kind.is_type() {
                return Err(ShError::MalformedPath {
                    path: entry.name.clone(),
                    reason: "top-level entries must be primary types".to_string(),
                });
            }
            let ty = self
                .resolver
                .resolve_fqn(&segment.name)
                .ok_or_else(|| ShError::UnknownType {
                    fqn: segment.name.clone(),
                })?;
            let path = StructuralPath::default().child(segment);
            self.decode_entry(Declaration::Type(ty), &path, entry, &mut out)?;
        }
        Ok(out)
    }

    fn decode_entry(
        &self,
        decl: Declaration,
        path: &StructuralPath,
        entry: &EncodedEntry,
        out: &mut Vec<DecodedEntry>,
    ) -> ShResult<()> {
        let path_text = path.to_string();
        let owner = self.graph.owning_type(decl);
        let mut decoded = DecodedEntry {
            decl,
            values: Vec::new(),
            analyzed: false,
        };
        for (key, json) in &entry.data {
            if key == ANALYZED_KEY {
                decoded.analyzed = json.as_u64() == Some(1);
                continue;
            }
            let property = Property::from_str(key).map_err(|_| ShError::UnknownProperty {
                key: key.clone(),
                path: path_text.clone(),
            })?;
            if !property.is_legal_on(decl.kind()) {
                return Err(ShError::UndecodableValue {
                    property: key.clone(),
                    path: path_text,
                    reason: format!("not a property of a {}", decl.kind()),
                });
            }
            let value = ValueDecoder {
                graph: self.graph,
                owner,
                path: &path_text,
                property,
            }
            .decode(json)?;
            decoded.values.push((property, value));
        }
        out.push(decoded);

        for child in &entry.sub {
            let segment = Segment::parse(&child.name)?;
            let child_path = path.child(segment.clone());
            let child_decl = self.resolve_child(decl, &segment, &child_path)?;
            self.decode_entry(child_decl, &child_path, child, out)?;
        }
        Ok(())
    }

    fn resolve_child(
        &self,
        parent: Declaration,
        segment: &Segment,
        path: &StructuralPath,
    ) -> ShResult<Declaration> {
        let malformed = |reason: String| ShError::MalformedPath {
            path: path.to_string(),
            reason,
        };
        let index = segment
            .index
            .ok_or_else(|| malformed(format!("{} segments need an index", segment.kind)))?;
        let out_of_range = |kind: &'static str, len: usize| ShError::PathIndexOutOfRange {
            path: path.to_string(),
            kind,
            index,
            len,
        };
        let (decl, found) = match (parent, segment.kind) {
            (Declaration::Type(ty), SegmentKind::Subtype) => {
                let list = &self.graph.ty(ty).subtypes;
                let id = *list.get(index).ok_or_else(|| out_of_range("subtype", list.len()))?;
                (Declaration::Type(id), &self.graph.ty(id).simple_name)
            }
            (Declaration::Type(ty), SegmentKind::Field) => {
                let list = &self.graph.ty(ty).fields;
                let id = *list.get(index).ok_or_else(|| out_of_range("field", list.len()))?;
                (Declaration::Field(id), &self.graph.field(id).name)
            }
            (Declaration::Type(ty), SegmentKind::Constructor) => {
                let list = &self.graph.ty(ty).constructors;
                let id = *list
                    .get(index)
                    .ok_or_else(|| out_of_range("constructor", list.len()))?;
                (Declaration::Method(id), &self.graph.method(id).name)
            }
            (Declaration::Type(ty), SegmentKind::Method) => {
                let list = &self.graph.ty(ty).methods;
                let id = *list.get(index).ok_or_else(|| out_of_range("method", list.len()))?;
                (Declaration::Method(id), &self.graph.method(id).name)
            }
            (Declaration::Method(method), SegmentKind::Parameter) => {
                let params = &self.graph.method(method).params;
                let param = params
                    .get(index)
                    .ok_or_else(|| out_of_range("parameter", params.len()))?;
                (
                    Declaration::Parameter(ParamRef { method, index }),
                    &param.name,
                )
            }
            (parent, kind) => {
                return Err(malformed(format!(
                    "a {kind} segment cannot appear below a {}",
                    parent.kind()
                )));
            }
        };
        if *found != segment.name {
            return Err(ShError::NameMismatch {
                path: path.to_string(),
                expected: segment.name.clone(),
                found: found.clone(),
            });
        }
        Ok(decl)
    }
}

/// Writes decoded values, keeping values already present; returns how many were stored.
pub fn apply(decoded: Vec<DecodedEntry>, store: &mut AnalysisStore) -> ShResult<usize> {
    let mut stored = 0;
    for entry in decoded {
        for (property, value) in entry.values {
            if store.set_if_absent(entry.decl, property, value)? {
                stored += 1;
            } else {
                debug!("Keeping existing {property} of {:?}", entry.decl);
            }
        }
        if entry.analyzed {
            store.mark_done(entry.decl);
        }
    }
    Ok(stored)
}
