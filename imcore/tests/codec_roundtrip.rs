use std::collections::BTreeMap;

use imcore::{
    codec::{self, Decoder, Encoder},
    utils::error::ShError,
};
use imdecl::{
    AnalysisStore, DeclarationGraph, FieldId, MethodId, ParamRef, Property, TypeId, Value,
    decl::{Primitive, TypeRef},
    value::{
        CommutableData, FieldValue, GetSetEquivalent, Immutable, Independent, NotNull,
        VariableBooleanMap,
    },
};

struct Library {
    graph: DeclarationGraph,
    store_ty: TypeId,
    entry: TypeId,
    items: FieldId,
    empty_ctor: MethodId,
    full_ctor: MethodId,
    add: MethodId,
}

fn library(items_name: &str) -> Library {
    let mut graph = DeclarationGraph::new();
    let store_ty = graph.add_type("org.lib", "Store");
    let entry = graph.add_subtype(store_ty, "Entry");
    graph.add_field(store_ty, "size", TypeRef::primitive(Primitive::Int));
    let items = graph.add_field(store_ty, items_name, TypeRef::class("java.util.List"));
    let empty_ctor = graph.add_constructor(store_ty);
    let full_ctor = graph.add_constructor(store_ty);
    graph.add_parameter(full_ctor, "items", TypeRef::class("java.util.List"));
    graph.add_method(store_ty, "size", TypeRef::primitive(Primitive::Int));
    let add = graph.add_method(store_ty, "add", TypeRef::void());
    graph.add_parameter(add, "value", TypeRef::string());
    Library {
        graph,
        store_ty,
        entry,
        items,
        empty_ctor,
        full_ctor,
        add,
    }
}

fn analyzed(lib: &Library) -> AnalysisStore {
    let mut store = AnalysisStore::new();
    let ty = lib.store_ty.into();
    store
        .set(ty, Property::ImmutableType, Immutable::FinalFields.into())
        .unwrap();
    store
        .set(ty, Property::IndependentType, Independent::INDEPENDENT_HC.into())
        .unwrap();
    store.set(ty, Property::ContainerType, true.into()).unwrap();
    store
        .set(ty, Property::Message, "checked by hand".to_string().into())
        .unwrap();
    store.mark_done(ty);

    store
        .set(lib.entry.into(), Property::ImmutableType, Immutable::Immutable.into())
        .unwrap();
    store.mark_done(lib.entry.into());

    store
        .set(lib.items.into(), Property::FinalField, true.into())
        .unwrap();
    store
        .set(lib.items.into(), Property::NotNullField, NotNull::ContentNotNull.into())
        .unwrap();

    store
        .set(
            lib.full_ctor.into(),
            Property::GetSetEquivalent,
            GetSetEquivalent {
                convert_to_get_set: [0].into(),
                method: lib.empty_ctor,
            }
            .into(),
        )
        .unwrap();

    let add = lib.add.into();
    store.set(add, Property::ModifiedMethod, true.into()).unwrap();
    store
        .set(
            add,
            Property::CommutableMethods,
            CommutableData::new("add,remove", "size", "addAll").into(),
        )
        .unwrap();
    store
        .set(
            add,
            Property::GetSetField,
            FieldValue {
                field: lib.items,
                setter: true,
                parameter_index: Some(0),
            }
            .into(),
        )
        .unwrap();
    store
        .set(
            add,
            Property::ModifiedComponentsMethod,
            VariableBooleanMap::single(lib.items, true).into(),
        )
        .unwrap();

    let value = ParamRef {
        method: lib.add,
        index: 0,
    }
    .into();
    let links = Independent::with_links(1, BTreeMap::from([(-1, 0), (0, 1)])).unwrap();
    store
        .set(value, Property::IndependentParameter, links.into())
        .unwrap();
    store.mark_done(value);
    store
}

#[test]
fn stored_properties_survive_a_round_trip() {
    let lib = library("items");
    let store = analyzed(&lib);
    let entries = Encoder::new(&lib.graph, &store).encode_all(&[lib.store_ty]);
    assert_eq!(entries.len(), 1);
    let text = Encoder::to_json(&entries).unwrap();
    assert!(text.starts_with("[\n{\"name\":\"Torg.lib.Store\""));
    assert_eq!(text.lines().count(), 3);

    let fresh = library("items");
    let decoded = Decoder::new(&fresh.graph).decode_str(&text).unwrap();
    let mut loaded = AnalysisStore::new();
    codec::apply(decoded, &mut loaded).unwrap();
    assert_eq!(loaded, store);
    assert!(loaded.is_done(fresh.entry.into()));
    assert!(!loaded.is_done(fresh.add.into()));
}

#[test]
fn loaded_values_do_not_overwrite_existing_ones() {
    let lib = library("items");
    let store = analyzed(&lib);
    let text = Encoder::to_json(&Encoder::new(&lib.graph, &store).encode_all(&[lib.store_ty]))
        .unwrap();

    let mut target = AnalysisStore::new();
    target
        .set(lib.add.into(), Property::ModifiedMethod, false.into())
        .unwrap();
    let decoded = Decoder::new(&lib.graph).decode_str(&text).unwrap();
    let stored = codec::apply(decoded, &mut target).unwrap();
    assert!(stored > 0);
    assert_eq!(
        target.get(lib.add.into(), Property::ModifiedMethod),
        Some(&Value::Bool(false))
    );
    assert!(target.contains(lib.add.into(), Property::GetSetField));
}

#[test]
fn renamed_field_reference_is_rejected() {
    let lib = library("items");
    let store = analyzed(&lib);
    let text = Encoder::to_json(&Encoder::new(&lib.graph, &store).encode_all(&[lib.store_ty]))
        .unwrap();

    let renamed = library("elements");
    let err = Decoder::new(&renamed.graph).decode_str(&text).unwrap_err();
    assert!(
        matches!(
            &err,
            ShError::NameMismatch { expected, found, .. } if expected == "items" && found == "elements"
        ),
        "unexpected error {err}"
    );
}

#[test]
fn unknown_primary_type_is_rejected() {
    let lib = library("items");
    let text = r#"[
{"name":"Torg.lib.Missing","data":{"immutableType":3}}
]"#;
    let err = Decoder::new(&lib.graph).decode_str(text).unwrap_err();
    assert!(matches!(err, ShError::UnknownType { fqn } if fqn == "org.lib.Missing"));

    let text = r#"[{"name":"Torg.lib.Store","data":{"notAProperty":1}}]"#;
    let err = Decoder::new(&lib.graph).decode_str(text).unwrap_err();
    assert!(matches!(err, ShError::UnknownProperty { .. }));
}

#[test]
fn single_method_type_round_trips() {
    let build = || {
        let mut graph = DeclarationGraph::new();
        let ty = graph.add_type("org.lib", "Counter");
        let m = graph.add_method(ty, "increment", TypeRef::void());
        (graph, ty, m)
    };
    let (graph, ty, m) = build();
    let mut store = AnalysisStore::new();
    store.set(m.into(), Property::ModifiedMethod, true.into()).unwrap();
    store
        .set(
            m.into(),
            Property::CommutableMethods,
            CommutableData::new("increment", "get", "reset").into(),
        )
        .unwrap();
    let text = Encoder::to_json(&Encoder::new(&graph, &store).encode_all(&[ty])).unwrap();

    let (reloaded, _, _) = build();
    let mut decoded = AnalysisStore::new();
    codec::apply(
        Decoder::new(&reloaded).decode_str(&text).unwrap(),
        &mut decoded,
    )
    .unwrap();
    assert_eq!(decoded, store);
}
