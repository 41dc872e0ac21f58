use imdecl::{
    AnalysisStore, Declaration, DeclarationGraph, Property, PropertyMap,
    decl::TypeRef,
    utils::Error,
    value::{CommutableData, Immutable, Independent, Value},
};

#[test]
fn property_map_is_set_once() {
    let mut map = PropertyMap::new();
    map.set(Property::ImmutableType, Immutable::ImmutableHc.into())
        .unwrap();
    // same value again is accepted
    map.set(Property::ImmutableType, Immutable::ImmutableHc.into())
        .unwrap();
    let err = map
        .set(Property::ImmutableType, Immutable::Immutable.into())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ValueOverwrite {
            property: Property::ImmutableType,
            ..
        }
    ));
    assert_eq!(
        map.get_or(Property::ImmutableType, Immutable::Mutable),
        Immutable::ImmutableHc
    );
}

#[test]
fn absent_values_fall_back_to_caller_default() {
    let map = PropertyMap::new();
    assert_eq!(
        map.get_or(Property::IndependentType, Independent::INDEPENDENT_HC),
        Independent::INDEPENDENT_HC
    );
    assert!(!map.get_or(Property::ContainerType, false));
    assert!(map.get(Property::ContainerType).is_none());
}

#[test]
fn value_kind_must_match_property() {
    let mut map = PropertyMap::new();
    let err = map
        .set(Property::ImmutableType, Value::Bool(true))
        .unwrap_err();
    assert!(err.is_value_kind_mismatch());
}

#[test]
fn set_if_absent_keeps_existing_value() {
    let mut map = PropertyMap::new();
    assert!(map
        .set_if_absent(Property::CommutableMethods, CommutableData::new("a", "", "").into())
        .unwrap());
    assert!(!map
        .set_if_absent(Property::CommutableMethods, CommutableData::default().into())
        .unwrap());
    assert_eq!(
        map.get_typed::<CommutableData>(Property::CommutableMethods),
        Some(&CommutableData::new("a", "", ""))
    );
}

#[test]
fn store_rejects_properties_of_other_kinds() {
    let mut graph = DeclarationGraph::new();
    let ty = graph.add_type("org.x", "A");
    let method = graph.add_method(ty, "get", TypeRef::string());

    let mut store = AnalysisStore::new();
    let err = store
        .set(
            Declaration::Method(method),
            Property::ImmutableType,
            Immutable::Immutable.into(),
        )
        .unwrap_err();
    assert!(err.is_illegal_property());
    store
        .set(
            Declaration::Type(ty),
            Property::Message,
            Value::Message("note".into()),
        )
        .unwrap();
    assert!(store.contains(Declaration::Type(ty), Property::Message));
}

#[test]
fn analysis_state_is_separate_from_values() {
    let mut store = AnalysisStore::new();
    let mut graph = DeclarationGraph::new();
    let decl = Declaration::Type(graph.add_type("org.x", "A"));
    assert!(!store.is_done(decl));
    store.mark_done(decl);
    assert!(store.is_done(decl));
    assert!(store.map(decl).is_some_and(PropertyMap::is_empty));
}
