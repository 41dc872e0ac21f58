use imcore::{
    analyzer::ShallowAnalyzer,
    provider::{DeclaredMarkers, MarkerMap},
};
use imdecl::{
    AnalysisStore, Declaration, DeclarationGraph, Marker, MarkerKind, ParamRef, Property, TypeId,
    Value,
    decl::{Modifiers, Primitive, TypeNature, TypeRef},
    value::{GetSetEquivalent, Immutable, Independent, NotNull},
};

fn analyze(graph: &DeclarationGraph, roots: &[TypeId]) -> (AnalysisStore, usize) {
    let mut store = AnalysisStore::new();
    let mut analyzer = ShallowAnalyzer::new(graph, &DeclaredMarkers);
    analyzer.go(roots, &mut store).expect("analysis succeeds");
    (store, analyzer.diagnostics().len())
}

fn immutable_of(store: &AnalysisStore, ty: TypeId) -> Option<Immutable> {
    store
        .get_typed::<Immutable>(ty.into(), Property::ImmutableType)
        .copied()
}

fn independent_of(store: &AnalysisStore, ty: TypeId) -> Option<Independent> {
    store
        .get_typed::<Independent>(ty.into(), Property::IndependentType)
        .cloned()
}

#[test]
fn utility_class_is_immutable_and_independent() {
    let mut graph = DeclarationGraph::new();
    let util = graph.add_type("org.example", "MathUtil");
    graph
        .ty_mut(util)
        .markers
        .push(Marker::new(MarkerKind::UtilityClass));
    let max = graph.add_method(util, "max", TypeRef::primitive(Primitive::Int));
    graph.method_mut(max).modifiers = Modifiers::STATIC;
    graph.add_parameter(max, "a", TypeRef::primitive(Primitive::Int));
    graph.add_parameter(max, "b", TypeRef::primitive(Primitive::Int));

    let (store, diagnostics) = analyze(&graph, &[util]);
    assert_eq!(immutable_of(&store, util), Some(Immutable::Immutable));
    assert_eq!(independent_of(&store, util), Some(Independent::INDEPENDENT));
    assert!(!store.contains(util.into(), Property::ContainerType));
    assert!(!store.get_or(max.into(), Property::ModifiedMethod, true));
    assert_eq!(diagnostics, 0);
}

#[test]
fn extensible_immutable_type_is_downgraded() {
    let mut graph = DeclarationGraph::new();
    let open = graph.add_type("p", "Open");
    let sealed = graph.add_type("p", "Closed");
    graph.ty_mut(sealed).modifiers = Modifiers::FINAL;
    for ty in [open, sealed] {
        graph
            .ty_mut(ty)
            .markers
            .push(Marker::new(MarkerKind::Immutable));
    }

    let (store, diagnostics) = analyze(&graph, &[open, sealed]);
    assert_eq!(immutable_of(&store, open), Some(Immutable::ImmutableHc));
    assert_eq!(independent_of(&store, open), Some(Independent::INDEPENDENT_HC));
    assert_eq!(immutable_of(&store, sealed), Some(Immutable::Immutable));
    assert_eq!(independent_of(&store, sealed), Some(Independent::INDEPENDENT));
    assert_eq!(diagnostics, 0);
}

#[test]
fn primitive_signatures_inherit_independence() {
    let mut graph = DeclarationGraph::new();
    let base = graph.add_type("p", "Base");
    graph
        .ty_mut(base)
        .markers
        .push(Marker::new(MarkerKind::Independent));
    let counter = graph.add_type("p", "Counter");
    graph.ty_mut(counter).parent = Some(TypeRef::class("p.Base"));
    graph.add_method(counter, "get", TypeRef::primitive(Primitive::Int));
    let add = graph.add_method(counter, "add", TypeRef::void());
    graph.add_parameter(add, "delta", TypeRef::primitive(Primitive::Int));
    graph.add_method(counter, "name", TypeRef::string());

    let holder = graph.add_type("p", "Holder");
    graph.ty_mut(holder).parent = Some(TypeRef::class("p.Base"));
    graph.add_method(holder, "items", TypeRef::class("java.util.List"));

    let (store, diagnostics) = analyze(&graph, &[counter, holder]);
    assert_eq!(independent_of(&store, base), Some(Independent::INDEPENDENT));
    assert_eq!(independent_of(&store, counter), Some(Independent::INDEPENDENT));
    assert_eq!(independent_of(&store, holder), Some(Independent::DEPENDENT));
    assert_eq!(immutable_of(&store, counter), Some(Immutable::Mutable));
    assert_eq!(diagnostics, 0);
}

#[test]
fn constructor_equivalence_picks_the_absorbing_constructor() {
    let mut graph = DeclarationGraph::new();
    let ty = graph.add_type("p", "Point");
    let full = graph.add_constructor(ty);
    graph.add_parameter(full, "a", TypeRef::string());
    graph.add_parameter(full, "b", TypeRef::primitive(Primitive::Int));
    graph.add_parameter(full, "c", TypeRef::primitive(Primitive::Boolean));
    graph
        .method_mut(full)
        .markers
        .push(Marker::new(MarkerKind::GetSet));
    let short = graph.add_constructor(ty);
    graph.add_parameter(short, "a", TypeRef::string());

    let expected = Value::GetSetEquivalent(GetSetEquivalent {
        convert_to_get_set: [1, 2].into(),
        method: short,
    });
    for _ in 0..2 {
        let (store, diagnostics) = analyze(&graph, &[ty]);
        assert_eq!(
            store.get(full.into(), Property::GetSetEquivalent),
            Some(&expected)
        );
        assert!(!store.contains(short.into(), Property::GetSetEquivalent));
        assert_eq!(diagnostics, 0);
    }
}

#[test]
fn immutable_type_below_mutable_parent_is_reported_once() {
    let mut graph = DeclarationGraph::new();
    let parent = graph.add_type("p", "P");
    let child = graph.add_type("p", "X");
    graph.ty_mut(child).parent = Some(TypeRef::class("p.P"));
    graph
        .ty_mut(child)
        .markers
        .push(Marker::new(MarkerKind::Immutable).with("hc", true));

    let mut store = AnalysisStore::new();
    let mut analyzer = ShallowAnalyzer::new(&graph, &DeclaredMarkers);
    let sorted = analyzer.go(&[child], &mut store).unwrap();
    assert_eq!(sorted, vec![parent, child]);

    assert_eq!(analyzer.diagnostics().len(), 1);
    let diagnostic = analyzer.diagnostics().iter().next().unwrap();
    assert_eq!(diagnostic.decl, Some(Declaration::Type(child)));
    assert!(diagnostic.text.contains("MUTABLE"));
    assert_eq!(immutable_of(&store, child), Some(Immutable::ImmutableHc));
    assert_eq!(immutable_of(&store, parent), Some(Immutable::Mutable));
    assert!(matches!(
        store.get(child.into(), Property::Message),
        Some(Value::Message(text)) if *text == diagnostic.text
    ));
}

#[test]
fn modification_defaults_follow_the_markers_of_the_type() {
    let mut graph = DeclarationGraph::new();
    let bag = graph.add_type("p", "Bag");
    let add = graph.add_method(bag, "add", TypeRef::void());
    let item = graph.add_parameter(add, "item", TypeRef::string());
    let add_all = graph.add_method(bag, "addAll", TypeRef::void());
    let items = graph.add_parameter(add_all, "items", TypeRef::class("java.util.List"));
    let size = graph.add_method(bag, "size", TypeRef::primitive(Primitive::Int));
    graph
        .method_mut(size)
        .markers
        .push(Marker::new(MarkerKind::NotModified));
    let is_empty = graph.add_method(bag, "isEmpty", TypeRef::primitive(Primitive::Boolean));
    let first = graph.add_method(bag, "first", TypeRef::string());

    let (store, diagnostics) = analyze(&graph, &[bag]);
    assert_eq!(diagnostics, 0);
    assert!(store.get_or(add.into(), Property::ModifiedMethod, false));
    assert!(store.get_or(add_all.into(), Property::ModifiedMethod, false));
    assert!(!store.get_or(size.into(), Property::ModifiedMethod, true));
    // an explicit @NotModified turns the default of the other methods around
    assert!(store.get_or(is_empty.into(), Property::ModifiedMethod, false));
    assert!(store.get_or(first.into(), Property::ModifiedMethod, false));

    assert_eq!(
        store.get_or(size.into(), Property::NotNullMethod, NotNull::Nullable),
        NotNull::NotNull
    );
    assert_eq!(
        store.get_or(first.into(), Property::NotNullMethod, NotNull::NotNull),
        NotNull::Nullable
    );
    assert!(store.get_or(size.into(), Property::ContainerMethod, false));
    assert!(!store.contains(add.into(), Property::NotNullMethod));

    assert!(!store.get_or(item.into(), Property::ModifiedParameter, true));
    assert!(!store.get_or(items.into(), Property::ModifiedParameter, true));
    assert_eq!(
        store.get_or(item.into(), Property::IndependentParameter, Independent::DEPENDENT),
        Independent::INDEPENDENT
    );
    assert_eq!(
        store.get_or(items.into(), Property::IndependentParameter, Independent::INDEPENDENT),
        Independent::DEPENDENT
    );
    assert_eq!(
        store.get_or(item.into(), Property::ImmutableParameter, Immutable::Mutable),
        Immutable::Immutable
    );
}

#[test]
fn mixing_modification_markers_is_reported() {
    let mut graph = DeclarationGraph::new();
    let ty = graph.add_type("p", "Mixed");
    let read = graph.add_method(ty, "read", TypeRef::primitive(Primitive::Int));
    let write = graph.add_method(ty, "write", TypeRef::primitive(Primitive::Int));
    let other = graph.add_method(ty, "other", TypeRef::primitive(Primitive::Int));

    let mut markers = MarkerMap::new();
    markers.insert(read.into(), vec![Marker::new(MarkerKind::NotModified)]);
    markers.insert(write.into(), vec![Marker::new(MarkerKind::Modified)]);

    let mut store = AnalysisStore::new();
    let mut analyzer = ShallowAnalyzer::new(&graph, &markers);
    analyzer.go(&[ty], &mut store).unwrap();
    assert_eq!(analyzer.diagnostics().about(ty.into()).count(), 1);
    assert!(store.get_or(write.into(), Property::ModifiedMethod, false));
    assert!(!store.get_or(read.into(), Property::ModifiedMethod, true));
    assert!(store.get_or(other.into(), Property::ModifiedMethod, false));
}

#[test]
fn overriding_methods_inherit_from_the_supertype() {
    let mut graph = DeclarationGraph::new();
    let api = graph.add_type("p", "Api");
    graph.ty_mut(api).nature = TypeNature::Interface;
    let with = graph.add_method(api, "with", TypeRef::class("p.Api"));
    graph.add_parameter(with, "key", TypeRef::string());
    graph
        .method_mut(with)
        .markers
        .push(Marker::new(MarkerKind::Fluent));
    let get = graph.add_method(api, "get", TypeRef::class("java.lang.Object"));
    graph
        .method_mut(get)
        .markers
        .push(Marker::new(MarkerKind::NotNull));

    let imp = graph.add_type("p", "Impl");
    graph.ty_mut(imp).interfaces.push(TypeRef::class("p.Api"));
    let imp_with = graph.add_method(imp, "with", TypeRef::class("p.Impl"));
    graph.add_parameter(imp_with, "key", TypeRef::string());
    let imp_get = graph.add_method(imp, "get", TypeRef::class("java.lang.Object"));

    let (store, _) = analyze(&graph, &[imp]);
    assert!(store.get_or(with.into(), Property::FluentMethod, false));
    assert!(store.get_or(imp_with.into(), Property::FluentMethod, false));
    assert!(store.get_or(imp_with.into(), Property::ModifiedMethod, false));
    assert_eq!(
        store.get_or(imp_get.into(), Property::NotNullMethod, NotNull::Nullable),
        NotNull::NotNull
    );
    assert!(store.is_done(
        ParamRef {
            method: imp_with,
            index: 0
        }
        .into()
    ));
}

#[test]
fn second_run_changes_nothing() {
    let mut graph = DeclarationGraph::new();
    let base = graph.add_type("p", "Base");
    let ty = graph.add_type("p", "Value");
    graph.ty_mut(ty).parent = Some(TypeRef::class("p.Base"));
    graph.ty_mut(ty).modifiers = Modifiers::FINAL;
    graph
        .ty_mut(ty)
        .markers
        .push(Marker::new(MarkerKind::ImmutableContainer));
    let field = graph.add_field(ty, "value", TypeRef::primitive(Primitive::Long));
    graph.field_mut(field).modifiers = Modifiers::FINAL;
    graph.add_method(ty, "value", TypeRef::primitive(Primitive::Long));

    let mut store = AnalysisStore::new();
    ShallowAnalyzer::new(&graph, &DeclaredMarkers)
        .go(&[ty], &mut store)
        .unwrap();
    let first = store.clone();
    assert!(store.is_done(base.into()));
    assert!(store.get_or(field.into(), Property::FinalField, false));

    ShallowAnalyzer::new(&graph, &DeclaredMarkers)
        .go(&[ty], &mut store)
        .unwrap();
    assert_eq!(store, first);
}
