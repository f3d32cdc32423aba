use super::*;
use crate::app::Application;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{
    Annotation, ClassDef, ComponentAnn, FieldDef, MethodDef, ParameterAnn,
};
use crate::transform::component_class::ComponentClass;

fn layout() -> ComponentClass {
    ComponentClass::new(ClassDef::new("components.Layout", ClassKind::Component)).template(vec![
        NodeSpec::element(
            "nav",
            &[],
            vec![NodeSpec::component(ElementSpec::id("menu").with_type("Any"))],
        ),
        NodeSpec::Body,
    ])
}

fn highlight() -> ComponentClass {
    ComponentClass::new(
        ClassDef::new("mixins.Highlight", ClassKind::Mixin).field(
            FieldDef::new("color", ValueType::Str).with(Annotation::Parameter(ParameterAnn {
                default_prefix: Some("literal".into()),
                ..ParameterAnn::default()
            })),
        ),
    )
}

fn trailer() -> ComponentClass {
    ComponentClass::new(
        ClassDef::new("mixins.Trailer", ClassKind::Mixin).with(Annotation::MixinAfter),
    )
}

fn page(template: Vec<NodeSpec>) -> ComponentClass {
    ComponentClass::new(ClassDef::new("pages.Index", ClassKind::Page)).template(template)
}

fn build(classes: Vec<ComponentClass>) -> TapestryResult<Arc<Page>> {
    let app = Application::builder()
        .classes([layout(), highlight(), trailer()])
        .classes(classes)
        .build()?;
    app.page("Index")
}

fn load_error(classes: Vec<ComponentClass>) -> String {
    match build(classes) {
        Ok(page) => panic!("expected {page:?} to fail"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn ids_nest_through_component_templates() {
    let page = build(vec![page(vec![NodeSpec::component(
        ElementSpec::id("layout")
            .with_type("Layout")
            .body(vec![NodeSpec::component(ElementSpec::id("content").with_type("Any"))]),
    )])])
    .unwrap();

    let ids: Vec<&str> = page.elements().map(|(_, e)| e.complete_id.as_str()).collect();
    assert_eq!(ids, vec!["Index", "Index:layout", "Index:content", "Index:layout.menu"]);

    let layout = page.element(page.element_by_nested_id("layout").unwrap()).unwrap();
    assert_eq!(layout.container, Some(ElementIdx::ROOT));
    assert_eq!(layout.body.len(), 1);
    // Body components belong to the template that contains them.
    let content = page.element(page.element_by_nested_id("CONTENT").unwrap()).unwrap();
    assert_eq!(content.container, Some(ElementIdx::ROOT));
}

#[test]
fn anonymous_elements_get_ids_from_their_type() {
    let page = build(vec![page(vec![
        NodeSpec::component(ElementSpec::of_type("Any")),
        NodeSpec::component(ElementSpec::of_type("core/Any")),
    ])])
    .unwrap();
    let ids: Vec<&str> = page.elements().skip(1).map(|(_, e)| e.id.as_str()).collect();
    assert_eq!(ids, vec!["any", "any_0"]);
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = load_error(vec![page(vec![
        NodeSpec::component(ElementSpec::id("box").with_type("Any")),
        NodeSpec::component(ElementSpec::id("Box").with_type("Any")),
    ])]);
    assert!(err.contains("used more than once"), "{err}");
}

#[test]
fn declared_and_template_types_must_agree() {
    let class = ComponentClass::new(
        ClassDef::new("pages.Index", ClassKind::Page).field(
            FieldDef::new("box", ValueType::Object("Any".into()))
                .with(Annotation::Component(ComponentAnn::default())),
        ),
    )
    .template(vec![NodeSpec::component(
        ElementSpec::id("box").with_type("Layout"),
    )]);
    let err = load_error(vec![class]);
    assert!(err.contains("declared with type Any but the template gives type Layout"), "{err}");
}

#[test]
fn declared_components_must_appear_in_the_template() {
    let class = ComponentClass::new(
        ClassDef::new("pages.Index", ClassKind::Page).field(
            FieldDef::new("box", ValueType::Object("Any".into()))
                .with(Annotation::Component(ComponentAnn::default())),
        ),
    )
    .template(vec![NodeSpec::text("nothing here")]);
    let err = load_error(vec![class]);
    assert!(err.contains("not present in its template"), "{err}");
}

#[test]
fn elements_need_a_type() {
    let err = load_error(vec![page(vec![NodeSpec::component(ElementSpec::id("box"))])]);
    assert!(err.contains("has no type"), "{err}");
    let err = load_error(vec![page(vec![NodeSpec::component(ElementSpec::default())])]);
    assert!(err.contains("neither an id nor a type"), "{err}");
    let err = load_error(vec![page(vec![NodeSpec::component(ElementSpec::of_type("Trailer"))])]);
    assert!(err.contains("unknown component type 'Trailer'"), "{err}");
}

#[test]
fn mixins_order_participants_and_receive_parameters() {
    let page = build(vec![page(vec![NodeSpec::component(
        ElementSpec::id("box")
            .with_type("Any")
            .mixin("Trailer")
            .mixin("Highlight")
            .param("highlight.color", "red")
            .param("title", "Box"),
    )])])
    .unwrap();
    let idx = page.element_by_nested_id("box").unwrap();
    let element = page.element(idx).unwrap();
    let mixin_ids: Vec<&str> = element.mixins.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(mixin_ids, vec!["Trailer", "Highlight"]);
    // Regular mixins run before the core, MixinAfter mixins after it.
    let highlight = InstanceLocator::mixin(idx, 1);
    let trailer = InstanceLocator::mixin(idx, 0);
    assert_eq!(
        element.participants.as_slice(),
        &[highlight, InstanceLocator::core(idx), trailer]
    );
    assert_eq!(page.locate("Index:box$highlight").unwrap(), highlight);
    assert_eq!(
        page.instance(highlight).unwrap().resources().complete_id,
        "Index:box$Highlight"
    );

    let mixin = page.instance(highlight).unwrap().resources();
    assert!(mixin.is_bound("color"));
    let core = element.core.resources();
    assert!(core.is_bound("title"));
    assert!(!core.is_bound("color"));
}

#[test]
fn unknown_parameters_need_informal_support() {
    let err = load_error(vec![page(vec![NodeSpec::component(
        ElementSpec::id("layout").with_type("Layout").param("title", "x"),
    )])]);
    assert!(err.contains("does not support informal parameters"), "{err}");

    let err = load_error(vec![page(vec![NodeSpec::component(
        ElementSpec::id("box").with_type("Any").param("zebra.color", "x"),
    )])]);
    assert!(err.contains("no mixin 'zebra'"), "{err}");
}

#[test]
fn inherited_bindings_come_from_the_container() {
    let panel = ComponentClass::new(
        ClassDef::new("components.Panel", ClassKind::Component).field(
            FieldDef::new("heading", ValueType::Str)
                .with(Annotation::Parameter(ParameterAnn::default())),
        ),
    )
    .template(vec![
        NodeSpec::component(
            ElementSpec::id("title").with_type("Any").param("element", "inherit:heading"),
        ),
        NodeSpec::component(
            ElementSpec::id("other").with_type("Any").param("element", "inherit:missing"),
        ),
    ]);
    let page = build(vec![
        panel,
        page(vec![NodeSpec::component(
            ElementSpec::id("panel").with_type("Panel").param("heading", "literal:h2"),
        )]),
    ])
    .unwrap();
    let panel = page.element(page.element_by_nested_id("panel").unwrap()).unwrap();
    let title = page.element(page.element_by_nested_id("panel.title").unwrap()).unwrap();
    let inherited = title.core.resources().binding("element").unwrap();
    assert!(Arc::ptr_eq(
        &inherited,
        &panel.core.resources().binding("heading").unwrap()
    ));
    // An unbound inherited parameter leaves the default in place.
    let other = page.element(page.element_by_nested_id("panel.other").unwrap()).unwrap();
    assert!(other.core.resources().binding("element").unwrap().is_invariant());
}

#[test]
fn handlers_must_name_embedded_components() {
    let class = ComponentClass::new(
        ClassDef::new("pages.Index", ClassKind::Page)
            .method(MethodDef::new("onActionFromMissing")),
    )
    .body("onActionFromMissing", |_ctx, _| Ok(Some(Value::Bool(true))));
    let err = load_error(vec![class]);
    assert!(err.contains("no component with that id"), "{err}");
}

#[test]
fn only_page_classes_assemble() {
    let app = Application::builder().class(layout()).build().unwrap();
    let err = PageAssembler::new(app.registry())
        .assemble("components.Layout")
        .unwrap_err()
        .to_string();
    assert!(err.contains("is not a page class"), "{err}");
}
