use super::*;
use crate::app::Application;
use crate::foundation::ids::InstanceLocator;
use crate::model::class_def::{ClassDef, ClassKind, FieldDef, MethodDef};
use crate::page::template::{ElementSpec, NodeSpec};
use crate::page::tree::Page;
use crate::runtime::context::RequestContext;
use crate::runtime::request::{MemorySession, TestRequest};
use crate::transform::component_class::ComponentClass;

fn title_parameter(ann: ParameterAnn) -> FieldDef {
    FieldDef::new("title", ValueType::Str).with(Annotation::Parameter(ann))
}

fn child(field: FieldDef) -> ComponentClass {
    ComponentClass::new(ClassDef::new("components.Child", ClassKind::Component).field(field))
}

fn index(page_fields: Vec<FieldDef>, element: ElementSpec) -> ComponentClass {
    let mut def = ClassDef::new("pages.Index", ClassKind::Page);
    for field in page_fields {
        def = def.field(field);
    }
    ComponentClass::new(def).template(vec![NodeSpec::component(element)])
}

fn app(classes: Vec<ComponentClass>) -> crate::foundation::error::TapestryResult<Application> {
    Application::builder().classes(classes).build()
}

fn context(app: &Application) -> RequestContext {
    app.request_context(
        Arc::new(TestRequest::new("/index")),
        Arc::new(MemorySession::new()),
    )
    .unwrap()
}

fn read_title(app: &Application, rc: &mut RequestContext) -> TapestryResult<Value> {
    let page: Arc<Page> = app.page("Index")?;
    let locator: InstanceLocator = page.locate("Index:child")?;
    ComponentContext::new(&page, locator, rc).read_parameter("title")
}

#[test]
fn template_binding_wins_and_uses_the_default_prefix() {
    let app = app(vec![
        child(title_parameter(ParameterAnn {
            default_prefix: Some("literal".into()),
            value: Some("fallback".into()),
            ..ParameterAnn::default()
        })),
        index(
            Vec::new(),
            ElementSpec::id("child").with_type("Child").param("title", "Bound"),
        ),
    ])
    .unwrap();
    let mut rc = context(&app);
    assert_eq!(read_title(&app, &mut rc).unwrap(), Value::from("Bound"));
}

#[test]
fn declared_default_applies_when_nothing_is_bound() {
    let app = app(vec![
        child(title_parameter(ParameterAnn {
            default_prefix: Some("literal".into()),
            value: Some("fallback".into()),
            ..ParameterAnn::default()
        })),
        index(Vec::new(), ElementSpec::id("child").with_type("Child")),
    ])
    .unwrap();
    let mut rc = context(&app);
    assert_eq!(read_title(&app, &mut rc).unwrap(), Value::from("fallback"));
}

#[test]
fn autoconnect_reads_the_container_property() {
    let app = app(vec![
        child(title_parameter(ParameterAnn {
            autoconnect: true,
            ..ParameterAnn::default()
        })),
        index(
            vec![FieldDef::new("title", ValueType::Str).initial("From page")],
            ElementSpec::id("child").with_type("Child"),
        ),
    ])
    .unwrap();
    let mut rc = context(&app);
    assert_eq!(read_title(&app, &mut rc).unwrap(), Value::from("From page"));
}

#[test]
fn default_method_is_the_last_resort() {
    let class = ComponentClass::new(
        ClassDef::new("components.Child", ClassKind::Component)
            .field(title_parameter(ParameterAnn {
                autoconnect: true,
                ..ParameterAnn::default()
            }))
            .method(MethodDef::new("defaultTitle").returns(ValueType::Str)),
    )
    .body("defaultTitle", |_ctx, _| Ok(Some(Value::from("computed"))));
    let app = app(vec![
        class,
        index(Vec::new(), ElementSpec::id("child").with_type("Child")),
    ])
    .unwrap();
    let mut rc = context(&app);
    assert_eq!(read_title(&app, &mut rc).unwrap(), Value::from("computed"));
}

#[test]
fn required_parameter_must_be_bound() {
    let err = app(vec![
        child(title_parameter(ParameterAnn {
            required: true,
            ..ParameterAnn::default()
        })),
        index(Vec::new(), ElementSpec::id("child").with_type("Child")),
    ])
    .and_then(|app| app.page("Index").map(|_| ()))
    .unwrap_err()
    .to_string();
    assert!(err.contains("required but has not been bound"), "{err}");
}

#[test]
fn required_parameter_may_not_declare_a_default() {
    let app = app(vec![child(title_parameter(ParameterAnn {
        required: true,
        value: Some("x".into()),
        ..ParameterAnn::default()
    }))])
    .unwrap();
    let err = app.model("components.Child").unwrap_err().to_string();
    assert!(err.contains("also declares a default value"), "{err}");
}

#[test]
fn primitive_parameters_never_allow_null() {
    let app = app(vec![ComponentClass::new(
        ClassDef::new("components.Counter", ClassKind::Component)
            .field(
                FieldDef::new("_count", ValueType::Long)
                    .with(Annotation::Parameter(ParameterAnn::default())),
            )
            .field(
                FieldDef::new("label", ValueType::Str)
                    .with(Annotation::Parameter(ParameterAnn::default())),
            ),
    )])
    .unwrap();
    let model = app.model("components.Counter").unwrap();
    assert!(!model.parameter("count").unwrap().allow_null);
    assert!(model.parameter("label").unwrap().allow_null);
    assert_eq!(model.parameter("LABEL").unwrap().default_prefix, "prop");
}

#[test]
fn null_is_rejected_when_not_allowed() {
    let app = app(vec![
        child(title_parameter(ParameterAnn {
            allow_null: false,
            ..ParameterAnn::default()
        })),
        index(
            vec![FieldDef::new("missing", ValueType::Str)],
            ElementSpec::id("child").with_type("Child").param("title", "missing"),
        ),
    ])
    .unwrap();
    let mut rc = context(&app);
    let err = read_title(&app, &mut rc).unwrap_err().to_string();
    assert!(err.contains("does not allow null"), "{err}");
}

#[test]
fn writes_to_an_unbound_parameter_last_for_the_request() {
    let app = app(vec![
        child(title_parameter(ParameterAnn::default())),
        index(Vec::new(), ElementSpec::id("child").with_type("Child")),
    ])
    .unwrap();
    let page = app.page("Index").unwrap();
    let locator = page.locate("Index:child").unwrap();

    let mut rc = context(&app);
    let mut ctx = ComponentContext::new(&page, locator, &mut rc);
    assert_eq!(ctx.read_parameter("title").unwrap(), Value::Null);
    ctx.write_parameter("title", Value::Long(5)).unwrap();
    assert_eq!(ctx.read_parameter("title").unwrap(), Value::from("5"));

    let mut rc = context(&app);
    assert_eq!(read_title(&app, &mut rc).unwrap(), Value::Null);
}

#[test]
fn writes_through_a_property_binding_reach_the_container() {
    let app = app(vec![
        child(title_parameter(ParameterAnn::default())),
        index(
            vec![FieldDef::new("heading", ValueType::Str).initial("old")],
            ElementSpec::id("child").with_type("Child").param("title", "heading"),
        ),
    ])
    .unwrap();
    let page = app.page("Index").unwrap();
    let locator = page.locate("Index:child").unwrap();
    let mut rc = context(&app);
    let mut ctx = ComponentContext::new(&page, locator, &mut rc);
    ctx.write_parameter("title", Value::from("new")).unwrap();
    let mut root = ctx.at(InstanceLocator::core(crate::foundation::ids::ElementIdx::ROOT));
    assert_eq!(root.read_field("heading").unwrap(), Value::from("new"));
}

#[test]
fn bind_parameter_is_restricted_to_mixins() {
    let app = app(vec![ComponentClass::new(
        ClassDef::new("components.Odd", ClassKind::Component).field(
            FieldDef::new("value", ValueType::Any)
                .with(Annotation::BindParameter { value: Vec::new() }),
        ),
    )])
    .unwrap();
    let err = app.model("components.Odd").unwrap_err().to_string();
    assert!(err.contains("only be used in mixin classes"), "{err}");
}
