use std::collections::BTreeMap;

use super::*;
use crate::app::Application;
use crate::foundation::ids::ElementIdx;
use crate::foundation::value::ValueType;
use crate::model::class_def::{Annotation, ClassDef, ClassKind, ComponentAnn, FieldDef, MethodDef};
use crate::runtime::request::{MemorySession, TestRequest};
use crate::transform::component_class::ComponentClass;

fn app() -> Application {
    let user: BTreeMap<String, Value> = [("name".to_string(), Value::from("Ada"))].into();
    let index = ComponentClass::new(
        ClassDef::new("pages.Index", ClassKind::Page)
            .field(FieldDef::new("user", ValueType::Map).initial(Value::Map(user)))
            .field(
                FieldDef::new("items", ValueType::List)
                    .initial(vec![Value::Long(1), Value::Long(2)]),
            )
            .field(FieldDef::new("hidden", ValueType::Str))
            .field(FieldDef::new("greeting", ValueType::Str).initial("field"))
            .field(FieldDef::new("answer", ValueType::Long))
            .field(
                FieldDef::new("child", ValueType::Object("Child".into()))
                    .with(Annotation::Component(ComponentAnn::default())),
            )
            .method(MethodDef::new("getGreeting").returns(ValueType::Str))
            .method(MethodDef::new("setAnswer").param("value", ValueType::Long)),
    )
    .body("getGreeting", |_ctx, _| Ok(Some(Value::from("hello"))))
    .body("setAnswer", |ctx, args| {
        let doubled = args.first().and_then(Value::as_long).unwrap_or_default() * 2;
        ctx.write_field("answer", Value::Long(doubled))?;
        Ok(None)
    });
    let child = ComponentClass::new(
        ClassDef::new("components.Child", ClassKind::Component)
            .field(FieldDef::new("label", ValueType::Str).initial("child label")),
    );
    Application::builder()
        .class(index)
        .class(child)
        .build()
        .unwrap()
}

fn request(app: &Application) -> RequestContext {
    app.request_context(
        Arc::new(TestRequest::new("/index")),
        Arc::new(MemorySession::new()),
    )
    .unwrap()
}

#[test]
fn property_paths_step_through_maps_lists_and_components() {
    let app = app();
    let page = app.page("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, page.locate("Index").unwrap(), &mut rc);

    assert_eq!(ctx.read_property("user.name").unwrap(), Value::from("Ada"));
    assert_eq!(ctx.read_property("user.missing").unwrap(), Value::Null);
    assert_eq!(ctx.read_property("items.1").unwrap(), Value::Long(2));
    assert_eq!(ctx.read_property("items.7").unwrap(), Value::Null);
    assert_eq!(ctx.read_property("child.label").unwrap(), Value::from("child label"));
}

#[test]
fn property_errors_name_the_problem() {
    let app = app();
    let page = app.page("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, page.locate("Index").unwrap(), &mut rc);

    let err = ctx.read_property("items.x").unwrap_err().to_string();
    assert!(err.contains("not a list index"), "{err}");
    let err = ctx.read_property("hidden.length").unwrap_err().to_string();
    assert!(err.contains("read from a null value"), "{err}");
    let err = ctx.read_property("answer.sign").unwrap_err().to_string();
    assert!(err.contains("a long has no property 'sign'"), "{err}");
    let err = ctx.read_property("nope").unwrap_err().to_string();
    assert!(err.contains("does not contain a property named 'nope'"), "{err}");
    let err = ctx
        .write_property("user.name", Value::from("Bob"))
        .unwrap_err()
        .to_string();
    assert!(err.contains("only the last segment"), "{err}");
}

#[test]
fn accessor_methods_take_precedence_over_fields() {
    let app = app();
    let page = app.page("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, page.locate("Index").unwrap(), &mut rc);

    assert_eq!(ctx.read_property("greeting").unwrap(), Value::from("hello"));
    assert_eq!(ctx.read_field("greeting").unwrap(), Value::from("field"));

    ctx.write_property("answer", Value::Long(21)).unwrap();
    assert_eq!(ctx.read_field("answer").unwrap(), Value::Long(42));

    ctx.write_property("child.label", Value::from("renamed")).unwrap();
    assert_eq!(ctx.read_property("child.label").unwrap(), Value::from("renamed"));
}

#[test]
fn handles_and_locators_follow_the_page_tree() {
    let app = app();
    let page = app.page("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, page.locate("Index").unwrap(), &mut rc);

    assert_eq!(ctx.complete_id(), "Index");
    assert_eq!(ctx.container_locator(), None);
    let handle = ctx.child_handle("CHILD").unwrap();
    assert_eq!(handle.complete_id, "Index:child");
    assert!(ctx.child_handle("other").is_err());
    assert!(ctx.mixin_handle("Zebra").is_err());
    let err = ctx.invoke("missing", Vec::new()).unwrap_err().to_string();
    assert!(err.contains("no method 'missing'"), "{err}");

    let child = ctx.for_handle(&handle).unwrap();
    assert_eq!(child.complete_id(), "Index:child");
    assert_eq!(
        child.container_locator(),
        Some(InstanceLocator::core(ElementIdx::ROOT))
    );
    assert!(!child.is_rendering());
}

#[test]
fn capitalize_handles_empty_and_unicode() {
    assert_eq!(capitalize(""), "");
    assert_eq!(capitalize("value"), "Value");
    assert_eq!(capitalize("élan"), "Élan");
}
