use super::*;
use crate::app::Application;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ClassDef, ClassKind, FieldDef, MethodDef};
use crate::model::render_phase::RenderPhase;
use crate::transform::component_class::ComponentClass;

#[test]
fn names_drop_leading_markers() {
    assert_eq!(property_name("_value"), "value");
    assert_eq!(property_name("$$count"), "count");
    assert_eq!(property_name("plain"), "plain");
}

#[test]
fn pipeline_orders_workers_by_constraints() {
    let names = default_pipeline().unwrap().worker_names();
    let at = |name: &str| {
        names
            .iter()
            .position(|n| *n == name)
            .unwrap_or_else(|| panic!("{name} missing from {names:?}"))
    };
    assert_eq!(names.len(), 21);
    assert_eq!(names[0], "Property");
    assert_eq!(*names.last().unwrap(), "UnclaimedField");
    assert!(at("Meta") < at("Parameter"));
    assert!(at("Parameter") < at("BindParameter"));
    assert!(at("Persist") < at("SessionAttribute"));
    assert!(at("Inject") < at("Cached"));
    assert!(at("Log") < at("OnEvent"));
    assert!(at("OnEvent") < at("RenderPhase"));
    assert!(at("PageLifecycle") < at("PageReset"));
}

fn model_error(def: ClassDef) -> String {
    let name = def.name.clone();
    let app = Application::builder()
        .class(ComponentClass::descriptive(def))
        .build()
        .unwrap();
    app.model(&name).unwrap_err().to_string()
}

#[test]
fn annotations_nobody_understands_are_errors() {
    let err = model_error(
        ClassDef::new("pages.Index", ClassKind::Page).field(
            FieldDef::new("grid", ValueType::Any).with(Annotation::PageLoaded),
        ),
    );
    assert!(err.contains("not handled by any worker"), "{err}");
}

#[test]
fn render_phase_methods_only_take_a_writer() {
    let err = model_error(
        ClassDef::new("components.Box", ClassKind::Component)
            .method(MethodDef::new("beginRender").param("n", ValueType::Long)),
    );
    assert!(err.contains("may only take a MarkupWriter"), "{err}");

    let app = Application::builder()
        .class(ComponentClass::descriptive(
            ClassDef::new("components.Box", ClassKind::Component)
                .method(MethodDef::new("beginRender").param("writer", ValueType::MarkupWriter))
                .method(MethodDef::new("finish").with(Annotation::AfterRender)),
        ))
        .build()
        .unwrap();
    let model = app.model("components.Box").unwrap();
    assert!(model.handles_render_phase(RenderPhase::BeginRender));
    assert!(model.handles_render_phase(RenderPhase::AfterRender));
    assert!(!model.handles_render_phase(RenderPhase::SetupRender));
}

#[test]
fn lifecycle_methods_take_no_parameters() {
    let err = model_error(
        ClassDef::new("pages.Index", ClassKind::Page)
            .method(MethodDef::new("pageAttached").param("x", ValueType::Long)),
    );
    assert!(err.contains("may not take parameters"), "{err}");
}

#[test]
fn plain_fields_are_per_request_unless_static() {
    let app = Application::builder()
        .class(ComponentClass::new(
            ClassDef::new("pages.Index", ClassKind::Page)
                .field(FieldDef::new("count", ValueType::Long).initial(1i64))
                .field(FieldDef::new("shared", ValueType::Long).statik()),
        ))
        .build()
        .unwrap();
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();
    let request = || {
        app.request_context(
            std::sync::Arc::new(crate::runtime::request::TestRequest::new("/index")),
            std::sync::Arc::new(crate::runtime::request::MemorySession::new()),
        )
        .unwrap()
    };

    let mut rc = request();
    let mut ctx = crate::page::context::ComponentContext::new(&page, root, &mut rc);
    ctx.write_field("count", Value::Long(9)).unwrap();
    ctx.write_field("shared", Value::Long(4)).unwrap();
    assert_eq!(ctx.read_field("count").unwrap(), Value::Long(9));

    let mut rc = request();
    let mut ctx = crate::page::context::ComponentContext::new(&page, root, &mut rc);
    assert_eq!(ctx.read_field("count").unwrap(), Value::Long(1));
    assert_eq!(ctx.read_field("shared").unwrap(), Value::Long(4));
}
