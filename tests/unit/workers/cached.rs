use super::*;
use crate::app::Application;
use crate::foundation::value::ValueType;
use crate::model::class_def::{ClassDef, ClassKind, FieldDef, MethodDef};
use crate::page::context::ComponentContext;
use crate::runtime::context::RequestContext;
use crate::runtime::request::{MemorySession, TestRequest};
use crate::transform::component_class::ComponentClass;

fn totals_app(watch: Option<&str>) -> Application {
    let def = ClassDef::new("pages.Index", ClassKind::Page)
        .field(FieldDef::new("calls", ValueType::Long).statik())
        .field(FieldDef::new("filter", ValueType::Any))
        .method(
            MethodDef::new("getTotal")
                .returns(ValueType::Long)
                .with(Annotation::Cached {
                    watch: watch.map(str::to_string),
                }),
        );
    let class = ComponentClass::new(def).body("getTotal", |ctx, _| {
        let calls = ctx.read_field("calls")?.as_long().unwrap_or(0) + 1;
        ctx.write_field("calls", Value::Long(calls))?;
        Ok(Some(Value::Long(calls)))
    });
    Application::builder().class(class).build().unwrap()
}

fn request(app: &Application) -> RequestContext {
    app.request_context(
        Arc::new(TestRequest::new("/index")),
        Arc::new(MemorySession::new()),
    )
    .unwrap()
}

fn total(ctx: &mut ComponentContext<'_>) -> TapestryResult<Option<Value>> {
    ctx.invoke("getTotal", Vec::new())
}

#[test]
fn result_is_kept_for_the_rest_of_the_request() {
    let app = totals_app(None);
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();

    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, root, &mut rc);
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(1)));
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(1)));

    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, root, &mut rc);
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(2)));
    assert_eq!(ctx.read_field("calls").unwrap(), Value::Long(2));
}

#[test]
fn changing_the_watched_property_recomputes() {
    let app = totals_app(Some("filter"));
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, root, &mut rc);

    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(1)));
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(1)));
    ctx.write_field("filter", Value::Str("open".into())).unwrap();
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(2)));
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(2)));
}

#[test]
fn failing_watch_expression_propagates_and_keeps_the_cached_value() {
    let app = totals_app(Some("filter.0"));
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, root, &mut rc);

    let open = Value::List(vec![Value::Str("open".into())]);
    ctx.write_field("filter", open.clone()).unwrap();
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(1)));

    ctx.write_field("filter", Value::Str("open".into())).unwrap();
    let err = total(&mut ctx).unwrap_err().to_string();
    assert!(err.contains("has no property '0'"), "{err}");
    assert_eq!(ctx.read_field("calls").unwrap(), Value::Long(1));

    ctx.write_field("filter", open).unwrap();
    assert_eq!(total(&mut ctx).unwrap(), Some(Value::Long(1)));
    assert_eq!(ctx.read_field("calls").unwrap(), Value::Long(1));
}

#[test]
fn cached_methods_take_no_parameters_and_return_a_value() {
    let model_error = |method: MethodDef| {
        let app = Application::builder()
            .class(ComponentClass::descriptive(
                ClassDef::new("pages.Index", ClassKind::Page).method(method),
            ))
            .build()
            .unwrap();
        app.model("pages.Index").unwrap_err().to_string()
    };
    let err = model_error(
        MethodDef::new("getRow")
            .param("index", ValueType::Long)
            .returns(ValueType::Long)
            .with(Annotation::Cached { watch: None }),
    );
    assert!(err.contains("may not take parameters"), "{err}");
    let err = model_error(MethodDef::new("refresh").with(Annotation::Cached { watch: None }));
    assert!(err.contains("must return a value"), "{err}");
}
