use super::*;
use crate::app::Application;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{ClassDef, ClassKind, FieldDef, MethodDef};
use crate::runtime::context::RequestContext;
use crate::runtime::request::{MemorySession, TestRequest};
use crate::transform::component_class::ComponentClass;

fn flush_app() -> Application {
    let def = ClassDef::new("pages.Index", ClassKind::Page)
        .field(FieldDef::new("flushes", ValueType::Long).initial(0i64))
        .method(MethodDef::new("flush").with(Annotation::HeartbeatDeferred))
        .method(
            MethodDef::new("double")
                .param("n", ValueType::Long)
                .returns(ValueType::Long)
                .with(Annotation::Log),
        );
    let class = ComponentClass::new(def)
        .body("flush", |ctx, _| {
            let n = ctx.read_field("flushes")?.as_long().unwrap_or(0);
            ctx.write_field("flushes", Value::Long(n + 1))?;
            Ok(None)
        })
        .body("double", |_, args| {
            let n = args.first().and_then(Value::as_long).unwrap_or(0);
            Ok(Some(Value::Long(n * 2)))
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

#[test]
fn deferred_method_runs_immediately_without_a_heartbeat() {
    let app = flush_app();
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, root, &mut rc);

    assert_eq!(ctx.invoke("flush", Vec::new()).unwrap(), None);
    assert_eq!(ctx.read_field("flushes").unwrap(), Value::Long(1));
}

#[test]
fn deferred_method_waits_for_the_heartbeat_to_end() {
    let app = flush_app();
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();
    let mut rc = request(&app);
    let heartbeat = Arc::new(Heartbeat::new());
    rc.environment_mut().push(heartbeat.clone());
    heartbeat.begin();
    let mut ctx = ComponentContext::new(&page, root, &mut rc);

    ctx.invoke("flush", Vec::new()).unwrap();
    ctx.invoke("flush", Vec::new()).unwrap();
    assert_eq!(ctx.read_field("flushes").unwrap(), Value::Long(0));

    heartbeat.end(&mut ctx).unwrap();
    assert_eq!(ctx.read_field("flushes").unwrap(), Value::Long(2));

    // The heartbeat is still in the environment but no longer active.
    ctx.invoke("flush", Vec::new()).unwrap();
    assert_eq!(ctx.read_field("flushes").unwrap(), Value::Long(3));
}

#[test]
fn deferred_methods_must_return_void() {
    let app = Application::builder()
        .class(ComponentClass::descriptive(
            ClassDef::new("pages.Index", ClassKind::Page).method(
                MethodDef::new("count")
                    .returns(ValueType::Long)
                    .with(Annotation::HeartbeatDeferred),
            ),
        ))
        .build()
        .unwrap();
    let err = app.model("pages.Index").unwrap_err().to_string();
    assert!(err.contains("must return void"), "{err}");
}

#[test]
fn logged_method_returns_its_result() {
    let app = flush_app();
    let page = app.page("Index").unwrap();
    let root = page.locate("Index").unwrap();
    let mut rc = request(&app);
    let mut ctx = ComponentContext::new(&page, root, &mut rc);

    assert_eq!(
        ctx.invoke("double", vec![Value::Long(21)]).unwrap(),
        Some(Value::Long(42))
    );
}
