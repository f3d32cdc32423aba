use std::sync::Arc;

use super::*;
use crate::app::Application;
use crate::foundation::value::ValueType;
use crate::model::class_def::{Annotation, ClassDef, ClassKind, FieldDef, MethodDef};
use crate::page::template::{ElementSpec, NodeSpec};
use crate::runtime::request::{MemorySession, TestRequest};
use crate::transform::component_class::ComponentClass;

fn writes(class: ComponentClass, method: &str, text: &'static str) -> ComponentClass {
    class.body(method, move |ctx, _| {
        ctx.writer().write(text);
        Ok(None)
    })
}

fn index(template: Vec<NodeSpec>) -> ComponentClass {
    ComponentClass::new(
        ClassDef::new("pages.Index", ClassKind::Page)
            .field(FieldDef::new("title", ValueType::Str).initial("Hello")),
    )
    .template(template)
}

fn render(classes: Vec<ComponentClass>) -> TapestryResult<(String, RenderStats)> {
    let app = Application::builder().classes(classes).build()?;
    let page = app.page("Index")?;
    let mut rc = app.request_context(
        Arc::new(TestRequest::new("/index")),
        Arc::new(MemorySession::new()),
    )?;
    let stats = render_page(&page, &mut rc)?;
    Ok((rc.markup(), stats))
}

fn component(name: &str, methods: &[&str]) -> ClassDef {
    class_def(name, ClassKind::Component, methods)
}

fn class_def(name: &str, kind: ClassKind, methods: &[&str]) -> ClassDef {
    let mut def = ClassDef::new(name, kind);
    for method in methods {
        def = def.method(MethodDef::new(*method).returns(ValueType::Bool));
    }
    def
}

#[test]
fn template_markup_and_expansions() {
    let (markup, stats) = render(vec![index(vec![NodeSpec::element(
        "h1",
        &[("class", "title")],
        vec![NodeSpec::text("Say "), NodeSpec::expansion("title")],
    )])])
    .unwrap();
    assert_eq!(markup, "<h1 class=\"title\">Say Hello</h1>");
    assert_eq!(stats.elements_rendered, 1);
    assert_eq!(stats.phase_invocations, 0);
}

#[test]
fn body_renders_inside_the_component_template_against_the_container() {
    let frame = ComponentClass::new(component("components.Frame", &[])).template(vec![
        NodeSpec::element("section", &[], vec![NodeSpec::Body]),
    ]);
    let (markup, stats) = render(vec![
        frame,
        index(vec![NodeSpec::component(
            ElementSpec::id("frame")
                .with_type("Frame")
                .body(vec![NodeSpec::expansion("title")]),
        )]),
    ])
    .unwrap();
    assert_eq!(markup, "<section>Hello</section>");
    assert_eq!(stats.elements_rendered, 2);
}

#[test]
fn after_render_false_repeats_the_element() {
    let def = component("components.Repeat", &["setupRender", "beginRender", "afterRender"])
        .field(FieldDef::new("count", ValueType::Long));
    let repeat = ComponentClass::new(def)
        .body("setupRender", |ctx, _| {
            ctx.write_field("count", Value::Long(0))?;
            Ok(None)
        })
        .body("beginRender", |ctx, _| {
            let n = ctx.read_field("count")?.to_client_string();
            ctx.writer().write(&format!("[{n}]"));
            Ok(None)
        })
        .body("afterRender", |ctx, _| {
            let n = ctx.read_field("count")?.as_long().unwrap_or_default() + 1;
            ctx.write_field("count", Value::Long(n))?;
            Ok(Some(Value::Bool(n == 3)))
        });
    let (markup, _) = render(vec![
        repeat,
        index(vec![NodeSpec::component(ElementSpec::of_type("Repeat"))]),
    ])
    .unwrap();
    assert_eq!(markup, "[0][1][2]");
}

#[test]
fn setup_render_false_skips_to_cleanup() {
    let hidden = writes(
        ComponentClass::new(component("components.Hidden", &["setupRender", "cleanupRender"]))
            .body("setupRender", |_ctx, _| Ok(Some(Value::Bool(false)))),
        "cleanupRender",
        "cleanup",
    );
    let (markup, stats) = render(vec![
        hidden,
        index(vec![NodeSpec::component(
            ElementSpec::of_type("Hidden").body(vec![NodeSpec::text("secret")]),
        )]),
    ])
    .unwrap();
    assert_eq!(markup, "cleanup");
    assert_eq!(stats.phase_invocations, 2);
}

#[test]
fn before_render_body_false_skips_the_body() {
    let quiet = ComponentClass::new(component("components.Quiet", &["beforeRenderBody"]))
        .body("beforeRenderBody", |_ctx, _| Ok(Some(Value::Bool(false))));
    let (markup, _) = render(vec![
        quiet,
        index(vec![NodeSpec::component(
            ElementSpec::of_type("Quiet").body(vec![NodeSpec::text("body")]),
        )]),
    ])
    .unwrap();
    assert_eq!(markup, "");
}

#[test]
fn after_phases_run_participants_in_reverse() {
    let core = writes(
        writes(
            ComponentClass::new(component("components.Core", &["beginRender", "afterRender"])),
            "beginRender",
            "C",
        ),
        "afterRender",
        "c",
    );
    let first = writes(
        writes(
            ComponentClass::new(class_def(
                "mixins.First",
                ClassKind::Mixin,
                &["beginRender", "afterRender"],
            )),
            "beginRender",
            "F",
        ),
        "afterRender",
        "f",
    );
    let last = writes(
        writes(
            ComponentClass::new(
                class_def("mixins.Last", ClassKind::Mixin, &["beginRender", "afterRender"])
                    .with(Annotation::MixinAfter),
            ),
            "beginRender",
            "L",
        ),
        "afterRender",
        "l",
    );
    let (markup, _) = render(vec![
        core,
        first,
        last,
        index(vec![NodeSpec::component(
            ElementSpec::of_type("Core").mixin("Last").mixin("First"),
        )]),
    ])
    .unwrap();
    assert_eq!(markup, "FCLlcf");
}

#[test]
fn superclass_methods_wrap_subclass_methods() {
    let base = writes(
        writes(
            ComponentClass::new(component("components.Base", &["beginRender", "afterRender"])),
            "beginRender",
            "1",
        ),
        "afterRender",
        "x",
    );
    let sub = writes(
        writes(
            ComponentClass::new(
                ClassDef::new("components.Sub", ClassKind::Component)
                    .extends("components.Base")
                    .method(MethodDef::new("begin").with(Annotation::BeginRender))
                    .method(MethodDef::new("after").with(Annotation::AfterRender)),
            ),
            "begin",
            "2",
        ),
        "after",
        "y",
    );
    let (markup, _) = render(vec![
        base,
        sub,
        index(vec![NodeSpec::component(ElementSpec::of_type("Sub"))]),
    ])
    .unwrap();
    assert_eq!(markup, "12yx");
}

#[test]
fn non_boolean_phase_results_are_errors() {
    let odd = ComponentClass::new(component("components.Odd", &["beginRender"]))
        .body("beginRender", |_ctx, _| Ok(Some(Value::from("yes"))));
    let err = render(vec![
        odd,
        index(vec![NodeSpec::component(ElementSpec::of_type("Odd"))]),
    ])
    .unwrap_err()
    .to_string();
    assert!(err.contains("only booleans are allowed"), "{err}");
    assert!(err.contains("Index:odd"), "{err}");
}

#[test]
fn rendering_flag_covers_the_render_only() {
    let probe = ComponentClass::new(component("components.Probe", &["beginRender"])).body(
        "beginRender",
        |ctx, _| {
            let rendering = ctx.is_rendering();
            ctx.writer().write(&rendering.to_string());
            Ok(None)
        },
    );
    let app = Application::builder()
        .class(probe)
        .class(index(vec![NodeSpec::component(ElementSpec::id("probe").with_type("Probe"))]))
        .build()
        .unwrap();
    let page = app.page("Index").unwrap();
    let mut rc = app
        .request_context(
            Arc::new(TestRequest::new("/index")),
            Arc::new(MemorySession::new()),
        )
        .unwrap();
    render_page(&page, &mut rc).unwrap();
    assert_eq!(rc.markup(), "true");
    let locator = page.locate("Index:probe").unwrap();
    let ctx = ComponentContext::new(&page, locator, &mut rc);
    assert!(!ctx.is_rendering());
}
