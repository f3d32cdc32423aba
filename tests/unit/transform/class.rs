use super::*;
use crate::foundation::value::{Value, ValueType};
use crate::runtime::settings::Settings;

fn services() -> Arc<Services> {
    Arc::new(Services::new(Settings::default()))
}

fn component(def: ClassDef) -> ComponentClass {
    ComponentClass::new(def)
}

#[test]
fn a_field_is_claimed_once() {
    let class = component(
        ClassDef::new("components.Box", ClassKind::Component)
            .field(FieldDef::new("count", ValueType::Long)),
    );
    let mut transform = TransformClass::new(&class, None, services()).unwrap();
    transform.claim_field("count", "Persist").unwrap();
    assert!(transform.is_claimed("count"));
    let err = transform.claim_field("count", "Parameter").unwrap_err().to_string();
    assert!(err.contains("already claimed by Persist"), "{err}");
    assert!(transform.claim_field("missing", "Persist").is_err());
}

#[test]
fn unclaimed_fields_filter_by_annotation() {
    let class = component(
        ClassDef::new("components.Box", ClassKind::Component)
            .field(FieldDef::new("a", ValueType::Long).with(Annotation::Persist { strategy: None }))
            .field(FieldDef::new("b", ValueType::Long).with(Annotation::Persist { strategy: None }))
            .field(FieldDef::new("c", ValueType::Long)),
    );
    let mut transform = TransformClass::new(&class, None, services()).unwrap();
    transform.claim_field("a", "Persist").unwrap();
    let names: Vec<String> = transform
        .unclaimed_fields_with(|a| matches!(a, Annotation::Persist { .. }))
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["b"]);
}

#[test]
fn subclass_may_not_redeclare_an_inherited_field() {
    let base = component(
        ClassDef::new("components.Base", ClassKind::Component)
            .field(FieldDef::new("count", ValueType::Long)),
    );
    let parent = Arc::new(TransformClass::new(&base, None, services()).unwrap().finish().unwrap());

    let sub = component(
        ClassDef::new("components.Sub", ClassKind::Component)
            .extends("components.Base")
            .field(FieldDef::new("count", ValueType::Long)),
    );
    let err = TransformClass::new(&sub, Some(parent.clone()), services())
        .err()
        .unwrap()
        .to_string();
    assert!(err.contains("already declared by superclass components.Base"), "{err}");

    let sub = component(
        ClassDef::new("components.Sub", ClassKind::Component).extends("components.Base"),
    );
    let mut transform = TransformClass::new(&sub, Some(parent), services()).unwrap();
    assert!(transform
        .introduce_field(FieldDef::new("count", ValueType::Long))
        .is_err());
}

#[test]
fn methods_without_bodies_fail_unless_descriptive() {
    let def = ClassDef::new("pages.Index", ClassKind::Page).method(MethodDef::new("onAction"));
    let err = TransformClass::new(&component(def.clone()), None, services())
        .unwrap()
        .finish()
        .unwrap_err()
        .to_string();
    assert!(err.contains("has no implementation"), "{err}");

    let descriptive = ComponentClass::descriptive(def);
    let finished = TransformClass::new(&descriptive, None, services())
        .unwrap()
        .finish()
        .unwrap();
    assert!(finished.find_method("onAction").is_some());
}

#[test]
fn introduced_members_and_handlers_are_checked() {
    let class = component(ClassDef::new("pages.Index", ClassKind::Page));
    let mut transform = TransformClass::new(&class, None, services()).unwrap();

    let body = method_body(|_ctx, _args| Ok(Some(Value::Long(7))));
    transform
        .introduce_method(MethodDef::new("getAnswer").returns(ValueType::Long), body.clone())
        .unwrap();
    assert!(transform.has_method("getAnswer"));
    assert!(transform
        .introduce_method(MethodDef::new("getAnswer"), body)
        .is_err());

    let handler = EventHandlerMethod {
        event_type: "action".into(),
        component_id: String::new(),
        min_context: 0,
        method: "onAction".into(),
        sources: Vec::new(),
    };
    assert!(transform.add_event_handler(handler.clone()).is_err());
    let handler = EventHandlerMethod {
        method: "getAnswer".into(),
        ..handler
    };
    transform.add_event_handler(handler.clone()).unwrap();
    transform.add_event_handler(handler).unwrap();
    assert_eq!(transform.handlers().len(), 1);

    assert!(transform.add_advice("missing", Arc::new(Noop)).is_err());
    transform.add_advice("getAnswer", Arc::new(Noop)).unwrap();
    let finished = transform.finish().unwrap();
    assert_eq!(finished.find_method("getAnswer").unwrap().advice_count(), 1);
}

struct Noop;

impl MethodAdvice for Noop {
    fn advise(
        &self,
        invocation: &mut crate::transform::advice::MethodInvocation<'_, '_>,
    ) -> TapestryResult<()> {
        invocation.proceed()
    }
}

#[test]
fn render_phase_and_lifecycle_methods_are_recorded_once() {
    let class = component(ClassDef::new("pages.Index", ClassKind::Page));
    let mut transform = TransformClass::new(&class, None, services()).unwrap();
    transform.add_render_phase_method(RenderPhase::BeginRender, "beginRender");
    transform.add_render_phase_method(RenderPhase::BeginRender, "beginRender");
    transform.add_lifecycle_method(LifecyclePoint::Attached, "pageAttached");
    transform.register_parameter_field("Value", "_value");
    let finished = transform.finish().unwrap();
    assert_eq!(
        finished.render_phase_methods(RenderPhase::BeginRender),
        ["beginRender".to_string()]
    );
    assert!(finished.render_phase_methods(RenderPhase::AfterRender).is_empty());
    assert_eq!(finished.parameter_field("value"), Some("_value"));
}
