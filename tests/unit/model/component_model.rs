use super::*;

fn param(name: &str) -> ParameterModel {
    ParameterModel {
        name: name.to_string(),
        required: false,
        allow_null: true,
        default_prefix: "prop".to_string(),
        cached: true,
        principal: false,
        autoconnect: false,
    }
}

fn embedded(id: &str, ty: &str) -> EmbeddedComponentModel {
    EmbeddedComponentModel {
        id: id.to_string(),
        declared_type: Some(ty.to_string()),
        type_override: None,
        inherit_informal_parameters: false,
        parameters: IndexMap::new(),
        publish_parameters: Vec::new(),
        mixins: Vec::new(),
    }
}

#[test]
fn identical_re_adds_are_no_ops() {
    let mut m = MutableComponentModel::new("pages.Index", "app", ClassKind::Page, None);
    m.add_parameter(param("value")).unwrap();
    m.add_parameter(param("value")).unwrap();
    m.add_embedded_component(embedded("form", "Form")).unwrap();
    m.add_embedded_component(embedded("form", "Form")).unwrap();
    m.add_handled_event("action");
    m.add_handled_event("Action");
    m.add_render_phase(RenderPhase::BeginRender);
    m.add_render_phase(RenderPhase::BeginRender);

    let model = m.freeze();
    assert_eq!(model.parameter_names(), vec!["value"]);
    assert_eq!(model.embedded_components().len(), 1);
    assert_eq!(model.declared_events().count(), 1);
    assert_eq!(model.declared_render_phases().count(), 1);
}

#[test]
fn conflicting_declarations_fail() {
    let mut m = MutableComponentModel::new("pages.Index", "app", ClassKind::Page, None);
    m.add_embedded_component(embedded("form", "Form")).unwrap();
    let err = m
        .add_embedded_component(embedded("Form", "Loop"))
        .unwrap_err()
        .to_string();
    assert!(err.contains("pages.Index"));
    assert!(err.contains("already defined"));

    m.add_parameter(param("value")).unwrap();
    let mut required = param("value");
    required.required = true;
    assert!(m.add_parameter(required).is_err());
}

#[test]
fn lookups_fall_back_to_parent() {
    let mut base = MutableComponentModel::new("Base", "app", ClassKind::Component, None);
    base.add_parameter(param("value")).unwrap();
    base.add_handled_event("submit");
    base.set_meta("tapestry.secure", "true");
    base.set_supports_informal_parameters();
    let base = base.freeze();

    let mut child = MutableComponentModel::new("Child", "app", ClassKind::Component, Some(base));
    child.add_parameter(param("label")).unwrap();
    assert!(child.add_parameter(param("VALUE")).is_err());
    let child = child.freeze();

    assert_eq!(child.parameter_names(), vec!["value", "label"]);
    assert!(child.handles_event("SUBMIT"));
    assert_eq!(child.meta("tapestry.secure"), Some("true"));
    assert!(child.supports_informal_parameters());
    assert_eq!(child.parent_class_name.as_deref(), Some("Base"));
}

#[test]
fn persistent_logical_names_are_unique_in_hierarchy() {
    let mut base = MutableComponentModel::new("Base", "app", ClassKind::Page, None);
    assert_eq!(base.set_field_persistence_strategy("_count", "session"), "count");
    let base = base.freeze();

    let mut child = MutableComponentModel::new("Child", "app", ClassKind::Page, Some(base));
    assert_eq!(child.set_field_persistence_strategy("count", "flash"), "count_0");
    assert_eq!(child.set_field_persistence_strategy("count", "flash"), "count_0");
    let child = child.freeze();
    assert_eq!(child.persistence_strategy("count"), Some("session"));
    assert_eq!(child.persistence_strategy("count_0"), Some("flash"));
}

#[test]
fn mixin_refs_parse_constraints() {
    let m = MixinRef::parse("core/Autofocus::before:Validate; after:*");
    assert_eq!(m.mixin_type, "core/Autofocus");
    assert_eq!(m.constraints, vec!["before:Validate", "after:*"]);
    assert!(MixinRef::parse("Mark").constraints.is_empty());
}

#[test]
fn publisher_lookup_is_case_insensitive() {
    let mut m = MutableComponentModel::new("Wrapper", "app", ClassKind::Component, None);
    let mut inner = embedded("inner", "TextField");
    inner.publish_parameters.push("value".into());
    m.add_embedded_component(inner).unwrap();
    let model = m.freeze();
    assert_eq!(model.publisher_of("Value").unwrap().id, "inner");
    assert!(model.publisher_of("label").is_none());
}
