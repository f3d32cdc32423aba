use super::*;
use crate::app::Application;
use crate::model::class_def::{ClassDef, ClassKind, ParamDef};
use crate::transform::component_class::ComponentClass;

fn event_of(name: &str) -> Option<(String, String)> {
    handled_event(&MethodDef::new(name))
}

#[test]
fn handler_names_follow_the_on_event_from_id_convention() {
    assert_eq!(event_of("onAction"), Some(("action".into(), "".into())));
    assert_eq!(
        event_of("onActionFromDelete"),
        Some(("action".into(), "delete".into()))
    );
    assert_eq!(
        event_of("onValidateFromEmailField"),
        Some(("validate".into(), "emailField".into()))
    );
    assert_eq!(event_of("onFrom"), Some(("from".into(), "".into())));
    assert_eq!(event_of("onSuccessFrom"), Some(("successFrom".into(), "".into())));
    assert_eq!(event_of("online"), None);
    assert_eq!(event_of("setupRender"), None);
}

#[test]
fn annotation_overrides_the_method_name() {
    let method = MethodDef::new("remove").with(Annotation::OnEvent {
        value: Some("delete".into()),
        component: Some("grid".into()),
    });
    assert_eq!(handled_event(&method), Some(("delete".into(), "grid".into())));

    let method = MethodDef::new("whatever").with(Annotation::OnEvent {
        value: None,
        component: None,
    });
    assert_eq!(handled_event(&method), Some(("action".into(), "".into())));
}

fn handlers_of(def: ClassDef) -> Vec<EventHandlerMethod> {
    let app = Application::builder()
        .class(ComponentClass::descriptive(def.clone()))
        .build()
        .unwrap();
    app.registry()
        .transformed(&def.name)
        .unwrap()
        .handlers()
        .to_vec()
}

#[test]
fn context_parameters_set_the_minimum_context() {
    let handlers = handlers_of(
        ClassDef::new("pages.Index", ClassKind::Page)
            .method(
                MethodDef::new("onActionFromDelete")
                    .param("id", ValueType::Long)
                    .param("confirm", ValueType::Bool),
            )
            .method(MethodDef::new("onActivate").param("context", ValueType::EventContext))
            .method(
                MethodDef::new("onSearch")
                    .param_def(ParamDef::new("q", ValueType::Str).with(
                        Annotation::RequestParameter {
                            value: "q".into(),
                            allow_blank: true,
                        },
                    ))
                    .param("page", ValueType::Long),
            ),
    );
    assert_eq!(handlers.len(), 3);

    assert_eq!(handlers[0].event_type, "action");
    assert_eq!(handlers[0].component_id, "delete");
    assert_eq!(handlers[0].min_context, 2);
    assert_eq!(
        handlers[0].sources,
        vec![ParameterSource::Context(0), ParameterSource::Context(1)]
    );

    assert_eq!(handlers[1].min_context, 0);
    assert_eq!(handlers[1].sources, vec![ParameterSource::WholeContext]);

    assert_eq!(handlers[2].min_context, 1);
    assert_eq!(
        handlers[2].sources,
        vec![
            ParameterSource::QueryParameter {
                name: "q".into(),
                allow_blank: true
            },
            ParameterSource::Context(0),
        ]
    );
}

#[test]
fn static_context_values_count_towards_the_minimum() {
    let handlers = handlers_of(
        ClassDef::new("pages.Index", ClassKind::Page).method(
            MethodDef::new("onActivate")
                .param_def(ParamDef::new("kind", ValueType::Str).with(
                    Annotation::StaticActivationContextValue {
                        value: "edit".into(),
                    },
                ))
                .param("id", ValueType::Long),
        ),
    );
    assert_eq!(handlers[0].min_context, 2);
    assert_eq!(
        handlers[0].sources[0],
        ParameterSource::Static {
            index: 0,
            value: "edit".into()
        }
    );
}

#[test]
fn only_one_request_body_parameter_is_allowed() {
    let def = ClassDef::new("pages.Api", ClassKind::Page).method(
        MethodDef::new("onPost")
            .param_def(ParamDef::new("a", ValueType::Str).with(Annotation::RequestBody {
                allow_empty: false,
            }))
            .param_def(ParamDef::new("b", ValueType::Str).with(Annotation::RequestBody {
                allow_empty: true,
            })),
    );
    let app = Application::builder()
        .class(ComponentClass::descriptive(def))
        .build()
        .unwrap();
    let err = app.model("pages.Api").unwrap_err().to_string();
    assert!(err.contains("more than one request body"), "{err}");
}

#[test]
fn handled_events_are_recorded_in_the_model() {
    let app = Application::builder()
        .class(ComponentClass::descriptive(
            ClassDef::new("pages.Index", ClassKind::Page)
                .method(MethodDef::new("onSuccessFromForm"))
                .method(MethodDef::new("onActivate")),
        ))
        .build()
        .unwrap();
    let model = app.model("pages.Index").unwrap();
    assert!(model.handles_event("success"));
    assert!(model.handles_event("ACTIVATE"));
    assert!(!model.handles_event("action"));
}
