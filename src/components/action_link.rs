use crate::components::{LIBRARY, informal_attributes, open_element, parameter, phase_method};
use crate::dispatch::event::ACTION;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ClassDef, ClassKind, ParameterAnn};
use crate::transform::component_class::ComponentClass;

/// A link triggering the `action` event on this component; the event bubbles to the
/// container, where `onActionFrom<Id>` handles it.
pub fn action_link_class() -> ComponentClass {
    let def = ClassDef::new("core.components.ActionLink", ClassKind::Component)
        .library(LIBRARY)
        .with(Annotation::SupportsInformalParameters)
        .field(parameter("context", ValueType::List, ParameterAnn::default()))
        .field(parameter(
            "disabled",
            ValueType::Bool,
            ParameterAnn {
                allow_null: false,
                ..ParameterAnn::default()
            },
        ))
        .method(phase_method("beginRender"))
        .method(phase_method("afterRender"));

    ComponentClass::new(def)
        .body("beginRender", |ctx, _| {
            let mut attributes = informal_attributes(ctx)?;
            if ctx.read_parameter("disabled")? != Value::Bool(true) {
                let context = match ctx.read_parameter("context")? {
                    Value::List(items) => items,
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                let link = ctx.create_event_link(ACTION, &context)?;
                attributes.insert(0, ("href".to_string(), link.to_uri()));
            }
            open_element(ctx, "a", &attributes);
            Ok(None)
        })
        .body("afterRender", |ctx, _| {
            ctx.writer().end()?;
            Ok(None)
        })
}
