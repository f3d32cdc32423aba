use crate::components::{LIBRARY, informal_attributes, open_element, parameter, phase_method};
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ClassDef, ClassKind, ParameterAnn};
use crate::transform::component_class::ComponentClass;

/// Renders an arbitrary element (`div` unless `element` is bound) carrying the informal
/// parameters, with the body inside.
pub fn any_class() -> ComponentClass {
    let def = ClassDef::new("core.components.Any", ClassKind::Component)
        .library(LIBRARY)
        .with(Annotation::SupportsInformalParameters)
        .field(
            parameter(
                "element",
                ValueType::Str,
                ParameterAnn {
                    default_prefix: Some("literal".into()),
                    value: Some("div".into()),
                    ..ParameterAnn::default()
                },
            ),
        )
        .method(phase_method("beginRender"))
        .method(phase_method("afterRender"));

    ComponentClass::new(def)
        .body("beginRender", |ctx, _| {
            let element = match ctx.read_parameter("element")? {
                Value::Str(name) if !name.is_empty() => name,
                _ => "div".to_string(),
            };
            let mut attributes = informal_attributes(ctx)?;
            if !attributes.iter().any(|(k, _)| k == "id") {
                let id = ctx.resources()?.id.clone();
                if !id.is_empty() {
                    attributes.insert(0, ("id".to_string(), ctx.request().allocate_client_id(&id)));
                }
            }
            open_element(ctx, &element, &attributes);
            Ok(None)
        })
        .body("afterRender", |ctx, _| {
            ctx.writer().end()?;
            Ok(None)
        })
}
