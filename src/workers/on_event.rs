use crate::dispatch::event::ACTION;
use crate::dispatch::handler::{EventHandlerMethod, ParameterSource};
use crate::foundation::error::TapestryResult;
use crate::foundation::value::ValueType;
use crate::model::class_def::{Annotation, MethodDef};
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;

/// Registers event handlers from `OnEvent` annotations and from `on<Event>[From<Id>]` method
/// names.
pub struct OnEventWorker;

impl TransformWorker for OnEventWorker {
    fn name(&self) -> &'static str {
        "OnEvent"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Log"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for method in class.methods() {
            let Some((event_type, component_id)) = handled_event(&method) else {
                continue;
            };
            let sources = parameter_sources(class, &method)?;
            let min_context = sources
                .iter()
                .filter(|s| {
                    matches!(s, ParameterSource::Context(_) | ParameterSource::Static { .. })
                })
                .count();
            tracing::trace!(
                class = class.class_name(),
                method = %method.name,
                event = %event_type,
                component = %component_id,
                min_context,
                "registered event handler"
            );
            class.model_mut().add_handled_event(&event_type);
            class.add_event_handler(EventHandlerMethod {
                event_type,
                component_id,
                min_context,
                method: method.name.clone(),
                sources,
            })?;
        }
        Ok(())
    }
}

/// Event type and component id a method handles, from its annotation or its name.
pub fn handled_event(method: &MethodDef) -> Option<(String, String)> {
    if let Some((value, component)) = method.annotations.iter().find_map(|a| match a {
        Annotation::OnEvent { value, component } => Some((value.clone(), component.clone())),
        _ => None,
    }) {
        return Some((
            value.unwrap_or_else(|| ACTION.to_string()),
            component.unwrap_or_default(),
        ));
    }
    let rest = method.name.strip_prefix("on")?;
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let (event, component) = match rest.find("From") {
        Some(at) if at > 0 && at + 4 < rest.len() => (&rest[..at], &rest[at + 4..]),
        _ => (rest, ""),
    };
    Some((decapitalize(event), decapitalize(component)))
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parameter_sources(
    class: &TransformClass<'_>,
    method: &MethodDef,
) -> TapestryResult<Vec<ParameterSource>> {
    let mut sources = Vec::with_capacity(method.params.len());
    let mut context_index = 0;
    let mut bodies = 0;
    for param in &method.params {
        let explicit = param.annotations.iter().find_map(|a| match a {
            Annotation::RequestParameter { value, allow_blank } => {
                Some(ParameterSource::QueryParameter {
                    name: value.clone(),
                    allow_blank: *allow_blank,
                })
            }
            Annotation::RequestBody { allow_empty } => Some(ParameterSource::RequestBody {
                allow_empty: *allow_empty,
            }),
            _ => None,
        });
        let static_value = param.annotations.iter().find_map(|a| match a {
            Annotation::StaticActivationContextValue { value } => Some(value.clone()),
            _ => None,
        });
        let source = match (explicit, static_value) {
            (Some(ParameterSource::RequestBody { allow_empty }), _) => {
                bodies += 1;
                if bodies > 1 {
                    return Err(class.error(format!(
                        "method '{}' declares more than one request body parameter",
                        method.name
                    )));
                }
                ParameterSource::RequestBody { allow_empty }
            }
            (Some(source), _) => source,
            (None, Some(value)) => {
                let index = context_index;
                context_index += 1;
                ParameterSource::Static { index, value }
            }
            (None, None) => match param.ty {
                ValueType::EventContext | ValueType::List => ParameterSource::WholeContext,
                ValueType::MarkupWriter => ParameterSource::MarkupWriter,
                _ => {
                    let index = context_index;
                    context_index += 1;
                    ParameterSource::Context(index)
                }
            },
        };
        sources.push(source);
    }
    Ok(sources)
}

#[cfg(test)]
#[path = "../../tests/unit/workers/on_event.rs"]
mod tests;
