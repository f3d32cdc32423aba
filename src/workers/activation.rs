use std::sync::Arc;

use crate::dispatch::event::{
    ACTIVATE, DECORATE_COMPONENT_EVENT_LINK, DECORATE_PAGE_RENDER_LINK, PASSIVATE,
};
use crate::dispatch::handler::{EventHandlerMethod, ParameterSource};
use crate::dispatch::link::{LINK, Link};
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ClassKind, MethodDef};
use crate::transform::advice::method_body;
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;
use crate::workers::property_name;

const ACTIVATE_METHOD: &str = "pageActivationContext$activate";
const PASSIVATE_METHOD: &str = "pageActivationContext$passivate";

fn handler(event_type: &str, method: &str, sources: Vec<ParameterSource>) -> EventHandlerMethod {
    let min_context = sources
        .iter()
        .filter(|s| matches!(s, ParameterSource::Context(_)))
        .count();
    EventHandlerMethod {
        event_type: event_type.to_string(),
        component_id: String::new(),
        min_context,
        method: method.to_string(),
        sources,
    }
}

/// Page fields set from the activation context on `activate` and returned on `passivate`.
///
/// A single field without an index receives the whole context (or its first value, for
/// scalar fields); several fields must each name their context index.
pub struct PageActivationContextWorker;

impl TransformWorker for PageActivationContextWorker {
    fn name(&self) -> &'static str {
        "PageActivationContext"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:SessionAttribute"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields =
            class.unclaimed_fields_with(|a| matches!(a, Annotation::PageActivationContext { .. }));
        if fields.is_empty() {
            return Ok(());
        }
        if class.kind() != ClassKind::Page {
            return Err(class.error("PageActivationContext may only be used in page classes"));
        }
        let mut slots: Vec<(usize, String, ValueType)> = Vec::with_capacity(fields.len());
        let mut unindexed = 0;
        for field in &fields {
            class.claim_field(&field.name, self.name())?;
            let index = field.annotations.iter().find_map(|a| match a {
                Annotation::PageActivationContext { index } => Some(*index),
                _ => None,
            });
            let index = match index.flatten() {
                Some(i) => i,
                None => {
                    unindexed += 1;
                    0
                }
            };
            slots.push((index, field.name.clone(), field.ty.clone()));
        }
        if fields.len() > 1 && unindexed > 0 {
            return Err(class.error(
                "only one field may be annotated with PageActivationContext unless every field \
                 gives its index",
            ));
        }
        slots.sort_by_key(|(i, _, _)| *i);
        if let Some(pair) = slots.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(class.error(format!(
                "fields '{}' and '{}' share activation context index {}",
                pair[0].1, pair[1].1, pair[0].0
            )));
        }
        let single = slots.len() == 1 && unindexed == 1;

        let activate_slots = slots.clone();
        class.introduce_method(
            MethodDef::new(ACTIVATE_METHOD).param("context", ValueType::List),
            method_body(move |ctx, args| {
                let context = args.first().and_then(Value::as_list).unwrap_or_default().to_vec();
                for (index, field, ty) in &activate_slots {
                    if single && matches!(ty, ValueType::List | ValueType::EventContext) {
                        ctx.write_field(field, Value::List(context.clone()))?;
                    } else if let Some(value) = context.get(*index) {
                        ctx.write_field(field, value.clone())?;
                    }
                }
                Ok(None)
            }),
        )?;
        class.introduce_method(
            MethodDef::new(PASSIVATE_METHOD).returns(ValueType::Any),
            method_body(move |ctx, _| {
                if single {
                    return ctx.read_field(&slots[0].1).map(Some);
                }
                let mut values = Vec::with_capacity(slots.len());
                for (index, field, _) in &slots {
                    values.resize(*index, Value::Null);
                    values.push(ctx.read_field(field)?);
                }
                while values.last().is_some_and(Value::is_null) {
                    values.pop();
                }
                Ok(Some(Value::List(values)))
            }),
        )?;
        class.add_event_handler(handler(
            ACTIVATE,
            ACTIVATE_METHOD,
            vec![ParameterSource::WholeContext],
        ))?;
        class.add_event_handler(handler(PASSIVATE, PASSIVATE_METHOD, Vec::new()))?;
        class.model_mut().add_handled_event(ACTIVATE);
        class.model_mut().add_handled_event(PASSIVATE);
        Ok(())
    }
}

const REQUEST_PARAMETER_ACTIVATE: &str = "activationRequestParameter$activate";
const REQUEST_PARAMETER_DECORATE: &str = "activationRequestParameter$decorate";

/// Page fields mirrored into a query parameter: set from the request on `activate`, added to
/// every link the page generates.
pub struct ActivationRequestParameterWorker;

impl TransformWorker for ActivationRequestParameterWorker {
    fn name(&self) -> &'static str {
        "ActivationRequestParameter"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:PageActivationContext"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class
            .unclaimed_fields_with(|a| matches!(a, Annotation::ActivationRequestParameter { .. }));
        if fields.is_empty() {
            return Ok(());
        }
        if class.kind() != ClassKind::Page {
            return Err(class.error("ActivationRequestParameter may only be used in page classes"));
        }
        let mut mapped: Vec<(String, String)> = Vec::with_capacity(fields.len());
        for field in &fields {
            class.claim_field(&field.name, self.name())?;
            let parameter = field
                .annotations
                .iter()
                .find_map(|a| match a {
                    Annotation::ActivationRequestParameter { value } => value.clone(),
                    _ => None,
                })
                .unwrap_or_else(|| property_name(&field.name).to_string());
            mapped.push((parameter, field.name.clone()));
        }
        let mapped = Arc::new(mapped);

        let on_activate = mapped.clone();
        class.introduce_method(
            MethodDef::new(REQUEST_PARAMETER_ACTIVATE),
            method_body(move |ctx, _| {
                for (parameter, field) in on_activate.iter() {
                    if let Some(raw) = ctx.request().request().parameter(parameter) {
                        ctx.write_field(field, Value::Str(raw))?;
                    }
                }
                Ok(None)
            }),
        )?;
        class.introduce_method(
            MethodDef::new(REQUEST_PARAMETER_DECORATE)
                .param("link", ValueType::Object(LINK.to_string())),
            method_body(move |ctx, args| {
                let link = args
                    .first()
                    .and_then(Value::as_object::<Link>)
                    .ok_or_else(|| TapestryError::event_handler(REQUEST_PARAMETER_DECORATE, "no link to decorate"))?;
                for (parameter, field) in mapped.iter() {
                    let value = ctx.read_field(field)?;
                    if !value.is_null() {
                        link.add_parameter(parameter.clone(), value.to_client_string());
                    }
                }
                Ok(None)
            }),
        )?;
        class.add_event_handler(handler(ACTIVATE, REQUEST_PARAMETER_ACTIVATE, Vec::new()))?;
        for event in [DECORATE_COMPONENT_EVENT_LINK, DECORATE_PAGE_RENDER_LINK] {
            class.add_event_handler(handler(
                event,
                REQUEST_PARAMETER_DECORATE,
                vec![ParameterSource::Context(0)],
            ))?;
            class.model_mut().add_handled_event(event);
        }
        class.model_mut().add_handled_event(ACTIVATE);
        Ok(())
    }
}
