use std::sync::Arc;

use crate::dispatch::event::ComponentEvent;
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};
use crate::page::context::ComponentContext;
use crate::transform::advice::{AdvisedMethod, invoke_advised};

/// Where one handler argument comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterSource {
    /// Context value at a position, coerced to the parameter type.
    Context(usize),
    /// The whole context as a list.
    WholeContext,
    QueryParameter { name: String, allow_blank: bool },
    RequestBody { allow_empty: bool },
    /// Fixed value the context must carry at `index` for the handler to match.
    Static { index: usize, value: String },
    /// Placeholder for render-phase style writer parameters.
    MarkupWriter,
}

/// A method registered to handle an event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventHandlerMethod {
    pub event_type: String,
    /// Originating component id; empty matches any origin.
    pub component_id: String,
    pub min_context: usize,
    pub method: String,
    pub sources: Vec<ParameterSource>,
}

impl EventHandlerMethod {
    pub fn matches(&self, event: &ComponentEvent) -> bool {
        if !event.matches(&self.event_type, &self.component_id, self.min_context) {
            return false;
        }
        self.sources.iter().all(|s| match s {
            ParameterSource::Static { index, value } => event
                .context()
                .get(*index)
                .is_some_and(|v| v.to_client_string() == *value),
            _ => true,
        })
    }

    /// Resolves arguments left to right, invokes the method and returns its result.
    pub fn invoke(
        &self,
        ctx: &mut ComponentContext<'_>,
        method: &Arc<AdvisedMethod>,
        event: &mut ComponentEvent,
    ) -> TapestryResult<Option<Value>> {
        let args = self.extract_arguments(ctx, method, event)?;
        tracing::debug!(
            method = %method.describe(),
            event = event.event_type(),
            origin = event.origin(),
            "invoking event handler"
        );
        invoke_advised(ctx, method, args)
    }

    fn extract_arguments(
        &self,
        ctx: &mut ComponentContext<'_>,
        method: &AdvisedMethod,
        event: &mut ComponentEvent,
    ) -> TapestryResult<Vec<Value>> {
        let mut args = Vec::with_capacity(self.sources.len());
        for (index, source) in self.sources.iter().enumerate() {
            let ty = method
                .def
                .params
                .get(index)
                .map(|p| p.ty.clone())
                .unwrap_or(ValueType::Any);
            let value = extract(ctx, source, &ty, event)
                .map_err(|e| TapestryError::extraction(method.describe(), index, e.to_string()))?;
            args.push(value);
        }
        Ok(args)
    }
}

fn extract(
    ctx: &mut ComponentContext<'_>,
    source: &ParameterSource,
    ty: &ValueType,
    event: &mut ComponentEvent,
) -> TapestryResult<Value> {
    let coercer = ctx.services().coercer().clone();
    match source {
        ParameterSource::Context(i) | ParameterSource::Static { index: i, .. } => {
            let raw = event.context().get(*i).cloned().ok_or_else(|| {
                TapestryError::coercion(format!("no context value at index {i}"))
            })?;
            coercer.coerce(raw, ty)
        }
        ParameterSource::WholeContext => Ok(Value::List(event.context().to_vec())),
        ParameterSource::QueryParameter { name, allow_blank } => {
            let raw = ctx.request().request().parameter(name);
            match raw {
                Some(v) if *allow_blank || !v.trim().is_empty() => {
                    coercer.coerce(Value::Str(v), ty)
                }
                None if *allow_blank => Ok(ty.default_value()),
                _ => Err(TapestryError::coercion(format!(
                    "request parameter '{name}' is null or blank"
                ))),
            }
        }
        ParameterSource::RequestBody { allow_empty } => {
            let raw = ctx.request().request().body().map(str::to_string);
            let raw = match raw {
                Some(b) if !b.trim().is_empty() => b,
                _ if *allow_empty => return Ok(ty.default_value()),
                _ => return Err(TapestryError::coercion("request body is empty")),
            };
            if matches!(ty, ValueType::Str) {
                return Ok(Value::Str(raw));
            }
            let decoded = match event.cached_body() {
                Some(v) => v.clone(),
                None => {
                    let json: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                        TapestryError::serde(format!("request body is not valid JSON: {e}"))
                    })?;
                    let v = Value::from_json(json);
                    event.cache_body(v.clone());
                    v
                }
            };
            coercer.coerce(decoded, ty)
        }
        ParameterSource::MarkupWriter => Ok(Value::Null),
    }
}
