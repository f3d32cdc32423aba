use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::Value;

pub const ACTION: &str = "action";
pub const ACTIVATE: &str = "activate";
pub const PASSIVATE: &str = "passivate";
pub const PREPARE_FOR_RENDER: &str = "prepareForRender";
pub const PREPARE_FOR_SUBMIT: &str = "prepareForSubmit";
pub const PREPARE: &str = "prepare";
pub const VALIDATE: &str = "validate";
pub const SUCCESS: &str = "success";
pub const FAILURE: &str = "failure";
pub const SUBMIT: &str = "submit";
pub const DECORATE_COMPONENT_EVENT_LINK: &str = "decorateComponentEventLink";
pub const DECORATE_PAGE_RENDER_LINK: &str = "decoratePageRenderLink";

/// One event travelling through a component and its containers.
#[derive(Debug, Clone)]
pub struct ComponentEvent {
    event_type: String,
    origin: String,
    context: Vec<Value>,
    result: Option<Value>,
    aborted: bool,
    handled: bool,
    body: Option<Value>,
}

impl ComponentEvent {
    pub fn new(event_type: impl Into<String>, context: Vec<Value>) -> Self {
        Self {
            event_type: event_type.into(),
            origin: String::new(),
            context,
            result: None,
            aborted: false,
            handled: false,
            body: None,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Id of the component the event arrived from; empty while on the triggering component.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = origin.into();
    }

    pub fn context(&self) -> &[Value] {
        &self.context
    }

    /// True when the event has the given type and comes from `component_id` (empty matches
    /// any origin) with at least `min_context` context values. Comparisons ignore case.
    pub fn matches(&self, event_type: &str, component_id: &str, min_context: usize) -> bool {
        self.event_type.eq_ignore_ascii_case(event_type)
            && (component_id.is_empty() || self.origin.eq_ignore_ascii_case(component_id))
            && self.context.len() >= min_context
    }

    /// Stores a handler's return value. A non-null value aborts the event.
    pub fn store_result(&mut self, value: Value, method: &str) -> TapestryResult<()> {
        if self.aborted {
            return Err(TapestryError::event_handler(
                method,
                format!(
                    "event '{}' has already been aborted; its result may not be replaced",
                    self.event_type
                ),
            ));
        }
        if value.is_null() {
            return Ok(());
        }
        tracing::trace!(event = %self.event_type, method, "event aborted by handler result");
        self.result = Some(value);
        self.aborted = true;
        Ok(())
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// True once any handler method was invoked for the event.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    pub(crate) fn cached_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub(crate) fn cache_body(&mut self, body: Value) {
        self.body = Some(body);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/event.rs"]
mod tests;
