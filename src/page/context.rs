use std::sync::Arc;

use crate::dispatch::event::ComponentEvent;
use crate::dispatch::link::Link;
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::{InstanceId, InstanceLocator};
use crate::foundation::value::Value;
use crate::page::instance::ComponentInstance;
use crate::page::resources::{COMPONENT_HANDLE, ComponentHandle, ComponentResources};
use crate::page::tree::{Page, PageElement};
use crate::runtime::context::RequestContext;
use crate::runtime::environment::Environment;
use crate::runtime::markup::MarkupWriter;
use crate::runtime::perthread::PerThreadValues;
use crate::runtime::services::Services;
use crate::transform::advice::invoke_advised;

/// Execution context handed to conduits, advice, bindings and method bodies: one component
/// instance of a page, plus the request being processed.
pub struct ComponentContext<'a> {
    page: &'a Page,
    locator: InstanceLocator,
    request: &'a mut RequestContext,
}

impl<'a> ComponentContext<'a> {
    pub fn new(page: &'a Page, locator: InstanceLocator, request: &'a mut RequestContext) -> Self {
        Self {
            page,
            locator,
            request,
        }
    }

    /// Context for another instance of the same page and request.
    pub fn at(&mut self, locator: InstanceLocator) -> ComponentContext<'_> {
        ComponentContext {
            page: self.page,
            locator,
            request: &mut *self.request,
        }
    }

    pub fn for_handle(&mut self, handle: &ComponentHandle) -> TapestryResult<ComponentContext<'_>> {
        if !handle.page.eq_ignore_ascii_case(&self.page.name) {
            return Err(TapestryError::config(format!(
                "component {} belongs to page '{}', not '{}'",
                handle.complete_id, handle.page, self.page.name
            )));
        }
        Ok(self.at(handle.locator))
    }

    pub fn page(&self) -> &'a Page {
        self.page
    }

    pub fn locator(&self) -> InstanceLocator {
        self.locator
    }

    pub fn element(&self) -> TapestryResult<&'a PageElement> {
        self.page.element(self.locator.element)
    }

    pub fn instance(&self) -> TapestryResult<&'a ComponentInstance> {
        self.page.instance(self.locator)
    }

    pub fn resources(&self) -> TapestryResult<&'a Arc<ComponentResources>> {
        Ok(self.instance()?.resources())
    }

    pub fn instance_id(&self) -> TapestryResult<InstanceId> {
        Ok(self.resources()?.instance)
    }

    pub fn complete_id(&self) -> String {
        self.resources()
            .map(|r| r.complete_id.clone())
            .unwrap_or_else(|_| self.page.name.clone())
    }

    pub fn request(&mut self) -> &mut RequestContext {
        &mut *self.request
    }

    pub fn services(&self) -> Arc<Services> {
        self.request.services().clone()
    }

    pub fn per_thread(&mut self) -> &mut PerThreadValues {
        self.request.values_mut()
    }

    pub fn environment(&self) -> &Environment {
        self.request.environment()
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        self.request.environment_mut()
    }

    pub fn writer(&mut self) -> &mut dyn MarkupWriter {
        self.request.writer()
    }

    /// True between this instance's setup-render and cleanup-render phases.
    pub fn is_rendering(&self) -> bool {
        self.instance_id()
            .is_ok_and(|id| self.request.is_rendering(id))
    }

    pub fn read_field(&mut self, field: &str) -> TapestryResult<Value> {
        let conduit = self.instance()?.conduit(field)?;
        conduit.get(self)
    }

    pub fn write_field(&mut self, field: &str, value: Value) -> TapestryResult<()> {
        let conduit = self.instance()?.conduit(field)?;
        conduit.set(self, value)
    }

    /// Reads a dotted property path. The first segment resolves to a `get`/`is` accessor
    /// method or a field; later segments index into maps and lists or step into injected
    /// components.
    pub fn read_property(&mut self, path: &str) -> TapestryResult<Value> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut value = self.read_property_segment(first)?;
        for segment in segments {
            value = match value {
                Value::Map(mut m) => m.remove(segment).unwrap_or(Value::Null),
                Value::List(items) => {
                    let idx: usize = segment.parse().map_err(|_| {
                        self.property_error(path, format!("'{segment}' is not a list index"))
                    })?;
                    items.into_iter().nth(idx).unwrap_or(Value::Null)
                }
                Value::Object(ref o) if o.type_name() == COMPONENT_HANDLE => {
                    let handle = o.downcast::<ComponentHandle>().ok_or_else(|| {
                        self.property_error(path, "component handle of unexpected type")
                    })?;
                    self.for_handle(&handle)?.read_property_segment(segment)?
                }
                Value::Null => {
                    return Err(self.property_error(
                        path,
                        format!("property '{segment}' is read from a null value"),
                    ));
                }
                other => {
                    return Err(self.property_error(
                        path,
                        format!("a {} has no property '{segment}'", other.kind()),
                    ));
                }
            };
        }
        Ok(value)
    }

    pub fn write_property(&mut self, path: &str, value: Value) -> TapestryResult<()> {
        match path.rsplit_once('.') {
            None => self.write_property_segment(path, value),
            Some((head, last)) => match self.read_property(head)? {
                Value::Object(o) if o.type_name() == COMPONENT_HANDLE => {
                    let handle = o.downcast::<ComponentHandle>().ok_or_else(|| {
                        self.property_error(path, "component handle of unexpected type")
                    })?;
                    self.for_handle(&handle)?.write_property_segment(last, value)
                }
                _ => Err(self.property_error(path, "only the last segment of a path is writable")),
            },
        }
    }

    fn read_property_segment(&mut self, name: &str) -> TapestryResult<Value> {
        let class = self.instance()?.class().clone();
        let cap = capitalize(name);
        for getter in [format!("get{cap}"), format!("is{cap}")] {
            if let Some(method) = class.find_method(&getter) {
                if method.def.params.is_empty() {
                    let method = method.clone();
                    return Ok(invoke_advised(self, &method, Vec::new())?.unwrap_or(Value::Null));
                }
            }
        }
        if self.instance()?.has_field(name) {
            return self.read_field(name);
        }
        Err(self.property_error(
            name,
            format!("class {} does not contain a property named '{name}'", class.name()),
        ))
    }

    fn write_property_segment(&mut self, name: &str, value: Value) -> TapestryResult<()> {
        let class = self.instance()?.class().clone();
        if let Some(method) = class.find_method(&format!("set{}", capitalize(name))) {
            if method.def.params.len() == 1 {
                let method = method.clone();
                invoke_advised(self, &method, vec![value])?;
                return Ok(());
            }
        }
        if self.instance()?.has_field(name) {
            return self.write_field(name, value);
        }
        Err(self.property_error(
            name,
            format!("class {} does not contain a writable property named '{name}'", class.name()),
        ))
    }

    fn property_error(&self, path: &str, message: impl Into<String>) -> TapestryError {
        TapestryError::binding(self.complete_id(), path, message)
    }

    /// Invokes a method by name; the most derived declaration wins.
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> TapestryResult<Option<Value>> {
        let class = self.instance()?.class().clone();
        let advised = class.find_method(method).cloned().ok_or_else(|| {
            TapestryError::transform(class.name(), format!("no method '{method}'"))
        })?;
        invoke_advised(self, &advised, args)
    }

    pub fn is_bound(&self, parameter: &str) -> bool {
        self.resources().is_ok_and(|r| r.is_bound(parameter))
    }

    pub fn read_parameter(&mut self, parameter: &str) -> TapestryResult<Value> {
        let field = self.parameter_field(parameter)?;
        self.read_field(&field)
    }

    pub fn write_parameter(&mut self, parameter: &str, value: Value) -> TapestryResult<()> {
        let field = self.parameter_field(parameter)?;
        self.write_field(&field, value)
    }

    fn parameter_field(&self, parameter: &str) -> TapestryResult<String> {
        let instance = self.instance()?;
        instance
            .class()
            .parameter_field(parameter)
            .map(str::to_string)
            .ok_or_else(|| {
                TapestryError::binding(
                    &instance.resources().complete_id,
                    parameter,
                    format!("{} has no formal parameter '{parameter}'", instance.class().name()),
                )
            })
    }

    pub fn core_locator(&self) -> InstanceLocator {
        InstanceLocator::core(self.locator.element)
    }

    /// Core component of the containing element; `None` for the page itself.
    pub fn container_locator(&self) -> Option<InstanceLocator> {
        if self.locator.is_mixin() {
            return Some(self.core_locator());
        }
        self.element()
            .ok()
            .and_then(|e| e.container)
            .map(InstanceLocator::core)
    }

    pub fn handle(&self) -> TapestryResult<ComponentHandle> {
        self.page.handle(self.locator)
    }

    /// Handle of an embedded component of this component.
    pub fn child_handle(&self, id: &str) -> TapestryResult<ComponentHandle> {
        let element = self.element()?;
        let child = element
            .children
            .iter()
            .copied()
            .find(|c| {
                self.page
                    .element(*c)
                    .is_ok_and(|e| e.id.eq_ignore_ascii_case(id))
            })
            .ok_or_else(|| {
                TapestryError::config(format!(
                    "component {} does not contain an embedded component with id '{id}'",
                    element.complete_id
                ))
            })?;
        self.page.handle(InstanceLocator::core(child))
    }

    /// Handle of a mixin attached to this component's element, by mixin id.
    pub fn mixin_handle(&self, mixin_id: &str) -> TapestryResult<ComponentHandle> {
        let element = self.element()?;
        let index = element
            .mixins
            .iter()
            .position(|(id, _)| id.eq_ignore_ascii_case(mixin_id))
            .ok_or_else(|| {
                TapestryError::config(format!(
                    "component {} has no mixin '{mixin_id}'",
                    element.complete_id
                ))
            })?;
        self.page
            .handle(InstanceLocator::mixin(self.locator.element, index as u16))
    }

    /// Triggers an event on this component's element; it bubbles up through the containers
    /// until a handler aborts it.
    pub fn trigger_event(
        &mut self,
        event_type: &str,
        context: Vec<Value>,
    ) -> TapestryResult<ComponentEvent> {
        self.page
            .trigger_event(&mut *self.request, self.locator.element, event_type, context)
    }

    pub fn create_event_link(&mut self, event_type: &str, context: &[Value]) -> TapestryResult<Arc<Link>> {
        self.page
            .create_event_link(&mut *self.request, self.locator, event_type, context)
    }
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/context.rs"]
mod tests;
