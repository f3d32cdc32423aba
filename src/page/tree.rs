use std::sync::Arc;

use smallvec::SmallVec;

use crate::dispatch::event::{
    self, ComponentEvent, DECORATE_COMPONENT_EVENT_LINK, DECORATE_PAGE_RENDER_LINK,
};
use crate::dispatch::link::{ACTIVATION_CONTEXT_PARAMETER, LINK, Link, encode_context};
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::{ElementIdx, InstanceLocator};
use crate::foundation::value::Value;
use crate::page::binding::Binding;
use crate::page::context::ComponentContext;
use crate::page::instance::ComponentInstance;
use crate::page::lifecycle::LifecyclePoint;
use crate::page::resources::ComponentHandle;
use crate::runtime::context::{CLIENT_STATE_PARAMETER, RequestContext};
use crate::runtime::services::Services;

/// Renderable content of a template or of a component body.
pub enum TemplateNode {
    Text(String),
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<TemplateNode>,
    },
    Component(ElementIdx),
    Expansion(Arc<dyn Binding>),
    /// Where the body supplied by the container renders.
    Body,
}

/// One component of a page together with the mixins attached to it.
pub struct PageElement {
    pub id: String,
    pub nested_id: String,
    pub complete_id: String,
    /// Template location of the element, or the owning class when none was given.
    pub location: String,
    pub container: Option<ElementIdx>,
    /// Embedded components, in creation order.
    pub children: Vec<ElementIdx>,
    pub core: ComponentInstance,
    /// Mixin id and instance.
    pub mixins: Vec<(String, ComponentInstance)>,
    /// Instances that receive events and render phases, in order.
    pub participants: SmallVec<[InstanceLocator; 2]>,
    pub template: Vec<TemplateNode>,
    pub body: Vec<TemplateNode>,
}

impl PageElement {
    /// Instances in creation order: the core first, then its mixins.
    pub fn instances(&self) -> impl Iterator<Item = &ComponentInstance> {
        std::iter::once(&self.core).chain(self.mixins.iter().map(|(_, m)| m))
    }
}

/// An assembled page: a tree of elements rooted at the page component.
pub struct Page {
    pub name: String,
    pub class_name: String,
    pub(crate) elements: Vec<PageElement>,
    pub(crate) services: Arc<Services>,
}

impl Page {
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn element(&self, idx: ElementIdx) -> TapestryResult<&PageElement> {
        self.elements.get(idx.index()).ok_or_else(|| {
            TapestryError::config(format!("page {} has no element #{}", self.name, idx.0))
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementIdx, &PageElement)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementIdx(i as u32), e))
    }

    pub fn instance(&self, locator: InstanceLocator) -> TapestryResult<&ComponentInstance> {
        let element = self.element(locator.element)?;
        match locator.mixin {
            None => Ok(&element.core),
            Some(i) => element
                .mixins
                .get(usize::from(i))
                .map(|(_, m)| m)
                .ok_or_else(|| {
                    TapestryError::config(format!(
                        "component {} has no mixin #{i}",
                        element.complete_id
                    ))
                }),
        }
    }

    pub fn handle(&self, locator: InstanceLocator) -> TapestryResult<ComponentHandle> {
        Ok(ComponentHandle {
            page: self.name.clone(),
            locator,
            complete_id: self.instance(locator)?.resources().complete_id.clone(),
        })
    }

    pub fn element_by_nested_id(&self, nested_id: &str) -> TapestryResult<ElementIdx> {
        self.elements()
            .find(|(_, e)| e.nested_id.eq_ignore_ascii_case(nested_id))
            .map(|(i, _)| i)
            .ok_or_else(|| {
                TapestryError::config(format!(
                    "page {} does not contain a component with id '{nested_id}'",
                    self.name
                ))
            })
    }

    /// Locates an instance by complete id, `Page:a.b` or `Page:a.b$mixin`.
    pub fn locate(&self, complete_id: &str) -> TapestryResult<InstanceLocator> {
        let nested = match complete_id.split_once(':') {
            Some((page, nested)) if page.eq_ignore_ascii_case(&self.name) => nested,
            None if complete_id.eq_ignore_ascii_case(&self.name) => "",
            _ => {
                return Err(TapestryError::config(format!(
                    "component id '{complete_id}' does not belong to page {}",
                    self.name
                )));
            }
        };
        let (nested, mixin) = match nested.split_once('$') {
            Some((n, m)) => (n, Some(m)),
            None => (nested, None),
        };
        let element = self.element_by_nested_id(nested)?;
        let Some(mixin) = mixin else {
            return Ok(InstanceLocator::core(element));
        };
        let index = self
            .element(element)?
            .mixins
            .iter()
            .position(|(id, _)| id.eq_ignore_ascii_case(mixin))
            .ok_or_else(|| {
                TapestryError::config(format!("no mixin '{mixin}' on component {complete_id}"))
            })?;
        Ok(InstanceLocator::mixin(element, index as u16))
    }

    /// Triggers an event on an element. Each participant dispatches in turn; unless a handler
    /// aborts, the event then bubbles to the container with the element's id as origin.
    pub fn trigger_event(
        &self,
        rc: &mut RequestContext,
        element: ElementIdx,
        event_type: &str,
        context: Vec<Value>,
    ) -> TapestryResult<ComponentEvent> {
        let mut event = ComponentEvent::new(event_type, context);
        let mut current = Some(element);
        let mut origin = String::new();
        while let Some(idx) = current {
            let el = self.element(idx)?;
            event.set_origin(origin.as_str());
            tracing::trace!(
                event = event_type,
                component = %el.complete_id,
                origin = %origin,
                "dispatching event"
            );
            for locator in &el.participants {
                let class = self.instance(*locator)?.class().clone();
                let mut ctx = ComponentContext::new(self, *locator, rc);
                class.dispatch(&mut ctx, &mut event)?;
                if event.is_aborted() {
                    return Ok(event);
                }
            }
            origin = el.id.clone();
            current = el.container;
        }
        Ok(event)
    }

    pub fn activate(
        &self,
        rc: &mut RequestContext,
        context: Vec<Value>,
    ) -> TapestryResult<ComponentEvent> {
        self.trigger_event(rc, ElementIdx::ROOT, event::ACTIVATE, context)
    }

    /// Collects the activation context a link to this page should carry.
    pub fn passivate(&self, rc: &mut RequestContext) -> TapestryResult<Vec<Value>> {
        let mut event = self.trigger_event(rc, ElementIdx::ROOT, event::PASSIVATE, Vec::new())?;
        Ok(match event.take_result() {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::List(items)) => items,
            Some(other) => vec![other],
        })
    }

    pub fn create_event_link(
        &self,
        rc: &mut RequestContext,
        locator: InstanceLocator,
        event_type: &str,
        context: &[Value],
    ) -> TapestryResult<Arc<Link>> {
        let element = self.element(locator.element)?;
        let mut base = format!("/{}", self.name.to_ascii_lowercase());
        if !element.nested_id.is_empty() {
            base.push('.');
            base.push_str(&element.nested_id.to_ascii_lowercase());
        }
        if element.nested_id.is_empty() || !event_type.eq_ignore_ascii_case(event::ACTION) {
            base.push(':');
            base.push_str(&event_type.to_ascii_lowercase());
        }
        if !context.is_empty() {
            base.push('/');
            base.push_str(&encode_context(context));
        }
        let link = Arc::new(Link::new(base));
        let activation = self.passivate(rc)?;
        if !activation.is_empty() {
            link.add_parameter(ACTIVATION_CONTEXT_PARAMETER, encode_context(&activation));
        }
        self.finish_link(rc, &link, DECORATE_COMPONENT_EVENT_LINK)?;
        Ok(link)
    }

    pub fn create_page_render_link(&self, rc: &mut RequestContext) -> TapestryResult<Arc<Link>> {
        let mut base = format!("/{}", self.name.to_ascii_lowercase());
        let activation = self.passivate(rc)?;
        if !activation.is_empty() {
            base.push('/');
            base.push_str(&encode_context(&activation));
        }
        let link = Arc::new(Link::new(base));
        self.finish_link(rc, &link, DECORATE_PAGE_RENDER_LINK)?;
        Ok(link)
    }

    fn finish_link(
        &self,
        rc: &mut RequestContext,
        link: &Arc<Link>,
        decorate_event: &str,
    ) -> TapestryResult<()> {
        if let Some(state) = rc.encoded_client_state()? {
            link.add_parameter(CLIENT_STATE_PARAMETER, state);
        }
        self.trigger_event(
            rc,
            ElementIdx::ROOT,
            decorate_event,
            vec![Value::object(LINK, link.clone())],
        )?;
        Ok(())
    }

    /// Runs did-load for every instance in creation order.
    pub(crate) fn did_load(&self, rc: &mut RequestContext) -> TapestryResult<()> {
        self.fire(rc, LifecyclePoint::Loaded)
    }

    pub fn attached(&self, rc: &mut RequestContext) -> TapestryResult<()> {
        self.fire(rc, LifecyclePoint::Attached)
    }

    pub fn detached(&self, rc: &mut RequestContext) -> TapestryResult<()> {
        self.fire(rc, LifecyclePoint::Detached)
    }

    pub fn reset(&self, rc: &mut RequestContext) -> TapestryResult<()> {
        self.fire(rc, LifecyclePoint::Reset)
    }

    fn fire(&self, rc: &mut RequestContext, point: LifecyclePoint) -> TapestryResult<()> {
        for element in &self.elements {
            for instance in element.instances() {
                let locator = instance.resources().locator;
                let mut ctx = ComponentContext::new(self, locator, rc);
                for listener in instance.listeners() {
                    match point {
                        LifecyclePoint::Loaded => listener.did_load(&mut ctx)?,
                        LifecyclePoint::Attached => listener.attached(&mut ctx)?,
                        LifecyclePoint::Detached => listener.detached(&mut ctx)?,
                        LifecyclePoint::Reset => listener.reset(&mut ctx)?,
                    }
                }
                instance.class().invoke_lifecycle(&mut ctx, point)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("class", &self.class_name)
            .field("elements", &self.elements.len())
            .finish()
    }
}
