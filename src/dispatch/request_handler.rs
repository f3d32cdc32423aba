use std::sync::Arc;

use crate::dispatch::event::ComponentEvent;
use crate::dispatch::link::{ACTIVATION_CONTEXT_PARAMETER, EventRequest, Link, RESET_PARAMETER, decode_context};
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::ElementIdx;
use crate::foundation::value::Value;
use crate::page::context::ComponentContext;
use crate::page::resources::PageHandle;
use crate::page::source::PageSource;
use crate::page::tree::Page;
use crate::render::render_page;
use crate::runtime::context::RequestContext;
use crate::runtime::heartbeat::Heartbeat;
use crate::runtime::request::{Request, Session};

/// Outcome of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Rendered page markup.
    Markup(String),
    /// Redirect to a page render or component event URI.
    Redirect(String),
}

/// Handles component event and page render requests against the loaded pages.
pub struct RequestHandler {
    pages: Arc<PageSource>,
}

impl RequestHandler {
    pub fn new(pages: Arc<PageSource>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &Arc<PageSource> {
        &self.pages
    }

    /// Parses the request path and routes it.
    pub fn handle(
        &self,
        request: Arc<dyn Request>,
        session: Arc<dyn Session>,
    ) -> TapestryResult<Response> {
        let services = self.pages.registry().services().clone();
        let mut rc = RequestContext::new(services, request.clone(), session)?;
        match EventRequest::parse(request.path())? {
            EventRequest::ComponentEvent {
                page,
                nested_id,
                event_type,
                context,
            } => self.handle_component_event(&mut rc, &page, &nested_id, &event_type, context),
            EventRequest::PageRender { page, context } => {
                self.handle_page_render(&mut rc, &page, context)
            }
        }
    }

    /// Activates the page from `t:ac`, triggers the event on the component and turns the
    /// handler result into a response. An event nobody handles is an error.
    #[tracing::instrument(skip(self, rc, context))]
    pub fn handle_component_event(
        &self,
        rc: &mut RequestContext,
        page_name: &str,
        nested_id: &str,
        event_type: &str,
        context: Vec<Value>,
    ) -> TapestryResult<Response> {
        let page = self.pages.get(page_name)?;
        with_attached(&page, rc, |rc| {
            let activation = match rc.request().parameter(ACTIVATION_CONTEXT_PARAMETER) {
                Some(raw) => decode_context(&raw)?,
                None => Vec::new(),
            };
            let mut activated = page.activate(rc, activation)?;
            if activated.is_aborted() {
                return self.respond(rc, &page, &mut activated);
            }

            let target = if nested_id.is_empty() {
                ElementIdx::ROOT
            } else {
                page.element_by_nested_id(nested_id)?
            };
            let mut event = page.trigger_event(rc, target, event_type, context)?;
            if !event.is_handled() {
                let complete_id = &page.element(target)?.complete_id;
                return Err(TapestryError::event_handler(
                    complete_id,
                    format!(
                        "request event '{event_type}' was not handled; a matching event handler \
                         method is required"
                    ),
                ));
            }
            self.respond(rc, &page, &mut event)
        })
    }

    /// Activates and renders the page inside a root heartbeat. `t:reset` resets the page first.
    #[tracing::instrument(skip(self, rc, context))]
    pub fn handle_page_render(
        &self,
        rc: &mut RequestContext,
        page_name: &str,
        context: Vec<Value>,
    ) -> TapestryResult<Response> {
        let page = self.pages.get(page_name)?;
        with_attached(&page, rc, |rc| {
            if rc.request().parameter(RESET_PARAMETER).is_some() {
                page.reset(rc)?;
            }
            let mut activated = page.activate(rc, context)?;
            if activated.is_aborted() {
                return self.respond(rc, &page, &mut activated);
            }

            let heartbeat = Arc::new(Heartbeat::new());
            rc.environment_mut().push(heartbeat.clone());
            heartbeat.begin();
            let rendered = render_page(&page, rc).and_then(|_| {
                let root = page.element(ElementIdx::ROOT)?.core.resources().locator;
                heartbeat.end(&mut ComponentContext::new(&page, root, rc))
            });
            let popped = rc.environment_mut().pop::<Heartbeat>();
            rendered?;
            popped?;
            Ok(Response::Markup(rc.markup()))
        })
    }

    /// Maps an event result: nothing redirects back to the page, a page name or page handle
    /// redirects to that page, a link redirects to itself.
    fn respond(
        &self,
        rc: &mut RequestContext,
        page: &Page,
        event: &mut ComponentEvent,
    ) -> TapestryResult<Response> {
        let result = event.take_result().unwrap_or(Value::Null);
        let link = match &result {
            Value::Null | Value::Bool(true) => page.create_page_render_link(rc)?,
            Value::Str(name) => self.page_link(rc, page, name)?,
            other => {
                if let Some(link) = other.as_object::<Link>() {
                    link
                } else if let Some(handle) = other.as_object::<PageHandle>() {
                    self.page_link(rc, page, &handle.name)?
                } else {
                    return Err(TapestryError::event_handler(
                        event.event_type(),
                        format!(
                            "a {} value is not a supported event handler result",
                            other.kind()
                        ),
                    ));
                }
            }
        };
        Ok(Response::Redirect(link.to_uri()))
    }

    fn page_link(
        &self,
        rc: &mut RequestContext,
        current: &Page,
        name: &str,
    ) -> TapestryResult<Arc<Link>> {
        if current.name.eq_ignore_ascii_case(name) {
            return current.create_page_render_link(rc);
        }
        let target = self.pages.get(name)?;
        with_attached(&target, rc, |rc| target.create_page_render_link(rc))
    }
}

/// Runs `f` with the page attached; the page is detached afterwards even if `f` fails.
fn with_attached<R>(
    page: &Page,
    rc: &mut RequestContext,
    f: impl FnOnce(&mut RequestContext) -> TapestryResult<R>,
) -> TapestryResult<R> {
    page.attached(rc)?;
    let outcome = f(rc);
    let detached = page.detached(rc);
    let value = outcome?;
    detached?;
    Ok(value)
}
