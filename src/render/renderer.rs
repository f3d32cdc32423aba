use crate::dispatch::event::ComponentEvent;
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::ElementIdx;
use crate::foundation::value::Value;
use crate::model::render_phase::RenderPhase;
use crate::page::context::ComponentContext;
use crate::page::tree::{Page, PageElement, TemplateNode};
use crate::runtime::context::RequestContext;

/// Counters collected while rendering one page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub elements_rendered: u64,
    pub phase_invocations: u64,
}

/// Renders the page root and, through its template, every component reached from it.
///
/// Markup goes to the request's writer. Each element walks the render phases:
///
/// - `SetupRender` false skips to `CleanupRender`; `CleanupRender` false loops back to
///   `SetupRender`.
/// - `BeginRender` false skips to `AfterRender`; `AfterRender` false loops back to `BeginRender`.
/// - `BeforeRenderTemplate` false skips the template; `AfterRenderTemplate` false renders it
///   again.
/// - `BeforeRenderBody` false skips the body; `AfterRenderBody` false renders it again.
pub fn render_page(page: &Page, rc: &mut RequestContext) -> TapestryResult<RenderStats> {
    let mut stats = RenderStats::default();
    render_element(page, rc, ElementIdx::ROOT, &mut stats)?;
    tracing::debug!(
        page = %page.name,
        elements = stats.elements_rendered,
        phases = stats.phase_invocations,
        "page rendered"
    );
    Ok(stats)
}

/// Renders a single element. Rendering flags and post-render cleanup are applied even when
/// a phase fails.
pub fn render_element(
    page: &Page,
    rc: &mut RequestContext,
    idx: ElementIdx,
    stats: &mut RenderStats,
) -> TapestryResult<()> {
    let element = page.element(idx)?;
    stats.elements_rendered += 1;
    for instance in element.instances() {
        rc.set_rendering(instance.resources().instance, true);
    }
    let outcome = run_phases(page, rc, idx, element, stats);
    for instance in element.instances() {
        rc.set_rendering(instance.resources().instance, false);
    }
    let cleanup = post_render_cleanup(page, rc, element);
    outcome.and(cleanup)
}

fn run_phases(
    page: &Page,
    rc: &mut RequestContext,
    idx: ElementIdx,
    element: &PageElement,
    stats: &mut RenderStats,
) -> TapestryResult<()> {
    loop {
        if phase(page, rc, element, RenderPhase::SetupRender, stats)? {
            loop {
                if phase(page, rc, element, RenderPhase::BeginRender, stats)? {
                    loop {
                        if phase(page, rc, element, RenderPhase::BeforeRenderTemplate, stats)? {
                            render_nodes(page, rc, idx, &element.template, stats)?;
                        }
                        if phase(page, rc, element, RenderPhase::AfterRenderTemplate, stats)? {
                            break;
                        }
                    }
                }
                if phase(page, rc, element, RenderPhase::AfterRender, stats)? {
                    break;
                }
            }
        }
        if phase(page, rc, element, RenderPhase::CleanupRender, stats)? {
            return Ok(());
        }
    }
}

fn render_body(
    page: &Page,
    rc: &mut RequestContext,
    element: &PageElement,
    stats: &mut RenderStats,
) -> TapestryResult<()> {
    // Body content belongs to the container's template.
    let owner = element.container.unwrap_or(ElementIdx::ROOT);
    loop {
        if phase(page, rc, element, RenderPhase::BeforeRenderBody, stats)? {
            render_nodes(page, rc, owner, &element.body, stats)?;
        }
        if phase(page, rc, element, RenderPhase::AfterRenderBody, stats)? {
            return Ok(());
        }
    }
}

/// Invokes one phase on every participant of the element: mixins and core in order for
/// before-style phases, reversed for after-style ones. Returns false when a method returned
/// boolean false.
fn phase(
    page: &Page,
    rc: &mut RequestContext,
    element: &PageElement,
    phase: RenderPhase,
    stats: &mut RenderStats,
) -> TapestryResult<bool> {
    let mut event = ComponentEvent::new(phase.method_name(), Vec::new());
    let mut participants = element.participants.clone();
    if phase.is_after() {
        participants.reverse();
    }
    for locator in participants {
        if event.is_aborted() {
            break;
        }
        let instance = page.instance(locator)?;
        if !instance.class().model().handles_render_phase(phase) {
            continue;
        }
        stats.phase_invocations += 1;
        let mut ctx = ComponentContext::new(page, locator, rc);
        instance.class().invoke_phase(&mut ctx, phase, &mut event)?;
    }
    match event.take_result() {
        None | Some(Value::Bool(true)) => Ok(true),
        Some(Value::Bool(false)) => Ok(false),
        Some(other) => Err(TapestryError::render(
            &element.complete_id,
            format!(
                "render phase {} returned a {} value; only booleans are allowed",
                phase.method_name(),
                other.kind()
            ),
        )),
    }
}

fn render_nodes(
    page: &Page,
    rc: &mut RequestContext,
    owner: ElementIdx,
    nodes: &[TemplateNode],
    stats: &mut RenderStats,
) -> TapestryResult<()> {
    for node in nodes {
        match node {
            TemplateNode::Text(text) => rc.writer().write(text),
            TemplateNode::Element {
                name,
                attributes,
                children,
            } => {
                let attributes: Vec<(&str, &str)> = attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                rc.writer().element(name, &attributes);
                render_nodes(page, rc, owner, children, stats)?;
                rc.writer().end()?;
            }
            TemplateNode::Expansion(binding) => {
                let owner_locator = page.element(owner)?.core.resources().locator;
                let value = {
                    let mut ctx = ComponentContext::new(page, owner_locator, rc);
                    binding.get(&mut ctx)?
                };
                rc.writer().write(&value.to_client_string());
            }
            TemplateNode::Component(child) => render_element(page, rc, *child, stats)?,
            TemplateNode::Body => render_body(page, rc, page.element(owner)?, stats)?,
        }
    }
    Ok(())
}

fn post_render_cleanup(
    page: &Page,
    rc: &mut RequestContext,
    element: &PageElement,
) -> TapestryResult<()> {
    for instance in element.instances() {
        let mut ctx = ComponentContext::new(page, instance.resources().locator, rc);
        for listener in instance.listeners() {
            listener.post_render_cleanup(&mut ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
