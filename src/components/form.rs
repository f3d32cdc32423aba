use std::sync::Arc;

use crate::components::{LIBRARY, open_element, parameter, phase_method};
use crate::dispatch::event::{
    ACTION, FAILURE, PREPARE, PREPARE_FOR_RENDER, PREPARE_FOR_SUBMIT, SUBMIT, SUCCESS, VALIDATE,
};
use crate::form::action_stream::ActionReader;
use crate::form::support::FormSupport;
use crate::form::tracker::{VALIDATION_TRACKER, ValidationTracker};
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ClassDef, ClassKind, FieldDef, MethodDef, ParameterAnn};
use crate::page::context::ComponentContext;
use crate::runtime::heartbeat::Heartbeat;
use crate::transform::component_class::ComponentClass;

const TRACKER_FIELD: &str = "defaultTracker";

/// HTML form that records the actions of the fields it encloses and replays them when the
/// form is submitted.
///
/// Rendering fires `prepareForRender` and `prepare`, then writes the form element with the
/// action link parameters as hidden fields. A handler result at either render event is an
/// error. After the body it writes the encoded action
/// stream to the form data field.
///
/// Submission fires `prepareForSubmit` and `prepare`, replays the recorded actions, fires
/// `validate` and then `success` or `failure`, and finally `submit`. A handler result at any
/// of these events ends the submission with that result. The validation tracker of a failed
/// submission is kept in flash scope so the redirected render can show its errors.
pub fn form_class() -> ComponentClass {
    let def = ClassDef::new("core.components.Form", ClassKind::Component)
        .library(LIBRARY)
        .field(parameter("context", ValueType::List, ParameterAnn::default()))
        .field(
            FieldDef::new(TRACKER_FIELD, ValueType::Object(VALIDATION_TRACKER.into())).with(
                Annotation::Persist {
                    strategy: Some("flash".into()),
                },
            ),
        )
        .method(phase_method("beginRender"))
        .method(phase_method("afterRender"))
        .method(MethodDef::new("onAction").param("context", ValueType::EventContext));

    ComponentClass::new(def)
        .body("beginRender", |ctx, _| begin_render(ctx).map(|_| None))
        .body("afterRender", |ctx, _| after_render(ctx).map(|_| None))
        .body("onAction", |ctx, args| {
            let context = match args.first() {
                Some(Value::List(items)) => items.clone(),
                _ => Vec::new(),
            };
            on_action(ctx, &context).map(Some)
        })
}

fn form_context(ctx: &mut ComponentContext<'_>) -> TapestryResult<Vec<Value>> {
    Ok(match ctx.read_parameter("context")? {
        Value::List(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

fn hidden(ctx: &mut ComponentContext<'_>, name: &str, value: &str) -> TapestryResult<()> {
    ctx.writer()
        .element("input", &[("type", "hidden"), ("name", name), ("value", value)]);
    ctx.writer().end()
}

/// The tracker of the previous, failed submission if one was kept, otherwise a fresh one.
fn stored_tracker(ctx: &mut ComponentContext<'_>) -> TapestryResult<Arc<ValidationTracker>> {
    Ok(ctx
        .read_field(TRACKER_FIELD)?
        .as_object::<ValidationTracker>()
        .unwrap_or_else(|| Arc::new(ValidationTracker::new())))
}

fn begin_render(ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
    let id = ctx.resources()?.id.clone();
    let complete_id = ctx.complete_id();
    let client_id = ctx.request().allocate_client_id(&id);
    let tracker = stored_tracker(ctx)?;
    let support = Arc::new(FormSupport::new(client_id.as_str(), complete_id.as_str()));
    ctx.environment_mut().push(support);
    ctx.environment_mut().push(tracker.clone());

    let context = form_context(ctx)?;
    for event in [PREPARE_FOR_RENDER, PREPARE] {
        if fire(ctx, event, &context)?.is_some() {
            return Err(TapestryError::render(
                &complete_id,
                format!(
                    "a handler for the {event} event returned a value; render-time form events \
                     take no result"
                ),
            ));
        }
    }

    let link = ctx.create_event_link(ACTION, &context)?;
    open_element(
        ctx,
        "form",
        &[
            ("id".to_string(), client_id),
            ("method".to_string(), "post".to_string()),
            ("action".to_string(), link.base().to_string()),
        ],
    );
    for (name, value) in link.parameters() {
        hidden(ctx, &name, &value)?;
    }

    let errors = tracker.errors();
    if !errors.is_empty() {
        ctx.writer().element("div", &[("class", "t-error")]);
        ctx.writer().element("ul", &[]);
        for message in &errors {
            ctx.writer().element("li", &[]);
            ctx.writer().write(message);
            ctx.writer().end()?;
        }
        ctx.writer().end()?;
        ctx.writer().end()?;
    }

    let heartbeat = Arc::new(Heartbeat::new());
    heartbeat.begin();
    ctx.environment_mut().push(heartbeat);
    Ok(())
}

fn after_render(ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
    let heartbeat = ctx.environment().peek_required::<Heartbeat>()?;
    heartbeat.end(ctx)?;
    ctx.environment_mut().pop::<Heartbeat>()?;
    ctx.environment_mut().pop::<ValidationTracker>()?;
    let support = ctx.environment_mut().pop::<FormSupport>()?;

    if let Some(encoding_type) = support.encoding_type() {
        if let Some(form) = ctx.writer().current() {
            ctx.writer().attributes(form, &[("enctype", encoding_type.as_str())]);
        }
    }
    let services = ctx.services();
    let data = support.encode_actions(services.client_data())?;
    hidden(ctx, &services.settings().form_data_parameter, &data)?;
    ctx.writer().end()
}

/// Handles the form's own `action` event. Environment entries pushed here are popped even
/// when the submission fails.
fn on_action(ctx: &mut ComponentContext<'_>, context: &[Value]) -> TapestryResult<Value> {
    let id = ctx.resources()?.id.clone();
    let complete_id = ctx.complete_id();
    let support = Arc::new(FormSupport::new(id.as_str(), complete_id.as_str()));
    let tracker = Arc::new(ValidationTracker::new());
    let heartbeat = Arc::new(Heartbeat::new());
    ctx.environment_mut().push(support.clone());
    ctx.environment_mut().push(tracker.clone());
    ctx.environment_mut().push(heartbeat.clone());
    heartbeat.begin();

    let outcome = submit(ctx, context, &support, &tracker, &heartbeat);

    let env = ctx.environment_mut();
    let heartbeat_popped = env.pop::<Heartbeat>();
    let tracker_popped = env.pop::<ValidationTracker>();
    let support_popped = env.pop::<FormSupport>();
    let result = outcome?;
    heartbeat_popped?;
    tracker_popped?;
    support_popped?;
    Ok(result.unwrap_or(Value::Bool(true)))
}

#[tracing::instrument(skip_all, fields(form = %support.form_id()))]
fn submit(
    ctx: &mut ComponentContext<'_>,
    context: &[Value],
    support: &FormSupport,
    tracker: &Arc<ValidationTracker>,
    heartbeat: &Heartbeat,
) -> TapestryResult<Option<Value>> {
    for event in [PREPARE_FOR_SUBMIT, PREPARE] {
        if let Some(result) = fire(ctx, event, context)? {
            return Ok(Some(result));
        }
    }

    execute_actions(ctx)?;
    heartbeat.end(ctx)?;
    support.execute_deferred(ctx)?;

    match ctx.trigger_event(VALIDATE, context.to_vec()) {
        Ok(mut event) if event.is_aborted() => return Ok(event.take_result()),
        Ok(_) => {}
        Err(TapestryError::Validation(message)) => tracker.record_form_error(message),
        Err(e) => return Err(e),
    }

    let failed = tracker.has_errors();
    if failed {
        tracing::debug!(errors = tracker.errors().len(), "form submission failed validation");
        ctx.write_field(TRACKER_FIELD, Value::object(VALIDATION_TRACKER, tracker.clone()))?;
    }
    let outcome = if failed { FAILURE } else { SUCCESS };
    for event in [outcome, SUBMIT] {
        if let Some(result) = fire(ctx, event, context)? {
            return Ok(Some(result));
        }
    }
    Ok(None)
}

fn fire(
    ctx: &mut ComponentContext<'_>,
    event_type: &str,
    context: &[Value],
) -> TapestryResult<Option<Value>> {
    let mut event = ctx.trigger_event(event_type, context.to_vec())?;
    Ok(if event.is_aborted() {
        event.take_result()
    } else {
        None
    })
}

/// Replays every action stream submitted with the form, in the order received. Failures are
/// reported with the complete id and template location of the component whose action failed.
fn execute_actions(ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
    let services = ctx.services();
    let streams = ctx
        .request()
        .request()
        .parameters(&services.settings().form_data_parameter);
    for raw in streams {
        let bytes = services.client_data().decode(&raw)?;
        let mut reader = ActionReader::new(&bytes);
        while let Some(entry) = reader.next_entry()? {
            let component_id = entry.component_id;
            tracing::trace!(component = %component_id, method = %entry.action.method, "replaying form action");
            let page = ctx.page();
            let locator = page
                .locate(&component_id)
                .map_err(|e| TapestryError::replay(&component_id, e))?;
            let location = format!(
                "{component_id} ({})",
                page.element(locator.element)?.location
            );
            ctx.at(locator)
                .invoke(&entry.action.method, entry.action.args)
                .map_err(|e| TapestryError::replay(location, e))?;
        }
    }
    Ok(())
}
