use crate::components::{LIBRARY, informal_attributes, open_element, parameter, phase_method};
use crate::dispatch::event::VALIDATE;
use crate::form::action_stream::ComponentAction;
use crate::form::support::FormSupport;
use crate::form::tracker::ValidationTracker;
use crate::form::validation::{FieldValidator, validate_all};
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ClassDef, ClassKind, FieldDef, MethodDef, ParameterAnn};
use crate::page::context::{ComponentContext, capitalize};
use crate::transform::component_class::ComponentClass;

const SETUP_CONTROL_NAME: &str = "setupControlName";
const PROCESS_SUBMISSION: &str = "processSubmission";

/// Single-line text input bound to `value`.
///
/// Rendering records two form actions: one restoring the control name and one processing the
/// submitted input. Submitted input is kept in the tracker so a failed submission re-renders
/// what the user typed.
pub fn text_field_class() -> ComponentClass {
    let def = ClassDef::new("core.components.TextField", ClassKind::Component)
        .library(LIBRARY)
        .with(Annotation::SupportsInformalParameters)
        .field(parameter(
            "value",
            ValueType::Any,
            ParameterAnn {
                required: true,
                principal: true,
                autoconnect: true,
                ..ParameterAnn::default()
            },
        ))
        .field(parameter(
            "validate",
            ValueType::Str,
            ParameterAnn {
                default_prefix: Some("validate".into()),
                ..ParameterAnn::default()
            },
        ))
        .field(parameter(
            "label",
            ValueType::Str,
            ParameterAnn {
                default_prefix: Some("literal".into()),
                ..ParameterAnn::default()
            },
        ))
        .field(parameter(
            "disabled",
            ValueType::Bool,
            ParameterAnn {
                allow_null: false,
                ..ParameterAnn::default()
            },
        ))
        .field(FieldDef::new("controlName", ValueType::Str))
        .method(phase_method("beginRender"))
        .method(phase_method("afterRender"))
        .method(MethodDef::new(SETUP_CONTROL_NAME).param("name", ValueType::Str))
        .method(MethodDef::new(PROCESS_SUBMISSION));

    ComponentClass::new(def)
        .body("beginRender", |ctx, _| begin_render(ctx).map(|_| None))
        .body("afterRender", |ctx, _| {
            ctx.writer().end()?;
            Ok(None)
        })
        .body(SETUP_CONTROL_NAME, |ctx, args| {
            let name = args.first().cloned().unwrap_or(Value::Null);
            ctx.write_field("controlName", name)?;
            Ok(None)
        })
        .body(PROCESS_SUBMISSION, |ctx, _| process_submission(ctx).map(|_| None))
}

fn begin_render(ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
    let support = ctx.environment().peek::<FormSupport>().ok_or_else(|| {
        TapestryError::render(
            ctx.complete_id(),
            "the TextField component must be enclosed by a Form component",
        )
    })?;
    let id = ctx.resources()?.id.clone();
    let complete_id = ctx.complete_id();
    let control_name = support.allocate_control_name(&id);
    support.store(
        &complete_id,
        ComponentAction::new(SETUP_CONTROL_NAME, vec![Value::from(control_name.as_str())]),
    )?;
    support.store(&complete_id, ComponentAction::new(PROCESS_SUBMISSION, Vec::new()))?;
    ctx.write_field("controlName", Value::from(control_name.as_str()))?;

    let tracker = ctx.environment().peek::<ValidationTracker>();
    let value = match tracker.as_ref().and_then(|t| t.input_for(&control_name)) {
        Some(input) => input,
        None => match ctx.read_parameter("value")? {
            Value::Null => String::new(),
            other => other.to_client_string(),
        },
    };
    let client_id = ctx.request().allocate_client_id(&id);
    let mut attributes = vec![
        ("type".to_string(), "text".to_string()),
        ("name".to_string(), control_name.clone()),
        ("id".to_string(), client_id),
        ("value".to_string(), value),
    ];
    if ctx.read_parameter("disabled")? == Value::Bool(true) {
        attributes.push(("disabled".to_string(), "disabled".to_string()));
    }
    if tracker.is_some_and(|t| t.in_error(&control_name)) {
        attributes.push(("class".to_string(), "t-error".to_string()));
    }
    attributes.extend(informal_attributes(ctx)?);
    open_element(ctx, "input", &attributes);
    Ok(())
}

fn process_submission(ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
    if ctx.read_parameter("disabled")? == Value::Bool(true) {
        return Ok(());
    }
    let tracker = ctx.environment().peek_required::<ValidationTracker>()?;
    let control_name = match ctx.read_field("controlName")? {
        Value::Str(name) => name,
        _ => ctx.resources()?.id.clone(),
    };
    let raw = ctx
        .request()
        .request()
        .parameter(&control_name)
        .unwrap_or_default();
    tracker.record_input(&control_name, raw.as_str());

    let label = match ctx.read_parameter("label")? {
        Value::Str(label) if !label.is_empty() => label,
        _ => capitalize(&ctx.resources()?.id),
    };
    let validators = match ctx.read_parameter("validate")? {
        Value::Str(spec) => FieldValidator::parse_list(&spec)?,
        _ => Vec::new(),
    };

    let value = match translate(&raw, &validators, &label) {
        Ok(value) => value,
        Err(e) => return record(&tracker, &control_name, e),
    };
    if let Err(e) = validate_all(&validators, &label, &value) {
        return record(&tracker, &control_name, e);
    }
    if let Err(e) = ctx.trigger_event(VALIDATE, vec![value.clone()]) {
        return record(&tracker, &control_name, e);
    }
    ctx.write_parameter("value", value)
}

/// Blank input is null; fields with numeric validators expect a number.
fn translate(raw: &str, validators: &[FieldValidator], label: &str) -> TapestryResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    let numeric = validators
        .iter()
        .any(|v| matches!(v, FieldValidator::Min(_) | FieldValidator::Max(_)));
    if !numeric {
        return Ok(Value::from(raw));
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Value::Long(n));
    }
    trimmed.parse::<f64>().map(Value::Double).map_err(|_| {
        TapestryError::validation(format!("You must provide a numeric value for {label}."))
    })
}

/// Records validation failures against the field; any other error propagates.
fn record(tracker: &ValidationTracker, field: &str, error: TapestryError) -> TapestryResult<()> {
    match error {
        TapestryError::Validation(message) => {
            tracker.record_error(field, message);
            Ok(())
        }
        other => Err(other),
    }
}
