use crate::components::{LIBRARY, parameter, phase_method};
use crate::form::action_stream::ComponentAction;
use crate::form::support::FormSupport;
use crate::foundation::error::TapestryResult;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{ClassDef, ClassKind, FieldDef, MethodDef, ParameterAnn};
use crate::page::context::ComponentContext;
use crate::transform::component_class::ComponentClass;

const SETUP_FOR_ROW: &str = "setupForRow";

/// Renders its body once per element of `source`, exposing the element through `value` and
/// its position through `index`.
///
/// Inside a form, every row records a `setupForRow` action so a submission replays the rows
/// in the order they were rendered.
pub fn loop_class() -> ComponentClass {
    let def = ClassDef::new("core.components.Loop", ClassKind::Component)
        .library(LIBRARY)
        .field(parameter(
            "source",
            ValueType::List,
            ParameterAnn {
                required: true,
                principal: true,
                ..ParameterAnn::default()
            },
        ))
        .field(parameter("value", ValueType::Any, ParameterAnn::default()))
        .field(parameter(
            "index",
            ValueType::Long,
            ParameterAnn {
                allow_null: false,
                ..ParameterAnn::default()
            },
        ))
        .field(FieldDef::new("rows", ValueType::List))
        .field(FieldDef::new("row", ValueType::Long))
        .method(phase_method("setupRender"))
        .method(phase_method("beginRender"))
        .method(phase_method("afterRender"))
        .method(
            MethodDef::new(SETUP_FOR_ROW)
                .param("index", ValueType::Long)
                .param("value", ValueType::Any),
        );

    ComponentClass::new(def)
        .body("setupRender", |ctx, _| {
            let rows = match ctx.read_parameter("source")? {
                Value::List(items) => items,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            if rows.is_empty() {
                return Ok(Some(Value::Bool(false)));
            }
            ctx.write_field("rows", Value::List(rows))?;
            ctx.write_field("row", Value::Long(0))?;
            Ok(None)
        })
        .body("beginRender", |ctx, _| {
            let index = ctx.read_field("row")?.as_long().unwrap_or(0);
            let value = current_row(ctx, index)?;
            if let Some(support) = ctx.environment().peek::<FormSupport>() {
                let complete_id = ctx.complete_id();
                support.store(
                    &complete_id,
                    ComponentAction::new(SETUP_FOR_ROW, vec![Value::Long(index), value.clone()]),
                )?;
            }
            setup_for_row(ctx, index, value)?;
            Ok(None)
        })
        .body("afterRender", |ctx, _| {
            let next = ctx.read_field("row")?.as_long().unwrap_or(0) + 1;
            let count = ctx.read_field("rows")?.as_list().map_or(0, <[Value]>::len);
            if (next as usize) < count {
                ctx.write_field("row", Value::Long(next))?;
                return Ok(Some(Value::Bool(false)));
            }
            Ok(None)
        })
        .body(SETUP_FOR_ROW, |ctx, args| {
            let index = args.first().and_then(Value::as_long).unwrap_or(0);
            let value = args.get(1).cloned().unwrap_or(Value::Null);
            setup_for_row(ctx, index, value)?;
            Ok(None)
        })
}

fn current_row(ctx: &mut ComponentContext<'_>, index: i64) -> TapestryResult<Value> {
    let rows = ctx.read_field("rows")?;
    Ok(rows
        .as_list()
        .and_then(|items| items.get(index as usize))
        .cloned()
        .unwrap_or(Value::Null))
}

fn setup_for_row(ctx: &mut ComponentContext<'_>, index: i64, value: Value) -> TapestryResult<()> {
    ctx.write_parameter("value", value)?;
    ctx.write_parameter("index", Value::Long(index))
}
