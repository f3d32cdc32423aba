use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};

/// Converts values between the runtime types a binding produces and the declared type of a
/// field or method parameter.
pub trait TypeCoercer: Send + Sync {
    fn coerce(&self, value: Value, target: &ValueType) -> TapestryResult<Value>;
}

/// Scalar conversions (string, number, boolean), scalar to list wrapping and object type checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTypeCoercer;

impl TypeCoercer for DefaultTypeCoercer {
    fn coerce(&self, value: Value, target: &ValueType) -> TapestryResult<Value> {
        match (target, value) {
            (ValueType::Any | ValueType::Void | ValueType::MarkupWriter, v) => Ok(v),

            (t, Value::Null) => Ok(if t.is_primitive() {
                t.default_value()
            } else {
                Value::Null
            }),

            (ValueType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (ValueType::Bool, Value::Str(s)) => {
                let t = s.trim();
                if t.is_empty() || t.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else if t.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else {
                    Err(failed(&Value::Str(s), target))
                }
            }
            (ValueType::Bool, Value::Long(v)) => Ok(Value::Bool(v != 0)),
            (ValueType::Bool, Value::List(items)) => Ok(Value::Bool(!items.is_empty())),

            (ValueType::Long, Value::Long(v)) => Ok(Value::Long(v)),
            (ValueType::Long, Value::Double(v)) => Ok(Value::Long(v.trunc() as i64)),
            (ValueType::Long, Value::Bool(b)) => Ok(Value::Long(i64::from(b))),
            (ValueType::Long, Value::Str(s)) => {
                let t = s.trim();
                if t.is_empty() {
                    return Ok(Value::Long(0));
                }
                t.parse::<i64>()
                    .map(Value::Long)
                    .map_err(|_| failed(&Value::Str(s.clone()), target))
            }

            (ValueType::Double, Value::Double(v)) => Ok(Value::Double(v)),
            (ValueType::Double, Value::Long(v)) => Ok(Value::Double(v as f64)),
            (ValueType::Double, Value::Str(s)) => {
                let t = s.trim();
                if t.is_empty() {
                    return Ok(Value::Double(0.0));
                }
                t.parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| failed(&Value::Str(s.clone()), target))
            }

            (ValueType::Str, Value::Str(s)) => Ok(Value::Str(s)),
            (ValueType::Str, v @ (Value::Bool(_) | Value::Long(_) | Value::Double(_))) => {
                Ok(Value::Str(v.to_client_string()))
            }

            (ValueType::List | ValueType::EventContext, Value::List(items)) => {
                Ok(Value::List(items))
            }
            (ValueType::List | ValueType::EventContext, v @ Value::Object(_)) => {
                Err(failed(&v, target))
            }
            (ValueType::List | ValueType::EventContext, v) => Ok(Value::List(vec![v])),

            (ValueType::Map, Value::Map(m)) => Ok(Value::Map(m)),

            (ValueType::Object(name), Value::Object(o)) => {
                if o.type_name() == name.as_str() {
                    Ok(Value::Object(o))
                } else {
                    Err(failed(&Value::Object(o), target))
                }
            }
            // Structured data (action arguments, request bodies) may back object-typed fields.
            (ValueType::Object(_), v @ (Value::Map(_) | Value::List(_) | Value::Str(_))) => Ok(v),

            (_, v) => Err(failed(&v, target)),
        }
    }
}

fn failed(value: &Value, target: &ValueType) -> TapestryError {
    TapestryError::coercion(format!(
        "could not coerce {} '{}' to type {}",
        value.kind(),
        value.to_client_string(),
        target.label()
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/coercion.rs"]
mod tests;
