use super::*;
use std::sync::Arc;

fn c(v: impl Into<Value>, t: ValueType) -> TapestryResult<Value> {
    DefaultTypeCoercer.coerce(v.into(), &t)
}

#[test]
fn strings_convert_to_scalars() {
    assert_eq!(c("42", ValueType::Long).unwrap(), Value::Long(42));
    assert_eq!(c(" 2.5 ", ValueType::Double).unwrap(), Value::Double(2.5));
    assert_eq!(c("TRUE", ValueType::Bool).unwrap(), Value::Bool(true));
    assert_eq!(c("", ValueType::Long).unwrap(), Value::Long(0));
}

#[test]
fn bad_numbers_name_the_target_type() {
    let err = c("abc", ValueType::Long).unwrap_err().to_string();
    assert!(err.contains("coercion error"));
    assert!(err.contains("'abc'"));
    assert!(err.contains("long"));
}

#[test]
fn null_becomes_primitive_default() {
    assert_eq!(c(Value::Null, ValueType::Long).unwrap(), Value::Long(0));
    assert_eq!(c(Value::Null, ValueType::Str).unwrap(), Value::Null);
}

#[test]
fn scalars_wrap_into_lists() {
    assert_eq!(
        c("x", ValueType::List).unwrap(),
        Value::List(vec![Value::from("x")])
    );
    assert_eq!(
        c(Value::List(vec![Value::Long(1)]), ValueType::EventContext).unwrap(),
        Value::List(vec![Value::Long(1)])
    );
}

#[test]
fn objects_must_match_declared_type() {
    let obj = Value::object("ValidationTracker", Arc::new(0u8));
    assert!(c(obj.clone(), ValueType::Object("ValidationTracker".into())).is_ok());
    assert!(c(obj.clone(), ValueType::Object("FormSupport".into())).is_err());
    assert!(c(obj, ValueType::Str).is_err());
}
