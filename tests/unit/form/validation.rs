use super::*;

#[test]
fn parses_a_validator_list() {
    let validators = FieldValidator::parse_list("required, minlength=3,max=10").unwrap();
    assert_eq!(
        validators,
        vec![
            FieldValidator::Required,
            FieldValidator::MinLength(3),
            FieldValidator::Max(10.0)
        ]
    );
    assert!(validators[0].is_required());
}

#[test]
fn unknown_or_incomplete_validators_are_config_errors() {
    assert!(FieldValidator::parse("email").is_err());
    assert!(FieldValidator::parse("minlength").is_err());
    assert!(FieldValidator::parse("max=lots").is_err());
}

#[test]
fn required_rejects_blank_values() {
    let err = FieldValidator::Required
        .validate("Name", &Value::from("  "))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("You must provide a value for Name."));
}

#[test]
fn other_validators_skip_blank_values() {
    assert!(FieldValidator::MinLength(3).validate("Name", &Value::Null).is_ok());
    assert!(FieldValidator::Min(1.0).validate("Age", &Value::from("")).is_ok());
}

#[test]
fn length_and_range_messages() {
    let short = FieldValidator::MinLength(3)
        .validate("Name", &Value::from("ab"))
        .unwrap_err()
        .to_string();
    assert!(short.contains("You must provide at least 3 characters for Name."), "{short}");

    let big = FieldValidator::Max(10.0)
        .validate("Age", &Value::Long(11))
        .unwrap_err()
        .to_string();
    assert!(big.contains("Age may not be larger than 10."), "{big}");
}

#[test]
fn validate_all_stops_at_the_first_failure() {
    let validators = FieldValidator::parse_list("required,minlength=5").unwrap();
    let err = validate_all(&validators, "Name", &Value::Null).unwrap_err().to_string();
    assert!(err.contains("You must provide a value"), "{err}");
    assert!(validate_all(&validators, "Name", &Value::from("long enough")).is_ok());
}
