use super::*;

#[test]
fn minimum_context_count_gates_matching() {
    let mut event = ComponentEvent::new("action", vec![Value::from("42")]);
    event.set_origin("delete");
    assert!(event.matches("action", "delete", 0));
    assert!(event.matches("ACTION", "Delete", 1));
    assert!(!event.matches("action", "delete", 2));
    assert!(event.matches("action", "", 1));
    assert!(!event.matches("action", "edit", 0));
    assert!(!event.matches("submit", "delete", 0));
}

#[test]
fn extra_trailing_context_still_matches() {
    let event = ComponentEvent::new(
        "activate",
        vec![Value::from("a"), Value::from("b"), Value::from("c")],
    );
    assert!(event.matches("activate", "", 1));
    assert!(event.matches("activate", "", 3));
    assert!(!event.matches("activate", "", 4));
}

#[test]
fn first_non_null_result_aborts() {
    let mut event = ComponentEvent::new("action", vec![]);
    event.store_result(Value::Null, "A.a()").unwrap();
    assert!(!event.is_aborted());
    event.store_result(Value::Bool(true), "A.b()").unwrap();
    assert!(event.is_aborted());
    let err = event.store_result(Value::Long(1), "A.c()").unwrap_err();
    assert!(err.to_string().contains("A.c()"));
    assert_eq!(event.result(), Some(&Value::Bool(true)));
}

#[test]
fn unmatched_events_stay_unhandled() {
    let event = ComponentEvent::new("action", vec![]);
    assert!(!event.is_handled());
    assert!(!event.is_aborted());
    assert!(event.result().is_none());
}
