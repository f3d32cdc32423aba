use super::*;

#[test]
fn uri_query_is_split_and_decoded() {
    let req = TestRequest::from_uri("/index.form?t:formdata=a%2Bb&name=John+Doe&name=x&flag");
    assert_eq!(req.path(), "/index.form");
    assert_eq!(req.parameter("t:formdata").as_deref(), Some("a+b"));
    assert_eq!(req.parameters("name"), vec!["John Doe", "x"]);
    assert_eq!(req.parameter("flag").as_deref(), Some(""));
    assert_eq!(req.parameter_names(), vec!["t:formdata", "name", "flag"]);
    assert!(req.body().is_none());
}

#[test]
fn percent_encoding_round_trips_reserved_characters() {
    let raw = "a b&c=d/é";
    assert_eq!(percent_decode(&percent_encode(raw)), raw);
    assert_eq!(percent_encode("t:ac"), "t:ac");
    assert_eq!(percent_decode("100%"), "100%");
}

#[test]
fn session_attributes_keep_insertion_order() {
    let s = MemorySession::new();
    s.set("b", Value::Long(1));
    s.set("a", Value::Long(2));
    assert_eq!(s.keys(), vec!["b", "a"]);
    assert_eq!(s.remove("b"), Some(Value::Long(1)));
    assert_eq!(s.len(), 1);
}
