use super::*;

#[test]
fn json_class_description_parses_with_defaults() {
    let json = r#"{
        "name": "pages.Index",
        "kind": "page",
        "fields": [
            { "name": "count", "type": "long", "annotations": [ { "kind": "persist" } ] },
            { "name": "message", "type": "str", "initial": { "str": "hi" },
              "annotations": [ { "kind": "property" } ] },
            { "name": "value", "type": "any",
              "annotations": [ { "kind": "parameter", "required": true } ] }
        ],
        "methods": [
            { "name": "onActionFromDelete", "params": [ { "name": "id", "type": "long" } ] }
        ]
    }"#;
    let def = ClassDef::from_reader(json.as_bytes()).unwrap();
    assert_eq!(def.kind, ClassKind::Page);
    assert_eq!(def.library, "app");
    assert_eq!(def.simple_name(), "Index");
    assert_eq!(
        def.fields[0].annotations,
        vec![Annotation::Persist { strategy: None }]
    );
    assert_eq!(
        def.fields[1].annotations,
        vec![Annotation::Property {
            read: true,
            write: true
        }]
    );
    assert_eq!(def.fields[1].default_value(), Value::from("hi"));
    let Annotation::Parameter(p) = &def.fields[2].annotations[0] else {
        panic!("expected parameter");
    };
    assert!(p.required);
    assert!(p.allow_null);
    assert!(p.cache);
    assert_eq!(def.methods[0].returns, ValueType::Void);
    assert_eq!(
        def.methods[0].describe(&def.name),
        "pages.Index.onActionFromDelete(long)"
    );
}

#[test]
fn duplicate_members_are_rejected() {
    let def = ClassDef::new("X", ClassKind::Component)
        .field(FieldDef::new("a", ValueType::Long))
        .field(FieldDef::new("a", ValueType::Str));
    assert!(def.validate().unwrap_err().to_string().contains("declared twice"));

    let def = ClassDef::new("X", ClassKind::Component)
        .method(MethodDef::new("m"))
        .method(MethodDef::new("m").param("x", ValueType::Long));
    assert!(def.validate().unwrap_err().to_string().contains("overloads"));
}

#[test]
fn builders_compose() {
    let def = ClassDef::new("components.Box", ClassKind::Component)
        .extends("components.Base")
        .library("lib")
        .with(Annotation::SupportsInformalParameters)
        .field(FieldDef::new("n", ValueType::Long).initial(3i64))
        .method(MethodDef::new("setupRender").returns(ValueType::Bool));
    assert_eq!(def.superclass.as_deref(), Some("components.Base"));
    assert_eq!(def.find_field("n").unwrap().default_value(), Value::Long(3));
    assert!(def.find_method("setupRender").is_some());
    assert!(def.find_method("beginRender").is_none());
}
