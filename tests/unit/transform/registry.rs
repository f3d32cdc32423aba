use super::*;
use crate::model::class_def::ClassDef;
use crate::runtime::settings::Settings;
use crate::workers::default_pipeline;

fn registry() -> ClassRegistry {
    ClassRegistry::new(
        default_pipeline().unwrap(),
        Arc::new(Services::new(Settings::default())),
    )
}

fn class(name: &str, kind: ClassKind) -> ComponentClass {
    ComponentClass::new(ClassDef::new(name, kind))
}

#[test]
fn pages_are_found_by_case_insensitive_simple_name() {
    let mut registry = registry();
    registry.register(class("pages.Index", ClassKind::Page)).unwrap();
    registry.register(class("pages.admin.Users", ClassKind::Page)).unwrap();
    assert_eq!(registry.page_class("index").unwrap(), "pages.Index");
    assert_eq!(registry.page_class("USERS").unwrap(), "pages.admin.Users");
    assert_eq!(registry.page_names(), vec!["Index", "Users"]);
    assert!(registry.page_class("missing").is_err());

    let err = registry
        .register(class("other.Index", ClassKind::Page))
        .unwrap_err()
        .to_string();
    assert!(err.contains("used by both"), "{err}");
    assert!(registry.register(class("pages.Index", ClassKind::Page)).is_err());
}

#[test]
fn application_components_shadow_library_components() {
    let mut registry = registry();
    registry
        .register(ComponentClass::new(
            ClassDef::new("core.components.Grid", ClassKind::Component).library("core"),
        ))
        .unwrap();
    assert_eq!(registry.component_class("Grid").unwrap(), "core.components.Grid");

    registry.register(class("components.Grid", ClassKind::Component)).unwrap();
    assert_eq!(registry.component_class("grid").unwrap(), "components.Grid");
    assert_eq!(registry.component_class("core/Grid").unwrap(), "core.components.Grid");
    assert_eq!(
        registry.component_class("core.components.Grid").unwrap(),
        "core.components.Grid"
    );
    assert!(registry.mixin_class("Grid").is_err());
}

#[test]
fn same_name_in_two_libraries_is_ambiguous() {
    let mut registry = registry();
    for library in ["one", "two"] {
        registry
            .register(ComponentClass::new(
                ClassDef::new(format!("{library}.Widget"), ClassKind::Component).library(library),
            ))
            .unwrap();
    }
    let err = registry.component_class("Widget").unwrap_err().to_string();
    assert!(err.contains("ambiguous"), "{err}");
    assert_eq!(registry.component_class("two/widget").unwrap(), "two.Widget");
}

#[test]
fn transformation_is_cached_and_superclass_first() {
    let mut registry = registry();
    registry.register(class("pages.Base", ClassKind::Page)).unwrap();
    registry
        .register(ComponentClass::new(
            ClassDef::new("pages.Index", ClassKind::Page).extends("pages.Base"),
        ))
        .unwrap();
    let first = registry.transformed("pages.Index").unwrap();
    let second = registry.transformed("pages.Index").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.parent().unwrap().name(), "pages.Base");
    assert!(Arc::ptr_eq(
        first.parent().unwrap(),
        &registry.transformed("pages.Base").unwrap()
    ));
}

#[test]
fn circular_and_mixed_kind_hierarchies_are_rejected() {
    let mut registry = registry();
    registry
        .register(ComponentClass::new(
            ClassDef::new("components.A", ClassKind::Component).extends("components.B"),
        ))
        .unwrap();
    registry
        .register(ComponentClass::new(
            ClassDef::new("components.B", ClassKind::Component).extends("components.A"),
        ))
        .unwrap();
    let err = registry.transformed("components.A").unwrap_err().to_string();
    assert!(err.contains("circular"), "{err}");

    registry
        .register(ComponentClass::new(
            ClassDef::new("pages.Odd", ClassKind::Page).extends("components.Plain"),
        ))
        .unwrap();
    registry.register(class("components.Plain", ClassKind::Component)).unwrap();
    let err = registry.transformed("pages.Odd").unwrap_err().to_string();
    assert!(err.contains("not of the same kind"), "{err}");
    assert!(registry.transformed("components.Nope").is_err());
}
