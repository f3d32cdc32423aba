use super::*;

#[test]
fn allocator_suffixes_repeats() {
    let mut ids = IdAllocator::new();
    assert_eq!(ids.allocate("textfield"), "textfield");
    assert_eq!(ids.allocate("textfield"), "textfield_0");
    assert_eq!(ids.allocate("TextField"), "TextField_1");
    assert_eq!(ids.allocate("form"), "form");
    assert!(ids.is_allocated("TEXTFIELD_0"));
}

#[test]
fn allocator_skips_names_taken_explicitly() {
    let mut ids = IdAllocator::new();
    assert_eq!(ids.allocate("a_0"), "a_0");
    assert_eq!(ids.allocate("a"), "a");
    assert_eq!(ids.allocate("a"), "a_1");
}

#[test]
fn allocator_sanitizes() {
    let mut ids = IdAllocator::new();
    assert_eq!(ids.allocate("my field"), "my_field");
    assert_eq!(ids.allocate(""), "id");
}

#[test]
fn instance_ids_are_unique() {
    let a = InstanceId::next();
    let b = InstanceId::next();
    assert_ne!(a, b);
}
