use super::*;

#[test]
fn slots_are_scoped_by_instance() {
    let a = InstanceId::next();
    let b = InstanceId::next();
    let mut values = PerThreadValues::new();

    let slot_a = PerThreadValue::new(a, "param:value");
    let slot_b = PerThreadValue::new(b, "param:value");
    slot_a.set(&mut values, Value::Long(1));

    assert!(slot_a.exists(&values));
    assert!(!slot_b.exists(&values));
    assert_eq!(slot_b.get_or(&values, Value::Long(9)), Value::Long(9));
    assert_eq!(slot_a.get(&values), Some(Value::Long(1)));
}

#[test]
fn existence_is_distinct_from_null() {
    let id = InstanceId::next();
    let mut values = PerThreadValues::new();
    let slot = PerThreadValue::new(id, "field:x");
    slot.set(&mut values, Value::Null);
    assert!(slot.exists(&values));
    assert_eq!(slot.remove(&mut values), Some(Value::Null));
    assert!(!slot.exists(&values));
}

#[test]
fn clear_instance_drops_only_its_slots() {
    let a = InstanceId::next();
    let b = InstanceId::next();
    let mut values = PerThreadValues::new();
    values.set(SlotKey::new(a, "x"), Value::Bool(true));
    values.set(SlotKey::new(a, "y"), Value::Bool(true));
    values.set(SlotKey::new(b, "x"), Value::Bool(true));
    values.clear_instance(a);
    assert_eq!(values.len(), 1);
    assert!(values.exists(&SlotKey::new(b, "x")));
}
