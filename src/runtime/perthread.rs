use std::collections::HashMap;

use crate::foundation::ids::InstanceId;
use crate::foundation::value::Value;

/// Key of one request-scoped slot: the owning component instance plus a slot name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub instance: InstanceId,
    pub slot: String,
}

impl SlotKey {
    pub fn new(instance: InstanceId, slot: impl Into<String>) -> Self {
        Self {
            instance,
            slot: slot.into(),
        }
    }
}

/// Request-scoped value store.
///
/// Component instances are shared by every request that touches a page, so anything that
/// changes during a request (parameter caches, persistent field shadows, cached method
/// results, plain mutable fields) is stored here rather than in the instance. The store is
/// owned by the request context and dropped with it.
#[derive(Debug, Default)]
pub struct PerThreadValues {
    values: HashMap<SlotKey, Value>,
}

impl PerThreadValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: SlotKey, value: Value) {
        self.values.insert(key, value);
    }

    pub fn exists(&self, key: &SlotKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &SlotKey) -> Option<Value> {
        self.values.remove(key)
    }

    /// Drops every slot owned by `instance`.
    pub fn clear_instance(&mut self, instance: InstanceId) {
        self.values.retain(|k, _| k.instance != instance);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Handle to a single slot, held by conduits and advice.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PerThreadValue {
    key: SlotKey,
}

impl PerThreadValue {
    pub fn new(instance: InstanceId, slot: impl Into<String>) -> Self {
        Self {
            key: SlotKey::new(instance, slot),
        }
    }

    pub fn key(&self) -> &SlotKey {
        &self.key
    }

    pub fn get(&self, values: &PerThreadValues) -> Option<Value> {
        values.get(&self.key).cloned()
    }

    pub fn get_or(&self, values: &PerThreadValues, default: Value) -> Value {
        self.get(values).unwrap_or(default)
    }

    pub fn set(&self, values: &mut PerThreadValues, value: Value) {
        values.set(self.key.clone(), value);
    }

    pub fn exists(&self, values: &PerThreadValues) -> bool {
        values.exists(&self.key)
    }

    pub fn remove(&self, values: &mut PerThreadValues) -> Option<Value> {
        values.remove(&self.key)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/perthread.rs"]
mod tests;
