use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};

/// A value type that can be pushed into the [`Environment`].
///
/// `NAME` is the key environmental fields are injected by.
pub trait Capability: Any + Send + Sync {
    const NAME: &'static str;
}

pub type Shared = Arc<dyn Any + Send + Sync>;

/// Request-scoped LIFO registry of capability values.
///
/// Pops must mirror pushes exactly: popping a capability that is not the most recently pushed
/// one is an error.
#[derive(Default)]
pub struct Environment {
    stacks: HashMap<&'static str, Vec<Shared>>,
    order: Vec<&'static str>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Capability>(&mut self, value: Arc<T>) {
        let shared: Shared = value;
        self.stacks.entry(T::NAME).or_default().push(shared);
        self.order.push(T::NAME);
        tracing::trace!(capability = T::NAME, depth = self.order.len(), "environment push");
    }

    pub fn peek<T: Capability>(&self) -> Option<Arc<T>> {
        self.peek_by_name(T::NAME)
            .and_then(|v| v.downcast::<T>().ok())
    }

    pub fn peek_required<T: Capability>(&self) -> TapestryResult<Arc<T>> {
        self.peek::<T>().ok_or_else(|| {
            TapestryError::environment(format!(
                "no object of type {} is available from the Environment",
                T::NAME
            ))
        })
    }

    pub fn peek_by_name(&self, name: &str) -> Option<Shared> {
        self.stacks.get(name).and_then(|s| s.last()).cloned()
    }

    pub fn pop<T: Capability>(&mut self) -> TapestryResult<Arc<T>> {
        match self.order.last() {
            Some(&top) if top == T::NAME => {}
            Some(&top) => {
                return Err(TapestryError::environment(format!(
                    "attempt to pop {} but the most recently pushed capability is {top}",
                    T::NAME
                )));
            }
            None => {
                return Err(TapestryError::environment(format!(
                    "attempt to pop {} from an empty Environment",
                    T::NAME
                )));
            }
        }
        self.order.pop();
        let value = self
            .stacks
            .get_mut(T::NAME)
            .and_then(Vec::pop)
            .ok_or_else(|| TapestryError::environment(format!("{} stack is empty", T::NAME)))?;
        value.downcast::<T>().map_err(|_| {
            TapestryError::environment(format!("{} stack holds a foreign value", T::NAME))
        })
    }

    pub fn depth(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/environment.rs"]
mod tests;
