use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one component instance; keys every per-request slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of an element inside a page's element arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementIdx(pub u32);

impl ElementIdx {
    pub const ROOT: ElementIdx = ElementIdx(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Addresses the core component or one of the mixins attached to an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceLocator {
    pub element: ElementIdx,
    pub mixin: Option<u16>,
}

impl InstanceLocator {
    pub fn core(element: ElementIdx) -> Self {
        Self {
            element,
            mixin: None,
        }
    }

    pub fn mixin(element: ElementIdx, index: u16) -> Self {
        Self {
            element,
            mixin: Some(index),
        }
    }

    pub fn is_mixin(&self) -> bool {
        self.mixin.is_some()
    }
}

/// Allocates unique ids from a base name: `foo`, `foo_0`, `foo_1`, ...
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    used: HashMap<String, u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let base = sanitize(base);
        let key = base.to_ascii_lowercase();
        let Some(&start) = self.used.get(&key) else {
            self.used.insert(key, 0);
            return base;
        };
        let mut next = start;
        loop {
            let candidate = format!("{base}_{next}");
            next += 1;
            let candidate_key = candidate.to_ascii_lowercase();
            if !self.used.contains_key(&candidate_key) {
                self.used.insert(key, next);
                self.used.insert(candidate_key, 0);
                return candidate;
            }
        }
    }

    pub fn is_allocated(&self, id: &str) -> bool {
        self.used.contains_key(&id.to_ascii_lowercase())
    }
}

fn sanitize(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "id".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
