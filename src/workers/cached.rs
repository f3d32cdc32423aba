use std::sync::Arc;

use crate::foundation::error::TapestryResult;
use crate::foundation::value::Value;
use crate::model::class_def::Annotation;
use crate::runtime::perthread::SlotKey;
use crate::transform::advice::{MethodAdvice, MethodInvocation};
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;

/// Memoizes the result of a no-argument method for the rest of the request, optionally
/// invalidated when a watched property changes.
pub struct CachedWorker;

impl TransformWorker for CachedWorker {
    fn name(&self) -> &'static str {
        "Cached"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Inject"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for method in class.methods() {
            let Some(watch) = method.annotations.iter().find_map(|a| match a {
                Annotation::Cached { watch } => Some(watch.clone()),
                _ => None,
            }) else {
                continue;
            };
            if !method.params.is_empty() {
                return Err(class.error(format!(
                    "Cached method '{}' may not take parameters",
                    method.name
                )));
            }
            if method.returns.is_void() {
                return Err(class.error(format!(
                    "Cached method '{}' must return a value",
                    method.name
                )));
            }
            let advice = CachedAdvice {
                slot: format!("cached:{}", method.name),
                watch_slot: format!("cached-watch:{}", method.name),
                watch: watch.filter(|w| !w.trim().is_empty()),
            };
            class.add_advice(&method.name, Arc::new(advice))?;
        }
        Ok(())
    }
}

struct CachedAdvice {
    slot: String,
    watch_slot: String,
    watch: Option<String>,
}

impl MethodAdvice for CachedAdvice {
    fn advise(&self, invocation: &mut MethodInvocation<'_, '_>) -> TapestryResult<()> {
        let instance = invocation.ctx().instance_id()?;
        let slot = SlotKey::new(instance, self.slot.as_str());
        if let Some(watch) = &self.watch {
            // A failing watch expression propagates; the cached value is left untouched.
            let current = invocation.ctx().read_property(watch)?;
            let watch_slot = SlotKey::new(instance, self.watch_slot.as_str());
            let values = invocation.ctx().per_thread();
            if values.get(&watch_slot) != Some(&current) {
                values.remove(&slot);
                values.set(watch_slot, current);
            }
        }
        if let Some(cached) = invocation.ctx().per_thread().get(&slot).cloned() {
            invocation.set_result(Some(cached));
            return Ok(());
        }
        invocation.proceed()?;
        let result = invocation.result().cloned().unwrap_or(Value::Null);
        invocation.ctx().per_thread().set(slot, result);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workers/cached.rs"]
mod tests;
