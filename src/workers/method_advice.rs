use std::sync::Arc;

use crate::foundation::error::TapestryResult;
use crate::model::class_def::Annotation;
use crate::page::context::ComponentContext;
use crate::runtime::heartbeat::Heartbeat;
use crate::transform::advice::{MethodAdvice, MethodInvocation};
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;

/// `HeartbeatDeferred` methods run when the innermost heartbeat ends, or immediately when no
/// heartbeat is active.
pub struct HeartbeatDeferredWorker;

impl TransformWorker for HeartbeatDeferredWorker {
    fn name(&self) -> &'static str {
        "HeartbeatDeferred"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:DiscardAfter"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for method in class.methods() {
            if !method.has(&Annotation::HeartbeatDeferred) {
                continue;
            }
            if !method.returns.is_void() {
                return Err(class.error(format!(
                    "HeartbeatDeferred method '{}' must return void",
                    method.name
                )));
            }
            class.add_advice(&method.name, Arc::new(HeartbeatDeferredAdvice))?;
        }
        Ok(())
    }
}

struct HeartbeatDeferredAdvice;

impl MethodAdvice for HeartbeatDeferredAdvice {
    fn advise(&self, invocation: &mut MethodInvocation<'_, '_>) -> TapestryResult<()> {
        let heartbeat = invocation
            .ctx()
            .environment()
            .peek::<Heartbeat>()
            .filter(|h| h.is_active());
        let Some(heartbeat) = heartbeat else {
            return invocation.proceed();
        };
        let deferred = invocation.defer();
        heartbeat.defer(Box::new(move |ctx: &mut ComponentContext<'_>| {
            deferred.run(ctx).map(|_| ())
        }))?;
        invocation.set_result(None);
        Ok(())
    }
}

/// Logs entry, exit and failure of `Log` methods at debug level.
pub struct LogWorker;

impl TransformWorker for LogWorker {
    fn name(&self) -> &'static str {
        "Log"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:HeartbeatDeferred"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for method in class.methods() {
            if method.has(&Annotation::Log) {
                class.add_advice(&method.name, Arc::new(LogAdvice))?;
            }
        }
        Ok(())
    }
}

struct LogAdvice;

impl MethodAdvice for LogAdvice {
    fn advise(&self, invocation: &mut MethodInvocation<'_, '_>) -> TapestryResult<()> {
        let method = invocation.method().describe();
        let component = invocation.ctx().complete_id();
        tracing::debug!(%component, %method, args = ?invocation.args(), "[ENTER]");
        match invocation.proceed() {
            Ok(()) => {
                tracing::debug!(%component, %method, result = ?invocation.result(), "[EXIT]");
                Ok(())
            }
            Err(err) => {
                tracing::debug!(%component, %method, error = %err, "[FAIL]");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workers/method_advice.rs"]
mod tests;
