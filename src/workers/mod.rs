//! The standard transformation workers, one per annotation or naming convention.

use std::sync::Arc;

use crate::foundation::error::TapestryResult;
use crate::transform::worker::{TransformPipeline, TransformWorker};

pub mod activation;
pub mod cached;
pub mod component;
pub mod inject;
pub mod meta;
pub mod method_advice;
pub mod on_event;
pub mod parameter;
pub mod persist;
pub mod property;
pub mod render_phase;
pub mod unclaimed;

/// Property, parameter and persistence names derived from a field: leading `_` and `$` are
/// dropped.
pub fn property_name(field: &str) -> &str {
    field.trim_start_matches(['_', '$'])
}

/// The standard workers. The pipeline orders them by their constraints: accessors first,
/// then parameters, persistence, injection and method advice, with unclaimed fields last.
pub fn default_workers() -> Vec<Arc<dyn TransformWorker>> {
    vec![
        Arc::new(property::PropertyWorker),
        Arc::new(meta::MetaWorker),
        Arc::new(parameter::ParameterWorker),
        Arc::new(parameter::BindParameterWorker),
        Arc::new(component::ComponentWorker),
        Arc::new(component::MixinWorker),
        Arc::new(persist::PersistWorker),
        Arc::new(persist::SessionAttributeWorker),
        Arc::new(activation::PageActivationContextWorker),
        Arc::new(activation::ActivationRequestParameterWorker),
        Arc::new(inject::EnvironmentalWorker),
        Arc::new(inject::InjectWorker),
        Arc::new(cached::CachedWorker),
        Arc::new(persist::DiscardAfterWorker),
        Arc::new(method_advice::HeartbeatDeferredWorker),
        Arc::new(method_advice::LogWorker),
        Arc::new(on_event::OnEventWorker),
        Arc::new(render_phase::RenderPhaseWorker),
        Arc::new(render_phase::PageLifecycleWorker),
        Arc::new(render_phase::PageResetWorker),
        Arc::new(unclaimed::UnclaimedFieldWorker),
    ]
}

pub fn default_pipeline() -> TapestryResult<TransformPipeline> {
    TransformPipeline::new(default_workers())
}

#[cfg(test)]
#[path = "../../tests/unit/workers/mod.rs"]
mod tests;
