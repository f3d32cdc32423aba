use std::sync::Arc;

use crate::foundation::error::TapestryResult;
use crate::foundation::orderer::Orderer;
use crate::model::component_model::MutableComponentModel;
use crate::runtime::services::Services;
use crate::transform::class::TransformClass;
use crate::transform::component_class::ComponentClass;
use crate::transform::transformed::TransformedClass;

/// One annotation or naming convention turned into conduits, advice or handlers.
pub trait TransformWorker: Send + Sync {
    fn name(&self) -> &'static str;

    /// `before:<worker>` / `after:<worker>` constraints on peers (`*` for all).
    fn constraints(&self) -> &'static [&'static str] {
        &[]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()>;
}

/// Workers in their resolved order.
#[derive(Clone)]
pub struct TransformPipeline {
    workers: Vec<Arc<dyn TransformWorker>>,
}

impl TransformPipeline {
    pub fn new(workers: Vec<Arc<dyn TransformWorker>>) -> TapestryResult<Self> {
        let mut orderer = Orderer::new("transformation workers");
        for worker in workers {
            let name = worker.name();
            let constraints = worker.constraints();
            orderer.add(name, worker, constraints)?;
        }
        Ok(Self {
            workers: orderer.order()?,
        })
    }

    pub fn worker_names(&self) -> Vec<&'static str> {
        self.workers.iter().map(|w| w.name()).collect()
    }

    pub fn apply(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for worker in &self.workers {
            tracing::trace!(class = class.class_name(), worker = worker.name(), "applying worker");
            worker.transform(class)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(class = %class.def.name))]
    pub fn transform(
        &self,
        class: &ComponentClass,
        parent: Option<Arc<TransformedClass>>,
        services: Arc<Services>,
    ) -> TapestryResult<TransformedClass> {
        let mut transform = TransformClass::new(class, parent, services)?;
        self.apply(&mut transform)?;
        let transformed = transform.finish()?;
        tracing::debug!(
            handlers = transformed.handlers().len(),
            methods = transformed.method_names().count(),
            "class transformed"
        );
        Ok(transformed)
    }

    /// Runs the workers over `class` starting from an existing model and returns the model.
    pub fn transform_model(
        &self,
        class: &ComponentClass,
        parent: Option<Arc<TransformedClass>>,
        services: Arc<Services>,
        model: MutableComponentModel,
    ) -> TapestryResult<MutableComponentModel> {
        let mut transform = TransformClass::with_model(class, parent, services, model)?;
        self.apply(&mut transform)?;
        Ok(transform.into_model())
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.worker_names()).finish()
    }
}
