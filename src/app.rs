use std::sync::Arc;

use crate::components::core_library;
use crate::dispatch::request_handler::{RequestHandler, Response};
use crate::foundation::error::TapestryResult;
use crate::model::component_model::ComponentModel;
use crate::page::binding::{BindingFactory, DefaultBindingSource};
use crate::page::source::PageSource;
use crate::page::tree::Page;
use crate::runtime::coercion::TypeCoercer;
use crate::runtime::context::RequestContext;
use crate::runtime::request::{Request, Session};
use crate::runtime::services::Services;
use crate::runtime::settings::Settings;
use crate::transform::component_class::ComponentClass;
use crate::transform::registry::ClassRegistry;
use crate::transform::worker::{TransformPipeline, TransformWorker};
use crate::workers::default_workers;

/// Collects settings, classes and extensions, then wires an [`Application`].
#[derive(Default)]
pub struct ApplicationBuilder {
    settings: Settings,
    classes: Vec<ComponentClass>,
    binding_factories: Vec<(String, Arc<dyn BindingFactory>)>,
    coercer: Option<Arc<dyn TypeCoercer>>,
    workers: Vec<Arc<dyn TransformWorker>>,
}

impl ApplicationBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn class(mut self, class: ComponentClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn classes(mut self, classes: impl IntoIterator<Item = ComponentClass>) -> Self {
        self.classes.extend(classes);
        self
    }

    /// Adds a binding prefix, or replaces a built-in one.
    pub fn binding_factory(mut self, prefix: &str, factory: Arc<dyn BindingFactory>) -> Self {
        self.binding_factories.push((prefix.to_string(), factory));
        self
    }

    pub fn coercer(mut self, coercer: Arc<dyn TypeCoercer>) -> Self {
        self.coercer = Some(coercer);
        self
    }

    /// Adds a worker to the standard pipeline; its constraints place it.
    pub fn worker(mut self, worker: Arc<dyn TransformWorker>) -> Self {
        self.workers.push(worker);
        self
    }

    pub fn build(self) -> TapestryResult<Application> {
        self.settings.validate()?;
        let production = self.settings.production_mode;

        let mut bindings = DefaultBindingSource::new();
        for (prefix, factory) in self.binding_factories {
            bindings = bindings.with_factory(&prefix, factory);
        }
        let mut services = Services::new(self.settings).with_binding_source(Arc::new(bindings));
        if let Some(coercer) = self.coercer {
            services = services.with_coercer(coercer);
        }
        let services = Arc::new(services);

        let mut workers = default_workers();
        workers.extend(self.workers);
        let mut registry = ClassRegistry::new(TransformPipeline::new(workers)?, services);
        for class in core_library().into_iter().chain(self.classes) {
            registry.register(class)?;
        }
        let registry = Arc::new(registry);
        let pages = Arc::new(PageSource::new(registry.clone()));

        if production {
            for name in registry.page_names() {
                pages.get(&name)?;
            }
            tracing::info!(pages = pages.loaded().len(), "pages loaded eagerly");
        }
        Ok(Application {
            handler: RequestHandler::new(pages.clone()),
            registry,
            pages,
        })
    }
}

/// A configured application: registered classes, loaded pages and the request handler.
pub struct Application {
    registry: Arc<ClassRegistry>,
    pages: Arc<PageSource>,
    handler: RequestHandler,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn services(&self) -> &Arc<Services> {
        self.registry.services()
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    pub fn page(&self, name: &str) -> TapestryResult<Arc<Page>> {
        self.pages.get(name)
    }

    /// Component model of a registered class, transforming it if needed.
    pub fn model(&self, class_name: &str) -> TapestryResult<Arc<ComponentModel>> {
        Ok(self.registry.transformed(class_name)?.model().clone())
    }

    pub fn handle(
        &self,
        request: Arc<dyn Request>,
        session: Arc<dyn Session>,
    ) -> TapestryResult<Response> {
        self.handler.handle(request, session)
    }

    /// A request context for driving pages directly, outside [`Application::handle`].
    pub fn request_context(
        &self,
        request: Arc<dyn Request>,
        session: Arc<dyn Session>,
    ) -> TapestryResult<RequestContext> {
        RequestContext::new(self.services().clone(), request, session)
    }
}
