use std::sync::Arc;

use crate::form::client_data::ClientDataEncoder;
use crate::page::binding::{BindingSource, DefaultBindingSource};
use crate::persist::manager::PersistentFieldManager;
use crate::runtime::coercion::{DefaultTypeCoercer, TypeCoercer};
use crate::runtime::settings::Settings;

/// Shared collaborators consumed by workers, conduits and components.
pub struct Services {
    settings: Settings,
    coercer: Arc<dyn TypeCoercer>,
    bindings: Arc<dyn BindingSource>,
    client_data: ClientDataEncoder,
    persistence: PersistentFieldManager,
}

impl Services {
    pub fn new(settings: Settings) -> Self {
        let client_data = ClientDataEncoder::new(settings.hmac_passphrase.as_deref());
        let persistence = PersistentFieldManager::new(&settings.default_persistence_strategy);
        Self {
            settings,
            coercer: Arc::new(DefaultTypeCoercer),
            bindings: Arc::new(DefaultBindingSource::new()),
            client_data,
            persistence,
        }
    }

    pub fn with_coercer(mut self, coercer: Arc<dyn TypeCoercer>) -> Self {
        self.coercer = coercer;
        self
    }

    pub fn with_binding_source(mut self, bindings: Arc<dyn BindingSource>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn coercer(&self) -> &Arc<dyn TypeCoercer> {
        &self.coercer
    }

    pub fn bindings(&self) -> &Arc<dyn BindingSource> {
        &self.bindings
    }

    pub fn client_data(&self) -> &ClientDataEncoder {
        &self.client_data
    }

    pub fn persistence(&self) -> &PersistentFieldManager {
        &self.persistence
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
