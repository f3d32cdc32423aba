use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::{IdAllocator, InstanceId};
use crate::foundation::value::Value;
use crate::runtime::environment::Environment;
use crate::runtime::markup::{DomMarkupWriter, MarkupWriter};
use crate::runtime::perthread::PerThreadValues;
use crate::runtime::request::{MemorySession, Request, Session, TestRequest};
use crate::runtime::services::Services;

/// Query parameter carrying client-persisted field values.
pub const CLIENT_STATE_PARAMETER: &str = "t:state:client";

/// Everything that belongs to one request: per-request values, the environment, the markup
/// writer and the collaborators. Passed explicitly to every conduit, advice and handler.
pub struct RequestContext {
    services: Arc<Services>,
    request: Arc<dyn Request>,
    session: Arc<dyn Session>,
    values: PerThreadValues,
    environment: Environment,
    writer: Box<dyn MarkupWriter>,
    ids: IdAllocator,
    rendering: HashSet<InstanceId>,
    client_state: IndexMap<String, Value>,
}

impl RequestContext {
    pub fn new(
        services: Arc<Services>,
        request: Arc<dyn Request>,
        session: Arc<dyn Session>,
    ) -> TapestryResult<Self> {
        let client_state = match request.parameter(CLIENT_STATE_PARAMETER) {
            Some(raw) if !raw.is_empty() => decode_client_state(&services, &raw)?,
            _ => IndexMap::new(),
        };
        Ok(Self {
            services,
            request,
            session,
            values: PerThreadValues::new(),
            environment: Environment::new(),
            writer: Box::new(DomMarkupWriter::new()),
            ids: IdAllocator::new(),
            rendering: HashSet::new(),
            client_state,
        })
    }

    /// Context with no real request behind it, used while loading pages.
    pub fn detached(services: Arc<Services>) -> Self {
        Self {
            services,
            request: Arc::new(TestRequest::default()),
            session: Arc::new(MemorySession::new()),
            values: PerThreadValues::new(),
            environment: Environment::new(),
            writer: Box::new(DomMarkupWriter::new()),
            ids: IdAllocator::new(),
            rendering: HashSet::new(),
            client_state: IndexMap::new(),
        }
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn request(&self) -> &Arc<dyn Request> {
        &self.request
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn values(&self) -> &PerThreadValues {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut PerThreadValues {
        &mut self.values
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn writer(&mut self) -> &mut dyn MarkupWriter {
        self.writer.as_mut()
    }

    pub fn markup(&self) -> String {
        self.writer.to_markup()
    }

    pub fn allocate_client_id(&mut self, base: &str) -> String {
        self.ids.allocate(base)
    }

    pub fn is_rendering(&self, instance: InstanceId) -> bool {
        self.rendering.contains(&instance)
    }

    pub fn set_rendering(&mut self, instance: InstanceId, rendering: bool) {
        if rendering {
            self.rendering.insert(instance);
        } else {
            self.rendering.remove(&instance);
        }
    }

    pub fn client_state(&self) -> &IndexMap<String, Value> {
        &self.client_state
    }

    pub fn client_state_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.client_state
    }

    /// Signed form of the client state, for inclusion in generated links.
    pub fn encoded_client_state(&self) -> TapestryResult<Option<String>> {
        if self.client_state.is_empty() {
            return Ok(None);
        }
        let json = serde_json::to_vec(&self.client_state)
            .map_err(|e| TapestryError::serde(format!("encode client state: {e}")))?;
        Ok(Some(self.services.client_data().encode(&json)?))
    }
}

fn decode_client_state(
    services: &Services,
    raw: &str,
) -> TapestryResult<IndexMap<String, Value>> {
    let bytes = services.client_data().decode(raw)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TapestryError::serde(format!("decode client state: {e}")))
}
