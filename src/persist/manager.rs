use std::sync::Arc;

use indexmap::IndexMap;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::Value;
use crate::runtime::context::RequestContext;

/// Identifies one persistent field of one component of one page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub page: String,
    /// Nested id of the component, empty for the page itself.
    pub component: String,
    /// Logical field name from the component model.
    pub field: String,
}

impl FieldKey {
    pub fn new(
        page: impl Into<String>,
        component: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            page: page.into(),
            component: component.into(),
            field: field.into(),
        }
    }

    fn path(&self) -> String {
        format!("{}:{}:{}", self.page, self.component, self.field)
    }

    fn session_key(&self, prefix: &str) -> String {
        format!("{prefix}:{}", self.path())
    }
}

/// Where field values are kept between requests.
pub trait PersistentFieldStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn gather(&self, rc: &mut RequestContext, key: &FieldKey) -> TapestryResult<Option<Value>>;
    fn post_change(&self, rc: &mut RequestContext, key: &FieldKey, value: Value) -> TapestryResult<()>;
    /// Forgets every value stored for a page.
    fn discard(&self, rc: &mut RequestContext, page: &str) -> TapestryResult<()>;
}

fn discard_session_prefix(rc: &RequestContext, prefix: &str) {
    let session = rc.session();
    for key in session.keys() {
        if key.starts_with(prefix) {
            session.remove(&key);
        }
    }
}

/// Values live in the session until changed or discarded.
pub struct SessionStrategy;

impl PersistentFieldStrategy for SessionStrategy {
    fn name(&self) -> &'static str {
        "session"
    }

    fn gather(&self, rc: &mut RequestContext, key: &FieldKey) -> TapestryResult<Option<Value>> {
        Ok(rc.session().get(&key.session_key("state")))
    }

    fn post_change(&self, rc: &mut RequestContext, key: &FieldKey, value: Value) -> TapestryResult<()> {
        let session_key = key.session_key("state");
        if value.is_null() {
            rc.session().remove(&session_key);
        } else {
            rc.session().set(&session_key, value);
        }
        Ok(())
    }

    fn discard(&self, rc: &mut RequestContext, page: &str) -> TapestryResult<()> {
        discard_session_prefix(rc, &format!("state:{page}:"));
        Ok(())
    }
}

/// Values survive exactly one later read, typically across a redirect.
pub struct FlashStrategy;

impl PersistentFieldStrategy for FlashStrategy {
    fn name(&self) -> &'static str {
        "flash"
    }

    fn gather(&self, rc: &mut RequestContext, key: &FieldKey) -> TapestryResult<Option<Value>> {
        Ok(rc.session().remove(&key.session_key("flash")))
    }

    fn post_change(&self, rc: &mut RequestContext, key: &FieldKey, value: Value) -> TapestryResult<()> {
        let session_key = key.session_key("flash");
        if value.is_null() {
            rc.session().remove(&session_key);
        } else {
            rc.session().set(&session_key, value);
        }
        Ok(())
    }

    fn discard(&self, rc: &mut RequestContext, page: &str) -> TapestryResult<()> {
        discard_session_prefix(rc, &format!("flash:{page}:"));
        Ok(())
    }
}

/// Values travel with the client inside the signed client-state parameter of generated links.
pub struct ClientStrategy;

impl PersistentFieldStrategy for ClientStrategy {
    fn name(&self) -> &'static str {
        "client"
    }

    fn gather(&self, rc: &mut RequestContext, key: &FieldKey) -> TapestryResult<Option<Value>> {
        Ok(rc.client_state().get(&key.path()).cloned())
    }

    fn post_change(&self, rc: &mut RequestContext, key: &FieldKey, value: Value) -> TapestryResult<()> {
        if value.is_null() {
            rc.client_state_mut().shift_remove(&key.path());
            return Ok(());
        }
        // Reject values that cannot be encoded now rather than when a link is rendered.
        value.to_json()?;
        rc.client_state_mut().insert(key.path(), value);
        Ok(())
    }

    fn discard(&self, rc: &mut RequestContext, page: &str) -> TapestryResult<()> {
        let prefix = format!("{page}:");
        rc.client_state_mut().retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

/// Routes persistent field reads and writes to the strategy named by the field's model.
pub struct PersistentFieldManager {
    default: String,
    strategies: IndexMap<String, Arc<dyn PersistentFieldStrategy>>,
}

impl PersistentFieldManager {
    pub fn new(default: &str) -> Self {
        let mut strategies: IndexMap<String, Arc<dyn PersistentFieldStrategy>> = IndexMap::new();
        for strategy in [
            Arc::new(SessionStrategy) as Arc<dyn PersistentFieldStrategy>,
            Arc::new(FlashStrategy),
            Arc::new(ClientStrategy),
        ] {
            strategies.insert(strategy.name().to_string(), strategy);
        }
        Self {
            default: default.to_string(),
            strategies,
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn PersistentFieldStrategy>) -> Self {
        self.strategies.insert(strategy.name().to_string(), strategy);
        self
    }

    pub fn default_strategy(&self) -> &str {
        &self.default
    }

    /// Strategy by name; an empty name selects the default strategy.
    pub fn strategy(&self, name: &str) -> TapestryResult<&Arc<dyn PersistentFieldStrategy>> {
        let name = if name.is_empty() { self.default.as_str() } else { name };
        self.strategies.get(name).ok_or_else(|| {
            TapestryError::config(format!(
                "unknown persistence strategy '{name}' (available: {})",
                self.strategies.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn gather(
        &self,
        rc: &mut RequestContext,
        strategy: &str,
        key: &FieldKey,
    ) -> TapestryResult<Option<Value>> {
        self.strategy(strategy)?.gather(rc, key)
    }

    pub fn post_change(
        &self,
        rc: &mut RequestContext,
        strategy: &str,
        key: &FieldKey,
        value: Value,
    ) -> TapestryResult<()> {
        tracing::trace!(strategy, field = %key.field, page = %key.page, "persistent field changed");
        self.strategy(strategy)?.post_change(rc, key, value)
    }

    /// Drops every persisted value of a page, in every strategy.
    pub fn discard(&self, rc: &mut RequestContext, page: &str) -> TapestryResult<()> {
        for strategy in self.strategies.values() {
            strategy.discard(rc, page)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/manager.rs"]
mod tests;
