use std::sync::Mutex;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::IdAllocator;
use crate::foundation::lock;
use crate::form::action_stream::{ActionEntry, ActionWriter, ComponentAction};
use crate::form::client_data::ClientDataEncoder;
use crate::page::context::ComponentContext;
use crate::runtime::environment::Capability;
use crate::runtime::heartbeat::Deferred;

pub const FORM_SUPPORT: &str = "FormSupport";

#[derive(Default)]
struct SupportState {
    control_names: IdAllocator,
    actions: Vec<ActionEntry>,
    deferred: Vec<Deferred>,
    encoding_type: Option<String>,
}

/// Services a form offers to the fields rendered or submitted inside it.
pub struct FormSupport {
    client_id: String,
    form_id: String,
    state: Mutex<SupportState>,
}

impl Capability for FormSupport {
    const NAME: &'static str = FORM_SUPPORT;
}

impl FormSupport {
    pub fn new(client_id: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            form_id: form_id.into(),
            state: Mutex::new(SupportState::default()),
        }
    }

    /// Client-side id of the form element.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Complete id of the form component.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Unique request parameter name for a field, derived from its id.
    pub fn allocate_control_name(&self, id: &str) -> String {
        lock(&self.state).control_names.allocate(id)
    }

    /// Records an action to replay on submission. Arguments must be serializable.
    pub fn store(&self, component_id: &str, action: ComponentAction) -> TapestryResult<()> {
        for arg in &action.args {
            arg.to_json().map_err(|e| {
                TapestryError::replay(
                    component_id,
                    TapestryError::serde(format!(
                        "argument of action '{}' is not serializable: {e}",
                        action.method
                    )),
                )
            })?;
        }
        tracing::trace!(component = component_id, method = %action.method, "stored form action");
        lock(&self.state).actions.push(ActionEntry {
            component_id: component_id.to_string(),
            action,
        });
        Ok(())
    }

    pub fn actions(&self) -> Vec<ActionEntry> {
        lock(&self.state).actions.clone()
    }

    /// Signed, encoded action stream for the hidden form data field.
    pub fn encode_actions(&self, encoder: &ClientDataEncoder) -> TapestryResult<String> {
        let mut writer = ActionWriter::new();
        for entry in &lock(&self.state).actions {
            writer.write(entry)?;
        }
        encoder.encode(&writer.into_bytes())
    }

    /// Schedules a command to run after every action of the submission has been replayed.
    pub fn defer(&self, command: Deferred) {
        lock(&self.state).deferred.push(command);
    }

    pub fn execute_deferred(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        let commands = std::mem::take(&mut lock(&self.state).deferred);
        for command in commands {
            command(ctx)?;
        }
        Ok(())
    }

    /// Sets the form's encoding type; two fields asking for different types is an error.
    pub fn set_encoding_type(&self, encoding_type: &str) -> TapestryResult<()> {
        let mut state = lock(&self.state);
        match &state.encoding_type {
            Some(existing) if existing != encoding_type => Err(TapestryError::render(
                &self.form_id,
                format!(
                    "encoding type '{encoding_type}' conflicts with '{existing}' requested earlier"
                ),
            )),
            _ => {
                state.encoding_type = Some(encoding_type.to_string());
                Ok(())
            }
        }
    }

    pub fn encoding_type(&self) -> Option<String> {
        lock(&self.state).encoding_type.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/form/support.rs"]
mod tests;
