use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{TapestryError, TapestryResult};

/// Application-wide configuration symbols.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Production mode loads every page eagerly at startup.
    pub production_mode: bool,
    /// Passphrase for signing client-side data (form data, client persistence).
    pub hmac_passphrase: Option<String>,
    pub default_persistence_strategy: String,
    /// Verify at page assembly that `on<Event>From<Id>` handlers name real embedded components.
    pub unknown_component_id_check: bool,
    pub client_validation: bool,
    pub form_data_parameter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            production_mode: false,
            hmac_passphrase: None,
            default_persistence_strategy: "session".to_string(),
            unknown_component_id_check: true,
            client_validation: true,
            form_data_parameter: "t:formdata".to_string(),
        }
    }
}

impl Settings {
    pub fn from_reader<R: std::io::Read>(r: R) -> TapestryResult<Self> {
        let settings: Settings = serde_json::from_reader(r)
            .map_err(|e| TapestryError::config(format!("parse settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> TapestryResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TapestryError::config(format!("open settings JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> TapestryResult<()> {
        if self.form_data_parameter.trim().is_empty() {
            return Err(TapestryError::config("form_data_parameter must not be empty"));
        }
        if self.default_persistence_strategy.trim().is_empty() {
            return Err(TapestryError::config(
                "default_persistence_strategy must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/settings.rs"]
mod tests;
