use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::model::class_def::ClassKind;
use crate::model::render_phase::RenderPhase;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ParameterModel {
    pub name: String,
    pub required: bool,
    pub allow_null: bool,
    pub default_prefix: String,
    pub cached: bool,
    pub principal: bool,
    pub autoconnect: bool,
}

/// A mixin reference with its ordering constraints.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MixinRef {
    pub mixin_type: String,
    pub constraints: Vec<String>,
}

impl MixinRef {
    /// Parses `type` or `type::before:x;after:y`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once("::") {
            Some((t, c)) => Self {
                mixin_type: t.trim().to_string(),
                constraints: c
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            None => Self {
                mixin_type: raw.trim().to_string(),
                constraints: Vec::new(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EmbeddedComponentModel {
    pub id: String,
    /// Type derived from the declaring field.
    pub declared_type: Option<String>,
    /// Type given explicitly in the declaration.
    pub type_override: Option<String>,
    pub inherit_informal_parameters: bool,
    /// Parameter name to binding expression.
    pub parameters: IndexMap<String, String>,
    pub publish_parameters: Vec<String>,
    pub mixins: Vec<MixinRef>,
}

impl EmbeddedComponentModel {
    pub fn component_type(&self) -> Option<&str> {
        self.type_override
            .as_deref()
            .or(self.declared_type.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PersistentFieldModel {
    pub logical_name: String,
    pub strategy: String,
}

/// Build-time metadata of one component class. Immutable once frozen; lookups fall back to the
/// superclass model.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ComponentModel {
    pub class_name: String,
    pub parent_class_name: Option<String>,
    pub library: String,
    pub kind: ClassKind,
    parameters: IndexMap<String, ParameterModel>,
    embedded: IndexMap<String, EmbeddedComponentModel>,
    mixin_classes: Vec<MixinRef>,
    handled_events: BTreeSet<String>,
    render_phases: BTreeSet<RenderPhase>,
    persistent_fields: IndexMap<String, PersistentFieldModel>,
    meta: BTreeMap<String, String>,
    supports_informal_parameters: bool,
    mixin_after: bool,
    #[serde(skip)]
    parent: Option<Arc<ComponentModel>>,
}

impl ComponentModel {
    pub fn parent(&self) -> Option<&Arc<ComponentModel>> {
        self.parent.as_ref()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterModel> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .or_else(|| self.parent.as_ref().and_then(|p| p.parameter(name)))
    }

    /// Formal parameter names, superclass first.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = self
            .parent
            .as_ref()
            .map(|p| p.parameter_names())
            .unwrap_or_default();
        names.extend(self.parameters.values().map(|p| p.name.clone()));
        names
    }

    pub fn declared_parameters(&self) -> impl Iterator<Item = &ParameterModel> {
        self.parameters.values()
    }

    pub fn embedded_component(&self, id: &str) -> Option<&EmbeddedComponentModel> {
        self.embedded
            .get(&id.to_ascii_lowercase())
            .or_else(|| self.parent.as_ref().and_then(|p| p.embedded_component(id)))
    }

    /// Embedded components, superclass first, each group in declaration order.
    pub fn embedded_components(&self) -> Vec<&EmbeddedComponentModel> {
        let mut out = self
            .parent
            .as_ref()
            .map(|p| p.embedded_components())
            .unwrap_or_default();
        out.extend(self.embedded.values());
        out
    }

    /// Embedded component that publishes `parameter`, if any.
    pub fn publisher_of(&self, parameter: &str) -> Option<&EmbeddedComponentModel> {
        self.embedded_components().into_iter().find(|e| {
            e.publish_parameters
                .iter()
                .any(|p| p.eq_ignore_ascii_case(parameter))
        })
    }

    pub fn mixin_classes(&self) -> Vec<&MixinRef> {
        let mut out = self
            .parent
            .as_ref()
            .map(|p| p.mixin_classes())
            .unwrap_or_default();
        out.extend(self.mixin_classes.iter());
        out
    }

    pub fn handles_event(&self, event: &str) -> bool {
        self.handled_events.contains(&event.to_ascii_lowercase())
            || self.parent.as_ref().is_some_and(|p| p.handles_event(event))
    }

    pub fn declared_events(&self) -> impl Iterator<Item = &String> {
        self.handled_events.iter()
    }

    pub fn handles_render_phase(&self, phase: RenderPhase) -> bool {
        self.render_phases.contains(&phase)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.handles_render_phase(phase))
    }

    pub fn declared_render_phases(&self) -> impl Iterator<Item = &RenderPhase> {
        self.render_phases.iter()
    }

    pub fn persistent_field(&self, field: &str) -> Option<&PersistentFieldModel> {
        self.persistent_fields
            .get(field)
            .or_else(|| self.parent.as_ref().and_then(|p| p.persistent_field(field)))
    }

    pub fn persistence_strategy(&self, logical_name: &str) -> Option<&str> {
        self.persistent_fields
            .values()
            .find(|f| f.logical_name == logical_name)
            .map(|f| f.strategy.as_str())
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.persistence_strategy(logical_name))
            })
    }

    fn logical_name_in_use(&self, logical_name: &str) -> bool {
        self.persistent_fields
            .values()
            .any(|f| f.logical_name == logical_name)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.logical_name_in_use(logical_name))
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .map(String::as_str)
            .or_else(|| self.parent.as_ref().and_then(|p| p.meta(key)))
    }

    pub fn supports_informal_parameters(&self) -> bool {
        self.supports_informal_parameters
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.supports_informal_parameters())
    }

    pub fn is_mixin_after(&self) -> bool {
        self.mixin_after || self.parent.as_ref().is_some_and(|p| p.is_mixin_after())
    }

    pub fn to_json_pretty(&self) -> TapestryResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TapestryError::serde(format!("encode component model: {e}")))
    }
}

/// Component model under construction by the transformation workers.
///
/// Re-adding an identical entry is a no-op so the worker pipeline can be applied repeatedly;
/// a conflicting entry is an error.
#[derive(Clone, Debug)]
pub struct MutableComponentModel {
    model: ComponentModel,
}

impl MutableComponentModel {
    pub fn new(
        class_name: impl Into<String>,
        library: impl Into<String>,
        kind: ClassKind,
        parent: Option<Arc<ComponentModel>>,
    ) -> Self {
        Self {
            model: ComponentModel {
                class_name: class_name.into(),
                parent_class_name: parent.as_ref().map(|p| p.class_name.clone()),
                library: library.into(),
                kind,
                parameters: IndexMap::new(),
                embedded: IndexMap::new(),
                mixin_classes: Vec::new(),
                handled_events: BTreeSet::new(),
                render_phases: BTreeSet::new(),
                persistent_fields: IndexMap::new(),
                meta: BTreeMap::new(),
                supports_informal_parameters: false,
                mixin_after: false,
                parent,
            },
        }
    }

    /// Read view of everything accumulated so far, including the superclass.
    pub fn view(&self) -> &ComponentModel {
        &self.model
    }

    fn error(&self, message: String) -> TapestryError {
        TapestryError::transform(&self.model.class_name, message)
    }

    pub fn add_parameter(&mut self, parameter: ParameterModel) -> TapestryResult<()> {
        let key = parameter.name.to_ascii_lowercase();
        if let Some(existing) = self.model.parameters.get(&key) {
            if *existing == parameter {
                return Ok(());
            }
            return Err(self.error(format!(
                "parameter '{}' is already defined",
                parameter.name
            )));
        }
        if self
            .model
            .parent
            .as_ref()
            .is_some_and(|p| p.parameter(&parameter.name).is_some())
        {
            return Err(self.error(format!(
                "parameter '{}' duplicates a parameter of the superclass",
                parameter.name
            )));
        }
        self.model.parameters.insert(key, parameter);
        Ok(())
    }

    pub fn add_embedded_component(
        &mut self,
        embedded: EmbeddedComponentModel,
    ) -> TapestryResult<()> {
        let key = embedded.id.to_ascii_lowercase();
        if let Some(existing) = self.model.embedded.get(&key) {
            if *existing == embedded {
                return Ok(());
            }
            return Err(self.error(format!(
                "embedded component id '{}' is already defined",
                embedded.id
            )));
        }
        if self
            .model
            .parent
            .as_ref()
            .is_some_and(|p| p.embedded_component(&embedded.id).is_some())
        {
            return Err(self.error(format!(
                "embedded component id '{}' is already defined by the superclass",
                embedded.id
            )));
        }
        self.model.embedded.insert(key, embedded);
        Ok(())
    }

    pub fn add_mixin_class(&mut self, mixin: MixinRef) {
        if !self.model.mixin_classes.contains(&mixin) {
            self.model.mixin_classes.push(mixin);
        }
    }

    pub fn add_handled_event(&mut self, event: &str) {
        self.model.handled_events.insert(event.to_ascii_lowercase());
    }

    pub fn add_render_phase(&mut self, phase: RenderPhase) {
        self.model.render_phases.insert(phase);
    }

    /// Records the persistence strategy of a field and returns its logical name, unique
    /// across the class hierarchy.
    pub fn set_field_persistence_strategy(&mut self, field: &str, strategy: &str) -> String {
        if let Some(existing) = self.model.persistent_fields.get(field) {
            return existing.logical_name.clone();
        }
        let base = field.trim_start_matches(['_', '$']);
        let mut logical = base.to_string();
        let mut suffix = 0;
        while self.model.logical_name_in_use(&logical) {
            logical = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.model.persistent_fields.insert(
            field.to_string(),
            PersistentFieldModel {
                logical_name: logical.clone(),
                strategy: strategy.to_string(),
            },
        );
        logical
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.model.meta.insert(key.into(), value.into());
    }

    pub fn set_supports_informal_parameters(&mut self) {
        self.model.supports_informal_parameters = true;
    }

    pub fn set_mixin_after(&mut self) {
        self.model.mixin_after = true;
    }

    pub fn freeze(self) -> Arc<ComponentModel> {
        Arc::new(self.model)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/component_model.rs"]
mod tests;
