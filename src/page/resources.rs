use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::foundation::ids::{InstanceId, InstanceLocator};
use crate::foundation::{read, write};
use crate::model::component_model::ComponentModel;
use crate::page::binding::Binding;

/// Identity, model and parameter bindings of one component instance within a page.
pub struct ComponentResources {
    /// Local id within the container (mixins use their mixin id).
    pub id: String,
    /// Dotted path from the page root, empty for the page itself.
    pub nested_id: String,
    /// `Page:a.b`, or `Page:a.b$mixin` for a mixin.
    pub complete_id: String,
    pub page_name: String,
    pub locator: InstanceLocator,
    pub instance: InstanceId,
    pub class_name: String,
    pub model: Arc<ComponentModel>,
    bindings: RwLock<IndexMap<String, (String, Arc<dyn Binding>)>>,
}

impl ComponentResources {
    pub fn new(
        id: impl Into<String>,
        nested_id: impl Into<String>,
        complete_id: impl Into<String>,
        page_name: impl Into<String>,
        locator: InstanceLocator,
        model: Arc<ComponentModel>,
    ) -> Self {
        Self {
            id: id.into(),
            nested_id: nested_id.into(),
            complete_id: complete_id.into(),
            page_name: page_name.into(),
            locator,
            instance: InstanceId::next(),
            class_name: model.class_name.clone(),
            model,
            bindings: RwLock::new(IndexMap::new()),
        }
    }

    /// Binds a parameter; names are case-insensitive and the last binding wins.
    pub fn bind(&self, name: &str, binding: Arc<dyn Binding>) {
        write(&self.bindings).insert(name.to_ascii_lowercase(), (name.to_string(), binding));
    }

    pub fn binding(&self, name: &str) -> Option<Arc<dyn Binding>> {
        read(&self.bindings)
            .get(&name.to_ascii_lowercase())
            .map(|(_, b)| b.clone())
    }

    pub fn is_bound(&self, name: &str) -> bool {
        read(&self.bindings).contains_key(&name.to_ascii_lowercase())
    }

    pub fn binding_names(&self) -> Vec<String> {
        read(&self.bindings).values().map(|(n, _)| n.clone()).collect()
    }

    /// Bindings that do not correspond to a formal parameter, in binding order.
    pub fn informal_bindings(&self) -> Vec<(String, Arc<dyn Binding>)> {
        read(&self.bindings)
            .values()
            .filter(|(name, _)| self.model.parameter(name).is_none())
            .map(|(n, b)| (n.clone(), b.clone()))
            .collect()
    }

    pub fn is_mixin(&self) -> bool {
        self.locator.is_mixin()
    }
}

impl std::fmt::Debug for ComponentResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentResources")
            .field("complete_id", &self.complete_id)
            .field("class", &self.class_name)
            .field("bindings", &self.binding_names())
            .finish()
    }
}

/// Reference to a component of a page, returned by injected component fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentHandle {
    pub page: String,
    pub locator: InstanceLocator,
    pub complete_id: String,
}

/// Reference to a page by name. Returning one from an event handler navigates to that page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageHandle {
    pub name: String,
}

pub const COMPONENT_HANDLE: &str = "ComponentHandle";
pub const PAGE_HANDLE: &str = "PageHandle";
pub const COMPONENT_RESOURCES: &str = "ComponentResources";
