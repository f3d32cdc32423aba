use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::page::lifecycle::InstanceLifecycle;
use crate::page::resources::ComponentResources;
use crate::runtime::services::Services;
use crate::transform::conduit::{FieldConduit, InstanceSetup};
use crate::transform::transformed::TransformedClass;

/// A live component: its transformed class, resources and one conduit per field.
///
/// Instances are shared by every request that renders or submits the page; the conduits keep
/// request state in the request context, never in the instance.
pub struct ComponentInstance {
    class: Arc<TransformedClass>,
    resources: Arc<ComponentResources>,
    conduits: HashMap<String, Arc<dyn FieldConduit>>,
    listeners: Vec<Arc<dyn InstanceLifecycle>>,
}

impl ComponentInstance {
    /// Resolves every field conduit, superclass fields first, then runs the instance
    /// initializers of each class level.
    pub fn new(
        class: Arc<TransformedClass>,
        resources: Arc<ComponentResources>,
        services: &Arc<Services>,
    ) -> TapestryResult<Self> {
        let mut conduits: HashMap<String, Arc<dyn FieldConduit>> = HashMap::new();
        let listeners = {
            let mut setup = InstanceSetup::new(&resources, services);
            for level in class.hierarchy() {
                for field in level.fields() {
                    let conduit = (field.factory)(&mut setup)?;
                    if conduits.insert(field.def.name.clone(), conduit).is_some() {
                        return Err(TapestryError::transform(
                            level.name(),
                            format!("field '{}' is declared more than once in the hierarchy", field.def.name),
                        ));
                    }
                }
                for init in level.initializers() {
                    init(&mut setup)?;
                }
            }
            setup.into_listeners()
        };
        Ok(Self {
            class,
            resources,
            conduits,
            listeners,
        })
    }

    pub fn class(&self) -> &Arc<TransformedClass> {
        &self.class
    }

    pub fn resources(&self) -> &Arc<ComponentResources> {
        &self.resources
    }

    pub fn conduit(&self, field: &str) -> TapestryResult<Arc<dyn FieldConduit>> {
        self.conduits.get(field).cloned().ok_or_else(|| {
            TapestryError::transform(
                self.class.name(),
                format!("no field '{field}' ({})", self.resources.complete_id),
            )
        })
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.conduits.contains_key(field)
    }

    pub fn listeners(&self) -> &[Arc<dyn InstanceLifecycle>] {
        &self.listeners
    }
}
