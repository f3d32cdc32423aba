use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::Value;
use crate::model::class_def::ClassDef;
use crate::page::context::ComponentContext;
use crate::page::template::NodeSpec;
use crate::transform::advice::MethodBody;

/// A class description paired with the Rust implementations of its methods and, optionally,
/// its template.
#[derive(Clone)]
pub struct ComponentClass {
    pub def: ClassDef,
    pub(crate) bodies: HashMap<String, MethodBody>,
    pub template: Option<Vec<NodeSpec>>,
    /// Methods without a body fail when invoked instead of failing the transformation.
    pub allow_missing_bodies: bool,
}

impl ComponentClass {
    pub fn new(def: ClassDef) -> Self {
        Self {
            def,
            bodies: HashMap::new(),
            template: None,
            allow_missing_bodies: false,
        }
    }

    /// A class loaded from a description alone, used to inspect its model.
    pub fn descriptive(def: ClassDef) -> Self {
        Self {
            allow_missing_bodies: true,
            ..Self::new(def)
        }
    }

    pub fn body<F>(mut self, method: &str, body: F) -> Self
    where
        F: Fn(&mut ComponentContext<'_>, &[Value]) -> TapestryResult<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.bodies.insert(method.to_string(), Arc::new(body));
        self
    }

    pub fn template(mut self, nodes: Vec<NodeSpec>) -> Self {
        self.template = Some(nodes);
        self
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn method_body(&self, method: &str) -> Option<&MethodBody> {
        self.bodies.get(method)
    }

    pub fn validate(&self) -> TapestryResult<()> {
        self.def.validate()?;
        let mut orphans: Vec<&str> = self
            .bodies
            .keys()
            .filter(|name| self.def.find_method(name).is_none())
            .map(String::as_str)
            .collect();
        if orphans.is_empty() {
            return Ok(());
        }
        orphans.sort_unstable();
        Err(TapestryError::transform(
            &self.def.name,
            format!("bodies supplied for undeclared method(s): {}", orphans.join(", ")),
        ))
    }
}

impl std::fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bodies: Vec<&String> = self.bodies.keys().collect();
        bodies.sort();
        f.debug_struct("ComponentClass")
            .field("name", &self.def.name)
            .field("bodies", &bodies)
            .field("template", &self.template.is_some())
            .finish()
    }
}
