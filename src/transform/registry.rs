use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::lock;
use crate::model::class_def::ClassKind;
use crate::runtime::services::Services;
use crate::transform::component_class::ComponentClass;
use crate::transform::transformed::TransformedClass;
use crate::transform::worker::TransformPipeline;

/// Library of application classes with on-demand, cached transformation.
///
/// Components and mixins are addressable as `library/Name` and, when unambiguous, as `Name`;
/// application classes win over library classes of the same simple name.
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ComponentClass>>,
    pages: HashMap<String, String>,
    components: HashMap<String, Vec<String>>,
    mixins: HashMap<String, Vec<String>>,
    pipeline: TransformPipeline,
    services: Arc<Services>,
    cache: Mutex<HashMap<String, Arc<TransformedClass>>>,
    in_progress: Mutex<HashSet<String>>,
}

impl ClassRegistry {
    pub fn new(pipeline: TransformPipeline, services: Arc<Services>) -> Self {
        Self {
            classes: HashMap::new(),
            pages: HashMap::new(),
            components: HashMap::new(),
            mixins: HashMap::new(),
            pipeline,
            services,
            cache: Mutex::new(HashMap::new()),
            in_progress: Mutex::new(HashSet::new()),
        }
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    pub fn register(&mut self, class: ComponentClass) -> TapestryResult<()> {
        class.validate()?;
        let name = class.def.name.clone();
        if self.classes.contains_key(&name) {
            return Err(TapestryError::config(format!("class '{name}' is registered twice")));
        }
        let simple = class.def.simple_name().to_ascii_lowercase();
        let qualified = format!("{}/{simple}", class.def.library.to_ascii_lowercase());
        match class.def.kind {
            ClassKind::Page => {
                if let Some(existing) = self.pages.get(&simple) {
                    return Err(TapestryError::config(format!(
                        "page name '{simple}' is used by both {existing} and {name}"
                    )));
                }
                self.pages.insert(simple, name.clone());
            }
            ClassKind::Component | ClassKind::Mixin => {
                let index = if class.def.kind == ClassKind::Mixin {
                    &mut self.mixins
                } else {
                    &mut self.components
                };
                index.entry(qualified).or_default().push(name.clone());
                index.entry(simple).or_default().push(name.clone());
            }
        }
        tracing::debug!(class = %name, kind = ?class.def.kind, "registered class");
        self.classes.insert(name, Arc::new(class));
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ComponentClass>> {
        self.classes.get(name)
    }

    pub fn page_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pages
            .values()
            .filter_map(|c| self.classes.get(c))
            .map(|c| c.def.simple_name().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn page_class(&self, page: &str) -> TapestryResult<&str> {
        self.pages
            .get(&page.to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| TapestryError::config(format!("unknown page '{page}'")))
    }

    pub fn component_class(&self, component_type: &str) -> TapestryResult<&str> {
        self.resolve(&self.components, component_type, "component type")
    }

    pub fn mixin_class(&self, mixin_type: &str) -> TapestryResult<&str> {
        self.resolve(&self.mixins, mixin_type, "mixin type")
    }

    fn resolve<'s>(
        &'s self,
        index: &'s HashMap<String, Vec<String>>,
        name: &str,
        what: &str,
    ) -> TapestryResult<&'s str> {
        if let Some((full_name, _)) = self.classes.get_key_value(name) {
            return Ok(full_name.as_str());
        }
        let candidates = index
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default();
        match candidates {
            [] => Err(TapestryError::config(format!("unknown {what} '{name}'"))),
            [only] => Ok(only.as_str()),
            many => {
                let app: Vec<&String> = many
                    .iter()
                    .filter(|c| self.classes.get(*c).is_some_and(|c| c.def.library == "app"))
                    .collect();
                match app.as_slice() {
                    [only] => Ok(only.as_str()),
                    _ => Err(TapestryError::config(format!(
                        "{what} '{name}' is ambiguous: {}",
                        many.join(", ")
                    ))),
                }
            }
        }
    }

    /// Transformed form of a class, transforming it (superclass first) on first use.
    pub fn transformed(&self, name: &str) -> TapestryResult<Arc<TransformedClass>> {
        if let Some(done) = lock(&self.cache).get(name) {
            return Ok(done.clone());
        }
        let class = self
            .classes
            .get(name)
            .cloned()
            .ok_or_else(|| TapestryError::config(format!("unknown class '{name}'")))?;
        if !lock(&self.in_progress).insert(name.to_string()) {
            return Err(TapestryError::transform(
                name,
                "class hierarchy is circular",
            ));
        }
        let outcome = self.transform_uncached(&class);
        lock(&self.in_progress).remove(name);
        let transformed = Arc::new(outcome?);
        Ok(lock(&self.cache)
            .entry(name.to_string())
            .or_insert(transformed)
            .clone())
    }

    fn transform_uncached(&self, class: &ComponentClass) -> TapestryResult<TransformedClass> {
        let parent = match &class.def.superclass {
            Some(superclass) => {
                let parent = self.transformed(superclass)?;
                if parent.def().kind != class.def.kind {
                    return Err(TapestryError::transform(
                        &class.def.name,
                        format!("superclass {superclass} is not of the same kind"),
                    ));
                }
                Some(parent)
            }
            None => None,
        };
        self.pipeline
            .transform(class, parent, self.services.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/registry.rs"]
mod tests;
