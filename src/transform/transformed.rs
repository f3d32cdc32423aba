use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::dispatch::event::ComponentEvent;
use crate::dispatch::handler::EventHandlerMethod;
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{ClassDef, FieldDef};
use crate::model::component_model::ComponentModel;
use crate::model::render_phase::RenderPhase;
use crate::page::context::ComponentContext;
use crate::page::lifecycle::LifecyclePoint;
use crate::page::template::NodeSpec;
use crate::transform::advice::{AdvisedMethod, invoke_advised};
use crate::transform::conduit::{ConduitFactory, InstanceInitializer};

/// A declared or introduced field with the factory producing its conduit.
pub struct FieldEntry {
    pub def: FieldDef,
    pub factory: ConduitFactory,
}

/// Result of running the worker pipeline over one class: everything needed to build
/// instances and to dispatch events and render phases to them.
pub struct TransformedClass {
    pub(crate) def: Arc<ClassDef>,
    pub(crate) parent: Option<Arc<TransformedClass>>,
    pub(crate) model: Arc<ComponentModel>,
    pub(crate) template: Option<Arc<Vec<NodeSpec>>>,
    pub(crate) fields: IndexMap<String, FieldEntry>,
    pub(crate) methods: IndexMap<String, Arc<AdvisedMethod>>,
    pub(crate) handlers: Vec<EventHandlerMethod>,
    pub(crate) render_phases: BTreeMap<RenderPhase, Vec<String>>,
    pub(crate) lifecycle: BTreeMap<LifecyclePoint, Vec<String>>,
    pub(crate) initializers: Vec<InstanceInitializer>,
    pub(crate) parameter_fields: IndexMap<String, String>,
}

impl TransformedClass {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &ClassDef {
        &self.def
    }

    pub fn parent(&self) -> Option<&Arc<TransformedClass>> {
        self.parent.as_ref()
    }

    pub fn model(&self) -> &Arc<ComponentModel> {
        &self.model
    }

    /// Class levels, root superclass first.
    pub fn hierarchy(&self) -> Vec<&TransformedClass> {
        let mut levels = self
            .parent
            .as_deref()
            .map(TransformedClass::hierarchy)
            .unwrap_or_default();
        levels.push(self);
        levels
    }

    /// Own template, else the nearest superclass template.
    pub fn template(&self) -> Option<&Arc<Vec<NodeSpec>>> {
        self.template
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.template()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.values()
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .get(name)
            .map(|f| &f.def)
            .or_else(|| self.parent.as_ref().and_then(|p| p.field_def(name)))
    }

    pub fn initializers(&self) -> &[InstanceInitializer] {
        &self.initializers
    }

    /// Most derived declaration of a method.
    pub fn find_method(&self, name: &str) -> Option<&Arc<AdvisedMethod>> {
        self.methods
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.find_method(name)))
    }

    pub fn method_names(&self) -> impl Iterator<Item = &String> {
        self.methods.keys()
    }

    pub fn handlers(&self) -> &[EventHandlerMethod] {
        &self.handlers
    }

    /// All handlers of the hierarchy, superclass first.
    pub fn all_handlers(&self) -> Vec<&EventHandlerMethod> {
        self.hierarchy()
            .into_iter()
            .flat_map(|level| level.handlers.iter())
            .collect()
    }

    pub fn render_phase_methods(&self, phase: RenderPhase) -> &[String] {
        self.render_phases
            .get(&phase)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Field backing a formal parameter.
    pub fn parameter_field(&self, parameter: &str) -> Option<&str> {
        self.parameter_fields
            .get(&parameter.to_ascii_lowercase())
            .map(String::as_str)
            .or_else(|| self.parent.as_ref().and_then(|p| p.parameter_field(parameter)))
    }

    fn method(&self, name: &str) -> TapestryResult<&Arc<AdvisedMethod>> {
        self.methods.get(name).ok_or_else(|| {
            TapestryError::transform(self.name(), format!("no method '{name}'"))
        })
    }

    /// Offers an event to the handlers of this class: superclass handlers first, then own
    /// handlers in declaration order, stopping as soon as the event is aborted.
    pub fn dispatch(
        &self,
        ctx: &mut ComponentContext<'_>,
        event: &mut ComponentEvent,
    ) -> TapestryResult<()> {
        if let Some(parent) = &self.parent {
            parent.dispatch(ctx, event)?;
        }
        for handler in &self.handlers {
            if event.is_aborted() {
                break;
            }
            if !handler.matches(event) {
                continue;
            }
            let method = self.method(&handler.method)?;
            event.mark_handled();
            if let Some(result) = handler.invoke(ctx, method, event)? {
                event.store_result(result, &method.describe())?;
            }
        }
        Ok(())
    }

    /// Runs the methods of one render phase. Before-style phases run the superclass first and
    /// then own methods in declaration order; after-style phases run own methods in reverse
    /// order and then the superclass.
    pub fn invoke_phase(
        &self,
        ctx: &mut ComponentContext<'_>,
        phase: RenderPhase,
        event: &mut ComponentEvent,
    ) -> TapestryResult<()> {
        let own = self.render_phase_methods(phase);
        if phase.is_after() {
            self.invoke_phase_methods(ctx, own.iter().rev(), event)?;
            if let Some(parent) = &self.parent {
                if !event.is_aborted() {
                    parent.invoke_phase(ctx, phase, event)?;
                }
            }
        } else {
            if let Some(parent) = &self.parent {
                parent.invoke_phase(ctx, phase, event)?;
            }
            self.invoke_phase_methods(ctx, own.iter(), event)?;
        }
        Ok(())
    }

    fn invoke_phase_methods<'m>(
        &self,
        ctx: &mut ComponentContext<'_>,
        names: impl Iterator<Item = &'m String>,
        event: &mut ComponentEvent,
    ) -> TapestryResult<()> {
        for name in names {
            if event.is_aborted() {
                break;
            }
            let method = self.method(name)?;
            event.mark_handled();
            let args = method
                .def
                .params
                .iter()
                .map(|p| match p.ty {
                    ValueType::MarkupWriter => Value::Null,
                    _ => p.ty.default_value(),
                })
                .collect();
            if let Some(result) = invoke_advised(ctx, method, args)? {
                event.store_result(result, &method.describe())?;
            }
        }
        Ok(())
    }

    /// Runs page lifecycle methods, superclass first.
    pub fn invoke_lifecycle(
        &self,
        ctx: &mut ComponentContext<'_>,
        point: LifecyclePoint,
    ) -> TapestryResult<()> {
        if let Some(parent) = &self.parent {
            parent.invoke_lifecycle(ctx, point)?;
        }
        let Some(names) = self.lifecycle.get(&point) else {
            return Ok(());
        };
        for name in names {
            let method = self.method(name)?;
            invoke_advised(ctx, method, Vec::new())?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TransformedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformedClass")
            .field("name", &self.def.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
