use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::dispatch::handler::EventHandlerMethod;
use crate::foundation::error::{TapestryError, TapestryResult};
use crate::model::class_def::{Annotation, ClassDef, ClassKind, FieldDef, MethodDef};
use crate::model::component_model::MutableComponentModel;
use crate::model::render_phase::RenderPhase;
use crate::page::lifecycle::LifecyclePoint;
use crate::runtime::services::Services;
use crate::transform::advice::{AdvisedMethod, MethodAdvice, MethodBody, method_body};
use crate::transform::component_class::ComponentClass;
use crate::transform::conduit::{
    ConduitFactory, InstanceInitializer, PerThreadConduit, SharedConduit, conduit_factory,
};
use crate::transform::transformed::{FieldEntry, TransformedClass};

struct MethodBuilder {
    def: MethodDef,
    body: Option<MethodBody>,
    advice: Vec<Arc<dyn MethodAdvice>>,
}

/// Read/write view of a class while the workers run over it.
///
/// Workers claim fields, substitute conduits, introduce members, advise methods and register
/// event handlers and render-phase methods; [`TransformClass::finish`] freezes the result.
pub struct TransformClass<'r> {
    component: &'r ComponentClass,
    parent: Option<Arc<TransformedClass>>,
    model: MutableComponentModel,
    services: Arc<Services>,
    fields: IndexMap<String, FieldDef>,
    claims: HashMap<String, String>,
    conduits: HashMap<String, ConduitFactory>,
    methods: IndexMap<String, MethodBuilder>,
    handlers: Vec<EventHandlerMethod>,
    render_phases: BTreeMap<RenderPhase, Vec<String>>,
    lifecycle: BTreeMap<LifecyclePoint, Vec<String>>,
    initializers: Vec<InstanceInitializer>,
    parameter_fields: IndexMap<String, String>,
}

impl<'r> TransformClass<'r> {
    pub fn new(
        component: &'r ComponentClass,
        parent: Option<Arc<TransformedClass>>,
        services: Arc<Services>,
    ) -> TapestryResult<Self> {
        let def = &component.def;
        let model = MutableComponentModel::new(
            &def.name,
            &def.library,
            def.kind,
            parent.as_ref().map(|p| p.model().clone()),
        );
        Self::with_model(component, parent, services, model)
    }

    /// Starts from an existing model; used to re-apply the pipeline to a finished model.
    pub fn with_model(
        component: &'r ComponentClass,
        parent: Option<Arc<TransformedClass>>,
        services: Arc<Services>,
        model: MutableComponentModel,
    ) -> TapestryResult<Self> {
        component.validate()?;
        let def = &component.def;
        if let Some(parent) = &parent {
            if let Some(field) = def.fields.iter().find(|f| parent.field_def(&f.name).is_some()) {
                return Err(TapestryError::transform(
                    &def.name,
                    format!(
                        "field '{}' is already declared by superclass {}",
                        field.name,
                        parent.name()
                    ),
                ));
            }
        }
        let fields = def
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.clone()))
            .collect();
        let methods = def
            .methods
            .iter()
            .map(|m| {
                (
                    m.name.clone(),
                    MethodBuilder {
                        def: m.clone(),
                        body: component.method_body(&m.name).cloned(),
                        advice: Vec::new(),
                    },
                )
            })
            .collect();
        Ok(Self {
            component,
            parent,
            model,
            services,
            fields,
            claims: HashMap::new(),
            conduits: HashMap::new(),
            methods,
            handlers: Vec::new(),
            render_phases: BTreeMap::new(),
            lifecycle: BTreeMap::new(),
            initializers: Vec::new(),
            parameter_fields: IndexMap::new(),
        })
    }

    pub fn class_name(&self) -> &str {
        &self.component.def.name
    }

    pub fn def(&self) -> &ClassDef {
        &self.component.def
    }

    pub fn kind(&self) -> ClassKind {
        self.component.def.kind
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.component.def.annotations
    }

    pub fn parent(&self) -> Option<&Arc<TransformedClass>> {
        self.parent.as_ref()
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn model(&self) -> &MutableComponentModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut MutableComponentModel {
        &mut self.model
    }

    pub fn into_model(self) -> MutableComponentModel {
        self.model
    }

    pub fn error(&self, message: impl Into<String>) -> TapestryError {
        TapestryError::transform(self.class_name(), message)
    }

    /// Fields declared or introduced by this class, in order.
    pub fn fields(&self) -> Vec<FieldDef> {
        self.fields.values().cloned().collect()
    }

    /// Declared fields carrying an annotation matched by `pred`, not yet claimed.
    pub fn unclaimed_fields_with(&self, pred: impl Fn(&Annotation) -> bool) -> Vec<FieldDef> {
        self.fields
            .values()
            .filter(|f| !self.claims.contains_key(&f.name))
            .filter(|f| f.annotations.iter().any(&pred))
            .cloned()
            .collect()
    }

    pub fn is_claimed(&self, field: &str) -> bool {
        self.claims.contains_key(field)
    }

    /// Marks a field as owned by one worker. Claiming twice is an error.
    pub fn claim_field(&mut self, field: &str, by: &str) -> TapestryResult<()> {
        if !self.fields.contains_key(field) {
            return Err(self.error(format!("{by} claims unknown field '{field}'")));
        }
        if let Some(previous) = self.claims.get(field) {
            return Err(self.error(format!(
                "field '{field}' is already claimed by {previous} and cannot be claimed by {by}"
            )));
        }
        self.claims.insert(field.to_string(), by.to_string());
        Ok(())
    }

    pub fn set_conduit(&mut self, field: &str, factory: ConduitFactory) -> TapestryResult<()> {
        if !self.fields.contains_key(field) {
            return Err(self.error(format!("no field '{field}' to receive a conduit")));
        }
        self.conduits.insert(field.to_string(), factory);
        Ok(())
    }

    pub fn has_conduit(&self, field: &str) -> bool {
        self.conduits.contains_key(field)
    }

    pub fn introduce_field(&mut self, field: FieldDef) -> TapestryResult<()> {
        if self.fields.contains_key(&field.name)
            || self.parent.as_ref().is_some_and(|p| p.field_def(&field.name).is_some())
        {
            return Err(self.error(format!("field '{}' already exists", field.name)));
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Methods declared or introduced by this class.
    pub fn methods(&self) -> Vec<MethodDef> {
        self.methods.values().map(|m| m.def.clone()).collect()
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name).map(|m| &m.def)
    }

    /// True when this class or a superclass declares the method.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
            || self.parent.as_ref().is_some_and(|p| p.find_method(name).is_some())
    }

    pub fn introduce_method(&mut self, def: MethodDef, body: MethodBody) -> TapestryResult<()> {
        if self.methods.contains_key(&def.name) {
            return Err(self.error(format!("method '{}' already exists", def.name)));
        }
        tracing::trace!(class = self.class_name(), method = %def.name, "introduced method");
        self.methods.insert(
            def.name.clone(),
            MethodBuilder {
                def,
                body: Some(body),
                advice: Vec::new(),
            },
        );
        Ok(())
    }

    /// Wraps a method of this class; advice added first runs outermost.
    pub fn add_advice(&mut self, method: &str, advice: Arc<dyn MethodAdvice>) -> TapestryResult<()> {
        let name = self.class_name().to_string();
        let builder = self.methods.get_mut(method).ok_or_else(|| {
            TapestryError::transform(name, format!("cannot advise unknown method '{method}'"))
        })?;
        builder.advice.push(advice);
        Ok(())
    }

    pub fn add_event_handler(&mut self, handler: EventHandlerMethod) -> TapestryResult<()> {
        if !self.methods.contains_key(&handler.method) {
            return Err(self.error(format!(
                "event handler refers to unknown method '{}'",
                handler.method
            )));
        }
        if !self.handlers.contains(&handler) {
            self.handlers.push(handler);
        }
        Ok(())
    }

    pub fn handlers(&self) -> &[EventHandlerMethod] {
        &self.handlers
    }

    pub fn add_render_phase_method(&mut self, phase: RenderPhase, method: &str) {
        let methods = self.render_phases.entry(phase).or_default();
        if !methods.iter().any(|m| m == method) {
            methods.push(method.to_string());
        }
    }

    pub fn add_lifecycle_method(&mut self, point: LifecyclePoint, method: &str) {
        let methods = self.lifecycle.entry(point).or_default();
        if !methods.iter().any(|m| m == method) {
            methods.push(method.to_string());
        }
    }

    pub fn add_initializer(&mut self, initializer: InstanceInitializer) {
        self.initializers.push(initializer);
    }

    pub fn register_parameter_field(&mut self, parameter: &str, field: &str) {
        self.parameter_fields
            .insert(parameter.to_ascii_lowercase(), field.to_string());
    }

    /// Freezes the class. Fields without a conduit become per-request (or, when static,
    /// class-shared) storage.
    pub fn finish(self) -> TapestryResult<TransformedClass> {
        let name = self.component.def.name.clone();
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (field_name, def) in self.fields {
            let factory = match self.conduits.get(&field_name) {
                Some(factory) => factory.clone(),
                None => default_conduit(&def),
            };
            fields.insert(field_name, FieldEntry { def, factory });
        }

        let mut methods = IndexMap::with_capacity(self.methods.len());
        for (method_name, builder) in self.methods {
            let body = match builder.body {
                Some(body) => body,
                None if self.component.allow_missing_bodies => missing_body(&name, &builder.def),
                None => {
                    return Err(TapestryError::transform(
                        &name,
                        format!("method '{method_name}' has no implementation"),
                    ));
                }
            };
            let advised = AdvisedMethod::new(builder.def, &name, body, builder.advice);
            methods.insert(method_name, Arc::new(advised));
        }

        Ok(TransformedClass {
            def: Arc::new(self.component.def.clone()),
            parent: self.parent,
            model: self.model.freeze(),
            template: self.component.template.clone().map(Arc::new),
            fields,
            methods,
            handlers: self.handlers,
            render_phases: self.render_phases,
            lifecycle: self.lifecycle,
            initializers: self.initializers,
            parameter_fields: self.parameter_fields,
        })
    }
}

/// Storage for a plain field: per request, or shared by the class when static.
pub fn default_conduit(field: &FieldDef) -> ConduitFactory {
    let ty = field.ty.clone();
    let initial = field.default_value();
    if field.is_static {
        let shared = Arc::new(Mutex::new(initial));
        return conduit_factory(move |_setup| {
            Ok(Arc::new(SharedConduit::new(ty.clone(), shared.clone())))
        });
    }
    let slot = format!("field:{}", field.name);
    conduit_factory(move |setup| {
        Ok(Arc::new(PerThreadConduit::new(
            setup.per_thread(slot.clone()),
            ty.clone(),
            initial.clone(),
        )))
    })
}

fn missing_body(class: &str, def: &MethodDef) -> MethodBody {
    let description = def.describe(class);
    method_body(move |_ctx, _args| {
        Err(TapestryError::event_handler(
            description.clone(),
            "method has no implementation",
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/transform/class.rs"]
mod tests;
