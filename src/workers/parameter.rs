use std::sync::{Arc, Mutex};

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::lock;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::{Annotation, ParameterAnn};
use crate::model::component_model::ParameterModel;
use crate::page::binding::{Binding, LiteralBinding, PropBinding};
use crate::page::context::{ComponentContext, capitalize};
use crate::page::lifecycle::InstanceLifecycle;
use crate::runtime::perthread::PerThreadValue;
use crate::transform::advice::invoke_advised;
use crate::transform::class::TransformClass;
use crate::transform::conduit::{FieldConduit, conduit_factory};
use crate::transform::worker::TransformWorker;
use crate::workers::property_name;

/// Turns `Parameter` fields into formal parameters read and written through their bindings.
pub struct ParameterWorker;

impl TransformWorker for ParameterWorker {
    fn name(&self) -> &'static str {
        "Parameter"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Meta"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class.unclaimed_fields_with(|a| matches!(a, Annotation::Parameter(_)));
        for field in fields {
            let Some(ann) = field.annotations.iter().find_map(|a| match a {
                Annotation::Parameter(p) => Some(p.clone()),
                _ => None,
            }) else {
                continue;
            };
            class.claim_field(&field.name, self.name())?;
            let parameter = ann
                .name
                .clone()
                .unwrap_or_else(|| property_name(&field.name).to_string());
            if parameter.is_empty() {
                return Err(class.error(format!(
                    "field '{}' does not yield a parameter name",
                    field.name
                )));
            }
            if ann.required && ann.value.is_some() {
                return Err(class.error(format!(
                    "parameter '{parameter}' is required and also declares a default value"
                )));
            }
            let default_prefix = ann.default_prefix.clone().unwrap_or_else(|| "prop".into());
            class.model_mut().add_parameter(ParameterModel {
                name: parameter.clone(),
                required: ann.required,
                allow_null: ann.allow_null && !field.ty.is_primitive(),
                default_prefix: default_prefix.clone(),
                cached: ann.cache,
                principal: ann.principal,
                autoconnect: ann.autoconnect,
            })?;
            class.register_parameter_field(&parameter, &field.name);

            let spec = Arc::new(ParameterSpec {
                class: class.class_name().to_string(),
                field: field.name.clone(),
                parameter,
                ty: field.ty.clone(),
                initial: field.default_value(),
                default_prefix,
                ann,
            });
            class.set_conduit(
                &field.name,
                conduit_factory(move |setup| {
                    let conduit = Arc::new(ParameterConduit {
                        spec: spec.clone(),
                        cache: setup.per_thread(format!("param:{}", spec.field)),
                        state: Mutex::new(ParameterState {
                            loaded: false,
                            default: spec.initial.clone(),
                            binding: None,
                            invariant: None,
                        }),
                    });
                    setup.add_listener(conduit.clone());
                    Ok(conduit as Arc<dyn FieldConduit>)
                }),
            )?;
        }
        Ok(())
    }
}

struct ParameterSpec {
    class: String,
    field: String,
    parameter: String,
    ty: ValueType,
    initial: Value,
    default_prefix: String,
    ann: ParameterAnn,
}

/// Instance-lifetime state. Request-scoped cached values live in the per-thread slot.
struct ParameterState {
    loaded: bool,
    default: Value,
    binding: Option<Arc<dyn Binding>>,
    invariant: Option<Value>,
}

/// Parameter field: UNLOADED until the page finishes loading, then LOADED with reads going
/// through the binding and cached while the component renders (or for the life of the
/// instance when the binding is invariant).
struct ParameterConduit {
    spec: Arc<ParameterSpec>,
    cache: PerThreadValue,
    state: Mutex<ParameterState>,
}

impl ParameterConduit {
    fn error(&self, ctx: &ComponentContext<'_>, message: impl Into<String>) -> TapestryError {
        TapestryError::binding(ctx.complete_id(), &self.spec.parameter, message)
    }

    fn coerce(&self, ctx: &ComponentContext<'_>, value: Value) -> TapestryResult<Value> {
        ctx.services()
            .coercer()
            .coerce(value, &self.spec.ty)
            .map_err(|e| self.error(ctx, e.to_string()))
    }

    fn describe(&self, ctx: &ComponentContext<'_>) -> String {
        format!("parameter {} of {}", self.spec.parameter, ctx.complete_id())
    }

    /// Binding used when the container binds nothing: the declared default expression, then
    /// autoconnect to the container, then a `default<Name>()` method.
    fn default_binding(
        &self,
        ctx: &mut ComponentContext<'_>,
    ) -> TapestryResult<Option<Arc<dyn Binding>>> {
        let description = self.describe(ctx);
        if let Some(expression) = &self.spec.ann.value {
            let binding = ctx.services().bindings().new_binding(
                &description,
                ctx.locator(),
                &self.spec.default_prefix,
                expression,
            )?;
            return Ok(Some(binding));
        }
        if self.spec.ann.autoconnect {
            if let Some(container) = ctx.container_locator() {
                let target = ctx.at(container);
                let class = target.instance()?.class().clone();
                let cap = capitalize(&self.spec.parameter);
                let has_property = target.instance()?.has_field(&self.spec.parameter)
                    || class.find_method(&format!("get{cap}")).is_some()
                    || class.find_method(&format!("is{cap}")).is_some();
                if has_property {
                    return Ok(Some(Arc::new(PropBinding::new(
                        description,
                        container,
                        self.spec.parameter.clone(),
                    ))));
                }
            }
        }
        let method_name = format!("default{}", capitalize(&self.spec.parameter));
        let class = ctx.instance()?.class().clone();
        if let Some(method) = class.find_method(&method_name) {
            if method.def.params.is_empty() {
                let method = method.clone();
                let value = invoke_advised(ctx, &method, Vec::new())?.unwrap_or(Value::Null);
                if !value.is_null() {
                    return Ok(Some(Arc::new(LiteralBinding::new(description, value))));
                }
            }
        }
        Ok(None)
    }
}

impl FieldConduit for ParameterConduit {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        let (binding, default) = {
            let state = lock(&self.state);
            if !state.loaded {
                return Ok(state.default.clone());
            }
            if let Some(value) = &state.invariant {
                return Ok(value.clone());
            }
            (state.binding.clone(), state.default.clone())
        };
        if let Some(value) = self.cache.get(ctx.per_thread()) {
            return Ok(value);
        }
        let Some(binding) = binding else {
            return Ok(default);
        };
        let raw = binding.get(ctx)?;
        let value = self.coerce(ctx, raw)?;
        if value.is_null() && !self.spec.ann.allow_null {
            return Err(self.error(
                ctx,
                format!(
                    "parameter is bound to null ({}); this parameter does not allow null",
                    binding.describe()
                ),
            ));
        }
        if self.spec.ann.cache {
            if binding.is_invariant() {
                lock(&self.state).invariant = Some(value.clone());
            } else if ctx.is_rendering() {
                self.cache.set(ctx.per_thread(), value.clone());
            }
        }
        Ok(value)
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        let value = self.coerce(ctx, value)?;
        let binding = {
            let mut state = lock(&self.state);
            if !state.loaded {
                state.default = value;
                return Ok(());
            }
            state.binding.clone()
        };
        match binding {
            None => self.cache.set(ctx.per_thread(), value),
            Some(binding) => {
                binding
                    .set(ctx, value.clone())
                    .map_err(|e| self.error(ctx, e.to_string()))?;
                if self.spec.ann.cache && ctx.is_rendering() {
                    self.cache.set(ctx.per_thread(), value);
                } else {
                    self.cache.remove(ctx.per_thread());
                }
            }
        }
        Ok(())
    }
}

impl InstanceLifecycle for ParameterConduit {
    fn did_load(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        let resources = ctx.resources()?.clone();
        let mut binding = resources.binding(&self.spec.parameter);
        if binding.is_none() {
            binding = self.default_binding(ctx)?;
            if let Some(b) = &binding {
                resources.bind(&self.spec.parameter, b.clone());
            }
        }
        if binding.is_none() && self.spec.ann.required {
            return Err(self.error(
                ctx,
                format!(
                    "parameter is required but has not been bound (field {} of {})",
                    self.spec.field, self.spec.class
                ),
            ));
        }
        tracing::trace!(
            component = %resources.complete_id,
            parameter = %self.spec.parameter,
            bound = binding.is_some(),
            "parameter loaded"
        );
        let mut state = lock(&self.state);
        state.loaded = true;
        state.binding = binding;
        Ok(())
    }

    fn detached(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        self.cache.remove(ctx.per_thread());
        Ok(())
    }

    fn reset(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        self.cache.remove(ctx.per_thread());
        Ok(())
    }

    fn post_render_cleanup(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        self.cache.remove(ctx.per_thread());
        Ok(())
    }
}

/// Binds mixin fields to a parameter of the component the mixin is attached to.
pub struct BindParameterWorker;

impl TransformWorker for BindParameterWorker {
    fn name(&self) -> &'static str {
        "BindParameter"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Parameter"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class.unclaimed_fields_with(|a| matches!(a, Annotation::BindParameter { .. }));
        if fields.is_empty() {
            return Ok(());
        }
        if class.kind() != crate::model::class_def::ClassKind::Mixin {
            return Err(class.error("BindParameter may only be used in mixin classes"));
        }
        for field in fields {
            class.claim_field(&field.name, self.name())?;
            let mut names: Vec<String> = field
                .annotations
                .iter()
                .find_map(|a| match a {
                    Annotation::BindParameter { value } => Some(value.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            if names.is_empty() {
                names.push(property_name(&field.name).to_string());
            }
            let conduit: Arc<dyn FieldConduit> = Arc::new(BoundParameterConduit {
                field: field.name.clone(),
                names,
            });
            class.set_conduit(&field.name, conduit_factory(move |_| Ok(conduit.clone())))?;
        }
        Ok(())
    }
}

struct BoundParameterConduit {
    field: String,
    names: Vec<String>,
}

impl BoundParameterConduit {
    fn target(&self, core: &ComponentContext<'_>) -> TapestryResult<String> {
        let class = core.instance()?.class().clone();
        self.names
            .iter()
            .find(|n| class.parameter_field(n).is_some())
            .cloned()
            .ok_or_else(|| {
                TapestryError::binding(
                    core.complete_id(),
                    self.names.join("|"),
                    format!(
                        "mixin field '{}' binds to a parameter the component does not declare",
                        self.field
                    ),
                )
            })
    }
}

impl FieldConduit for BoundParameterConduit {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        let core = ctx.core_locator();
        let mut core = ctx.at(core);
        let name = self.target(&core)?;
        core.read_parameter(&name)
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        let core = ctx.core_locator();
        let mut core = ctx.at(core);
        let name = self.target(&core)?;
        core.write_parameter(&name, value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workers/parameter.rs"]
mod tests;
