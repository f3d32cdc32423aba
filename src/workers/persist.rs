use std::sync::Arc;

use crate::foundation::error::TapestryResult;
use crate::foundation::value::{Value, ValueType};
use crate::model::class_def::Annotation;
use crate::page::context::ComponentContext;
use crate::persist::manager::FieldKey;
use crate::runtime::perthread::PerThreadValue;
use crate::transform::advice::{MethodAdvice, MethodInvocation};
use crate::transform::class::TransformClass;
use crate::transform::conduit::{FieldConduit, conduit_factory};
use crate::transform::worker::TransformWorker;
use crate::workers::property_name;

/// Persistent fields: values are gathered from their strategy on first read in a request and
/// handed back to it on every write.
pub struct PersistWorker;

impl TransformWorker for PersistWorker {
    fn name(&self) -> &'static str {
        "Persist"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Mixin"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class.unclaimed_fields_with(|a| matches!(a, Annotation::Persist { .. }));
        for field in fields {
            let declared = field.annotations.iter().find_map(|a| match a {
                Annotation::Persist { strategy } => strategy.clone(),
                _ => None,
            });
            if field.is_static {
                return Err(class.error(format!(
                    "static field '{}' may not be persistent",
                    field.name
                )));
            }
            class.claim_field(&field.name, self.name())?;
            let services = class.services().clone();
            let strategy = match declared {
                Some(s) if !s.is_empty() => s,
                _ => services.persistence().default_strategy().to_string(),
            };
            services.persistence().strategy(&strategy).map_err(|e| {
                class.error(format!("field '{}': {e}", field.name))
            })?;
            let logical = class
                .model_mut()
                .set_field_persistence_strategy(&field.name, &strategy);

            let ty = field.ty.clone();
            let initial = field.default_value();
            let slot = format!("persist:{}", field.name);
            class.set_conduit(
                &field.name,
                conduit_factory(move |setup| {
                    Ok(Arc::new(PersistentFieldConduit {
                        logical: logical.clone(),
                        strategy: strategy.clone(),
                        ty: ty.clone(),
                        initial: initial.clone(),
                        slot: setup.per_thread(slot.clone()),
                    }) as Arc<dyn FieldConduit>)
                }),
            )?;
        }
        Ok(())
    }
}

struct PersistentFieldConduit {
    logical: String,
    strategy: String,
    ty: ValueType,
    initial: Value,
    slot: PerThreadValue,
}

impl PersistentFieldConduit {
    fn key(&self, ctx: &ComponentContext<'_>) -> TapestryResult<FieldKey> {
        let resources = ctx.resources()?;
        let component = resources
            .complete_id
            .split_once(':')
            .map(|(_, nested)| nested)
            .unwrap_or_default();
        Ok(FieldKey::new(&resources.page_name, component, &self.logical))
    }
}

impl FieldConduit for PersistentFieldConduit {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        if let Some(value) = self.slot.get(ctx.per_thread()) {
            return Ok(value);
        }
        let key = self.key(ctx)?;
        let services = ctx.services();
        let value = match services
            .persistence()
            .gather(ctx.request(), &self.strategy, &key)?
        {
            Some(v) => services.coercer().coerce(v, &self.ty)?,
            None => self.initial.clone(),
        };
        self.slot.set(ctx.per_thread(), value.clone());
        Ok(value)
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        let services = ctx.services();
        let value = services.coercer().coerce(value, &self.ty)?;
        let key = self.key(ctx)?;
        self.slot.set(ctx.per_thread(), value.clone());
        services
            .persistence()
            .post_change(ctx.request(), &self.strategy, &key, value)
    }
}

/// Fields stored directly under a session attribute name, shared by every page.
pub struct SessionAttributeWorker;

impl TransformWorker for SessionAttributeWorker {
    fn name(&self) -> &'static str {
        "SessionAttribute"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Persist"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields =
            class.unclaimed_fields_with(|a| matches!(a, Annotation::SessionAttribute { .. }));
        for field in fields {
            class.claim_field(&field.name, self.name())?;
            let attribute = field
                .annotations
                .iter()
                .find_map(|a| match a {
                    Annotation::SessionAttribute { value } => value.clone(),
                    _ => None,
                })
                .unwrap_or_else(|| property_name(&field.name).to_string());
            let conduit: Arc<dyn FieldConduit> = Arc::new(SessionAttributeConduit {
                attribute,
                ty: field.ty.clone(),
                initial: field.default_value(),
            });
            class.set_conduit(&field.name, conduit_factory(move |_| Ok(conduit.clone())))?;
        }
        Ok(())
    }
}

struct SessionAttributeConduit {
    attribute: String,
    ty: ValueType,
    initial: Value,
}

impl FieldConduit for SessionAttributeConduit {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        let stored = ctx.request().session().get(&self.attribute);
        match stored {
            Some(v) => ctx.services().coercer().coerce(v, &self.ty),
            None => Ok(self.initial.clone()),
        }
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        let value = ctx.services().coercer().coerce(value, &self.ty)?;
        let session = ctx.request().session().clone();
        if value.is_null() {
            session.remove(&self.attribute);
        } else {
            session.set(&self.attribute, value);
        }
        Ok(())
    }
}

/// After a `DiscardAfter` method completes without error, every persisted value of the page
/// is dropped.
pub struct DiscardAfterWorker;

impl TransformWorker for DiscardAfterWorker {
    fn name(&self) -> &'static str {
        "DiscardAfter"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Cached"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let methods: Vec<String> = class
            .methods()
            .into_iter()
            .filter(|m| m.has(&Annotation::DiscardAfter))
            .map(|m| m.name)
            .collect();
        for method in methods {
            class.add_advice(&method, Arc::new(DiscardAfterAdvice))?;
        }
        Ok(())
    }
}

struct DiscardAfterAdvice;

impl MethodAdvice for DiscardAfterAdvice {
    fn advise(&self, invocation: &mut MethodInvocation<'_, '_>) -> TapestryResult<()> {
        invocation.proceed()?;
        let ctx = invocation.ctx();
        let page = ctx.page().name.clone();
        let services = ctx.services();
        tracing::debug!(page = %page, method = %invocation.method().name(), "discarding persistent field changes");
        services.persistence().discard(invocation.ctx().request(), &page)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workers/persist.rs"]
mod tests;
