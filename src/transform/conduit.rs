use std::sync::{Arc, Mutex};

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::InstanceId;
use crate::foundation::lock;
use crate::foundation::value::{Value, ValueType};
use crate::page::context::ComponentContext;
use crate::page::lifecycle::InstanceLifecycle;
use crate::page::resources::ComponentResources;
use crate::runtime::perthread::PerThreadValue;
use crate::runtime::services::Services;

/// Get/set logic substituted for direct access to a component field.
pub trait FieldConduit: Send + Sync {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value>;
    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()>;
}

/// Builds the conduit of one field for a new component instance.
pub type ConduitFactory =
    Arc<dyn Fn(&mut InstanceSetup<'_>) -> TapestryResult<Arc<dyn FieldConduit>> + Send + Sync>;

/// Runs once per new instance after its conduits exist (listener registration and the like).
pub type InstanceInitializer =
    Arc<dyn Fn(&mut InstanceSetup<'_>) -> TapestryResult<()> + Send + Sync>;

/// Boxes a closure as a [`ConduitFactory`].
pub fn conduit_factory<F>(f: F) -> ConduitFactory
where
    F: Fn(&mut InstanceSetup<'_>) -> TapestryResult<Arc<dyn FieldConduit>> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn initializer<F>(f: F) -> InstanceInitializer
where
    F: Fn(&mut InstanceSetup<'_>) -> TapestryResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a conduit factory can see while an instance is being constructed.
pub struct InstanceSetup<'a> {
    resources: &'a Arc<ComponentResources>,
    services: &'a Arc<Services>,
    listeners: Vec<Arc<dyn InstanceLifecycle>>,
}

impl<'a> InstanceSetup<'a> {
    pub fn new(resources: &'a Arc<ComponentResources>, services: &'a Arc<Services>) -> Self {
        Self {
            resources,
            services,
            listeners: Vec::new(),
        }
    }

    pub fn resources(&self) -> &Arc<ComponentResources> {
        self.resources
    }

    pub fn services(&self) -> &Arc<Services> {
        self.services
    }

    pub fn instance(&self) -> InstanceId {
        self.resources.instance
    }

    pub fn per_thread(&self, slot: impl Into<String>) -> PerThreadValue {
        PerThreadValue::new(self.resources.instance, slot)
    }

    pub fn add_listener(&mut self, listener: Arc<dyn InstanceLifecycle>) {
        self.listeners.push(listener);
    }

    pub fn into_listeners(self) -> Vec<Arc<dyn InstanceLifecycle>> {
        self.listeners
    }
}

fn read_only(field: &str, owner: &str) -> TapestryError {
    TapestryError::transform(owner, format!("field '{field}' is read-only"))
}

/// Read-only field with a value fixed at instance construction.
pub struct ConstantConduit {
    field: String,
    owner: String,
    value: Value,
}

impl ConstantConduit {
    pub fn new(field: impl Into<String>, owner: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            owner: owner.into(),
            value,
        }
    }
}

impl FieldConduit for ConstantConduit {
    fn get(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        Ok(self.value.clone())
    }

    fn set(&self, _ctx: &mut ComponentContext<'_>, _value: Value) -> TapestryResult<()> {
        Err(read_only(&self.field, &self.owner))
    }
}

pub type ComputeFn = Arc<dyn Fn(&mut ComponentContext<'_>) -> TapestryResult<Value> + Send + Sync>;

pub fn compute<F>(f: F) -> ComputeFn
where
    F: Fn(&mut ComponentContext<'_>) -> TapestryResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Read-only field recomputed from the request on every read.
pub struct ComputedConduit {
    field: String,
    owner: String,
    compute: ComputeFn,
}

impl ComputedConduit {
    pub fn new(field: impl Into<String>, owner: impl Into<String>, compute: ComputeFn) -> Self {
        Self {
            field: field.into(),
            owner: owner.into(),
            compute,
        }
    }
}

impl FieldConduit for ComputedConduit {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        (self.compute)(ctx)
    }

    fn set(&self, _ctx: &mut ComponentContext<'_>, _value: Value) -> TapestryResult<()> {
        Err(read_only(&self.field, &self.owner))
    }
}

/// Mutable field whose value lives in the request's per-thread store; every request starts
/// from the declared initial value.
pub struct PerThreadConduit {
    slot: PerThreadValue,
    ty: ValueType,
    initial: Value,
}

impl PerThreadConduit {
    pub fn new(slot: PerThreadValue, ty: ValueType, initial: Value) -> Self {
        Self { slot, ty, initial }
    }
}

impl FieldConduit for PerThreadConduit {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        Ok(self.slot.get_or(ctx.per_thread(), self.initial.clone()))
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        let value = ctx.services().coercer().coerce(value, &self.ty)?;
        self.slot.set(ctx.per_thread(), value);
        Ok(())
    }
}

/// Static field: one value shared by every instance of the class.
pub struct SharedConduit {
    ty: ValueType,
    value: Arc<Mutex<Value>>,
}

impl SharedConduit {
    pub fn new(ty: ValueType, value: Arc<Mutex<Value>>) -> Self {
        Self { ty, value }
    }
}

impl FieldConduit for SharedConduit {
    fn get(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        Ok(lock(&self.value).clone())
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        let value = ctx.services().coercer().coerce(value, &self.ty)?;
        *lock(&self.value) = value;
        Ok(())
    }
}
