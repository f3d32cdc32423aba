use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::InstanceLocator;
use crate::foundation::value::Value;
use crate::model::class_def::MethodDef;
use crate::page::context::ComponentContext;

/// Implementation of a component method. Returns `None` for void methods.
pub type MethodBody = Arc<
    dyn Fn(&mut ComponentContext<'_>, &[Value]) -> TapestryResult<Option<Value>> + Send + Sync,
>;

/// Boxes a closure as a [`MethodBody`].
pub fn method_body<F>(f: F) -> MethodBody
where
    F: Fn(&mut ComponentContext<'_>, &[Value]) -> TapestryResult<Option<Value>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Interception around a method: may inspect or replace arguments, skip or repeat the call,
/// or replace the result.
pub trait MethodAdvice: Send + Sync {
    fn advise(&self, invocation: &mut MethodInvocation<'_, '_>) -> TapestryResult<()>;
}

/// A method body together with the advice applied to it, outermost first.
pub struct AdvisedMethod {
    pub def: MethodDef,
    pub declaring_class: String,
    body: MethodBody,
    advice: Vec<Arc<dyn MethodAdvice>>,
}

impl AdvisedMethod {
    pub fn new(
        def: MethodDef,
        declaring_class: impl Into<String>,
        body: MethodBody,
        advice: Vec<Arc<dyn MethodAdvice>>,
    ) -> Self {
        Self {
            def,
            declaring_class: declaring_class.into(),
            body,
            advice,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn describe(&self) -> String {
        self.def.describe(&self.declaring_class)
    }

    pub fn advice_count(&self) -> usize {
        self.advice.len()
    }
}

impl std::fmt::Debug for AdvisedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisedMethod")
            .field("method", &self.describe())
            .field("advice", &self.advice.len())
            .finish()
    }
}

/// One in-flight call travelling through the advice chain.
pub struct MethodInvocation<'c, 'a> {
    ctx: &'c mut ComponentContext<'a>,
    method: Arc<AdvisedMethod>,
    next: usize,
    args: Vec<Value>,
    result: Option<Value>,
}

impl<'c, 'a> MethodInvocation<'c, 'a> {
    fn new(
        ctx: &'c mut ComponentContext<'a>,
        method: Arc<AdvisedMethod>,
        next: usize,
        args: Vec<Value>,
    ) -> Self {
        Self {
            ctx,
            method,
            next,
            args,
            result: None,
        }
    }

    pub fn ctx(&mut self) -> &mut ComponentContext<'a> {
        &mut *self.ctx
    }

    pub fn method(&self) -> &AdvisedMethod {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn set_arg(&mut self, index: usize, value: Value) -> TapestryResult<()> {
        let describe = self.method.describe();
        let slot = self.args.get_mut(index).ok_or_else(|| {
            TapestryError::event_handler(describe, format!("no argument at index {index}"))
        })?;
        *slot = value;
        Ok(())
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Option<Value>) {
        self.result = result;
    }

    /// Runs the rest of the chain: the next advice, or the body once all advice has run.
    pub fn proceed(&mut self) -> TapestryResult<()> {
        let at = self.next;
        if let Some(advice) = self.method.advice.get(at).cloned() {
            self.next = at + 1;
            let outcome = advice.advise(self);
            self.next = at;
            outcome
        } else {
            let body = self.method.body.clone();
            self.result = body(self.ctx, &self.args)?;
            Ok(())
        }
    }

    /// Captures the remainder of the chain so it can run later, against the same component.
    pub fn defer(&self) -> DeferredInvocation {
        DeferredInvocation {
            locator: self.ctx.locator(),
            method: self.method.clone(),
            next: self.next,
            args: self.args.clone(),
        }
    }
}

/// The tail of an advice chain, captured for later execution.
pub struct DeferredInvocation {
    locator: InstanceLocator,
    method: Arc<AdvisedMethod>,
    next: usize,
    args: Vec<Value>,
}

impl DeferredInvocation {
    pub fn run(self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Option<Value>> {
        let mut target = ctx.at(self.locator);
        let mut invocation = MethodInvocation::new(&mut target, self.method, self.next, self.args);
        invocation.proceed()?;
        Ok(invocation.result)
    }
}

/// Invokes a method through its full advice chain.
pub fn invoke_advised(
    ctx: &mut ComponentContext<'_>,
    method: &Arc<AdvisedMethod>,
    args: Vec<Value>,
) -> TapestryResult<Option<Value>> {
    if args.len() != method.def.params.len() {
        return Err(TapestryError::event_handler(
            method.describe(),
            format!(
                "expects {} argument(s) but was invoked with {}",
                method.def.params.len(),
                args.len()
            ),
        ));
    }
    let mut invocation = MethodInvocation::new(ctx, method.clone(), 0, args);
    invocation.proceed()?;
    Ok(invocation.result)
}
