use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::InstanceLocator;
use crate::foundation::value::Value;
use crate::page::context::ComponentContext;

/// Source of a parameter value, resolved against the component that owns the expression.
pub trait Binding: Send + Sync {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value>;

    fn set(&self, _ctx: &mut ComponentContext<'_>, _value: Value) -> TapestryResult<()> {
        Err(TapestryError::config(format!(
            "{} is read-only",
            self.describe()
        )))
    }

    /// Invariant bindings always produce the same value; parameters cache them for the life
    /// of the page instance.
    fn is_invariant(&self) -> bool {
        false
    }

    fn describe(&self) -> String;
}

/// Fixed value.
#[derive(Clone, Debug)]
pub struct LiteralBinding {
    value: Value,
    description: String,
}

impl LiteralBinding {
    pub fn new(description: impl Into<String>, value: Value) -> Self {
        Self {
            value,
            description: description.into(),
        }
    }
}

impl Binding for LiteralBinding {
    fn get(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        Ok(self.value.clone())
    }

    fn is_invariant(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("literal {:?} ({})", self.value.to_client_string(), self.description)
    }
}

/// Property path read from, and written to, the owning component.
#[derive(Clone, Debug)]
pub struct PropBinding {
    owner: InstanceLocator,
    path: String,
    description: String,
}

impl PropBinding {
    pub fn new(description: impl Into<String>, owner: InstanceLocator, path: impl Into<String>) -> Self {
        Self {
            owner,
            path: path.into(),
            description: description.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Binding for PropBinding {
    fn get(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<Value> {
        ctx.at(self.owner).read_property(&self.path)
    }

    fn set(&self, ctx: &mut ComponentContext<'_>, value: Value) -> TapestryResult<()> {
        ctx.at(self.owner).write_property(&self.path, value)
    }

    fn describe(&self) -> String {
        format!("prop:{} ({})", self.path, self.description)
    }
}

/// Creates bindings for one prefix.
pub trait BindingFactory: Send + Sync {
    fn new_binding(
        &self,
        description: &str,
        owner: InstanceLocator,
        expression: &str,
    ) -> TapestryResult<Arc<dyn Binding>>;
}

/// Turns `prefix:expression` strings into bindings.
pub trait BindingSource: Send + Sync {
    fn new_binding(
        &self,
        description: &str,
        owner: InstanceLocator,
        default_prefix: &str,
        expression: &str,
    ) -> TapestryResult<Arc<dyn Binding>>;
}

struct LiteralFactory;

impl BindingFactory for LiteralFactory {
    fn new_binding(
        &self,
        description: &str,
        _owner: InstanceLocator,
        expression: &str,
    ) -> TapestryResult<Arc<dyn Binding>> {
        Ok(Arc::new(LiteralBinding::new(description, Value::from(expression))))
    }
}

struct PropFactory;

impl BindingFactory for PropFactory {
    fn new_binding(
        &self,
        description: &str,
        owner: InstanceLocator,
        expression: &str,
    ) -> TapestryResult<Arc<dyn Binding>> {
        let expr = expression.trim();
        if let Some(value) = constant(expr) {
            return Ok(Arc::new(LiteralBinding::new(description, value)));
        }
        if expr.is_empty() {
            return Err(TapestryError::config(format!(
                "empty property expression ({description})"
            )));
        }
        Ok(Arc::new(PropBinding::new(description, owner, expr)))
    }
}

/// Keywords and literal forms allowed inside property expressions.
fn constant(expr: &str) -> Option<Value> {
    match expr {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }
    if let Some(inner) = expr
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        return Some(Value::from(inner));
    }
    if let Ok(v) = expr.parse::<i64>() {
        return Some(Value::Long(v));
    }
    if expr.contains('.')
        && expr.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-')
    {
        if let Ok(v) = expr.parse::<f64>() {
            return Some(Value::Double(v));
        }
    }
    None
}

/// The validator specification is passed through as a string.
struct ValidateFactory;

impl BindingFactory for ValidateFactory {
    fn new_binding(
        &self,
        description: &str,
        _owner: InstanceLocator,
        expression: &str,
    ) -> TapestryResult<Arc<dyn Binding>> {
        Ok(Arc::new(LiteralBinding::new(
            description,
            Value::from(expression.trim()),
        )))
    }
}

/// Prefix registry with `literal`, `prop` and `validate` built in.
pub struct DefaultBindingSource {
    factories: HashMap<String, Arc<dyn BindingFactory>>,
}

impl DefaultBindingSource {
    pub fn new() -> Self {
        let mut factories: HashMap<String, Arc<dyn BindingFactory>> = HashMap::new();
        factories.insert("literal".to_string(), Arc::new(LiteralFactory));
        factories.insert("prop".to_string(), Arc::new(PropFactory));
        factories.insert("validate".to_string(), Arc::new(ValidateFactory));
        Self { factories }
    }

    pub fn with_factory(mut self, prefix: &str, factory: Arc<dyn BindingFactory>) -> Self {
        self.factories.insert(prefix.to_ascii_lowercase(), factory);
        self
    }

    pub fn prefixes(&self) -> Vec<String> {
        let mut out: Vec<String> = self.factories.keys().cloned().collect();
        out.sort();
        out
    }
}

impl Default for DefaultBindingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingSource for DefaultBindingSource {
    fn new_binding(
        &self,
        description: &str,
        owner: InstanceLocator,
        default_prefix: &str,
        expression: &str,
    ) -> TapestryResult<Arc<dyn Binding>> {
        // An unknown prefix means the colon belongs to the expression itself.
        let (prefix, expr) = match expression.split_once(':') {
            Some((p, rest)) if self.factories.contains_key(&p.to_ascii_lowercase()) => {
                (p.to_ascii_lowercase(), rest)
            }
            _ => (default_prefix.to_ascii_lowercase(), expression),
        };
        let factory = self.factories.get(&prefix).ok_or_else(|| {
            TapestryError::config(format!(
                "unknown binding prefix '{prefix}' ({description})"
            ))
        })?;
        factory.new_binding(description, owner, expr)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/binding.rs"]
mod tests;
