use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};

/// Dynamically typed value flowing through fields, bindings, event contexts and actions.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Opaque in-process object (trackers, links, component handles). Never serialized.
    #[serde(skip)]
    Object(ObjectRef),
}

/// Declared type of a field, method parameter or return value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Void,
    Any,
    Bool,
    Long,
    Double,
    Str,
    List,
    Map,
    EventContext,
    MarkupWriter,
    Object(String),
}

/// Shared handle to an in-process object carried inside a [`Value`].
#[derive(Clone)]
pub struct ObjectRef {
    type_name: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(type_name: &str, value: Arc<T>) -> Self {
        Self {
            type_name: Arc::from(type_name),
            value,
        }
    }

    pub(crate) fn from_any(type_name: &str, value: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            type_name: Arc::from(type_name),
            value,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type_name", &self.type_name)
            .field("ptr", &Arc::as_ptr(&self.value))
            .finish()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Value {
    pub fn object<T: Any + Send + Sync>(type_name: &str, value: Arc<T>) -> Self {
        Self::Object(ObjectRef::new(type_name, value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(o) => o.downcast::<T>(),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    pub fn kind(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(o) => o.type_name(),
        }
    }

    /// String form used for links, hidden fields and echoed input.
    pub fn to_client_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Value::to_client_string)
                .collect::<Vec<_>>()
                .join(","),
            Self::Map(m) => serde_json::to_string(m).unwrap_or_default(),
            Self::Object(o) => format!("<{}>", o.type_name()),
        }
    }

    pub fn from_json(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Long(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(m) => Self::Map(
                m.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> TapestryResult<serde_json::Value> {
        Ok(match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Long(v) => serde_json::Value::from(*v),
            Self::Double(v) => serde_json::Value::from(*v),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<TapestryResult<Vec<_>>>()?,
            ),
            Self::Map(m) => {
                let mut out = serde_json::Map::with_capacity(m.len());
                for (k, v) in m {
                    out.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(out)
            }
            Self::Object(o) => {
                return Err(TapestryError::serde(format!(
                    "object of type {} cannot be converted to JSON",
                    o.type_name()
                )));
            }
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl ValueType {
    /// Value a field of this type holds before anything is written to it.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Long => Value::Long(0),
            Self::Double => Value::Double(0.0),
            _ => Value::Null,
        }
    }

    /// Primitive types can never hold null.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Bool | Self::Long | Self::Double)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn object_name(&self) -> Option<&str> {
        match self {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Type label used in method descriptions.
    pub fn label(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Any => "Object".to_string(),
            Self::Bool => "boolean".to_string(),
            Self::Long => "long".to_string(),
            Self::Double => "double".to_string(),
            Self::Str => "String".to_string(),
            Self::List => "List".to_string(),
            Self::Map => "Map".to_string(),
            Self::EventContext => "EventContext".to_string(),
            Self::MarkupWriter => "MarkupWriter".to_string(),
            Self::Object(name) => name.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/value.rs"]
mod tests;
