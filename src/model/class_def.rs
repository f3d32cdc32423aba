use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{Value, ValueType};

/// Role of a class within an application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Page,
    #[default]
    Component,
    Mixin,
}

/// Options of a formal parameter declaration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParameterAnn {
    /// Parameter name; defaults to the field name without leading `_`/`$`.
    pub name: Option<String>,
    pub required: bool,
    pub allow_null: bool,
    /// Binding prefix used when the template value has none (`prop` unless overridden).
    pub default_prefix: Option<String>,
    /// Default binding expression applied when the container binds nothing.
    pub value: Option<String>,
    pub cache: bool,
    pub principal: bool,
    /// Bind to the container property of the same name when nothing else is bound.
    pub autoconnect: bool,
}

impl Default for ParameterAnn {
    fn default() -> Self {
        Self {
            name: None,
            required: false,
            allow_null: true,
            default_prefix: None,
            value: None,
            cache: true,
            principal: false,
            autoconnect: false,
        }
    }
}

/// Options of an embedded component declaration.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComponentAnn {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    /// `name=binding` pairs.
    pub parameters: Vec<String>,
    pub publish_parameters: Vec<String>,
    pub inherit_informal_parameters: bool,
}

/// Declarative markers on classes, fields, methods and method parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Parameter(ParameterAnn),
    Property {
        #[serde(default = "yes")]
        read: bool,
        #[serde(default = "yes")]
        write: bool,
    },
    Persist {
        #[serde(default)]
        strategy: Option<String>,
    },
    Component(ComponentAnn),
    /// Implementation mixin held by a field.
    Mixin {
        #[serde(default, rename = "type")]
        mixin_type: Option<String>,
        #[serde(default)]
        order: Vec<String>,
    },
    /// Mixins attached to an embedded component, `type` or `type::constraint;constraint`.
    Mixins {
        #[serde(default)]
        value: Vec<String>,
    },
    MixinClasses {
        #[serde(default)]
        value: Vec<String>,
        #[serde(default)]
        order: Vec<String>,
    },
    MixinAfter,
    Inject,
    InjectComponent {
        #[serde(default)]
        id: Option<String>,
    },
    InjectPage {
        #[serde(default)]
        page: Option<String>,
    },
    InjectContainer,
    Environmental {
        #[serde(default = "yes")]
        required: bool,
    },
    Cached {
        #[serde(default)]
        watch: Option<String>,
    },
    OnEvent {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        component: Option<String>,
    },
    SetupRender,
    BeginRender,
    BeforeRenderTemplate,
    BeforeRenderBody,
    AfterRenderBody,
    AfterRenderTemplate,
    AfterRender,
    CleanupRender,
    PageLoaded,
    PageAttached,
    PageDetached,
    PageReset,
    DiscardAfter,
    HeartbeatDeferred,
    Log,
    BindParameter {
        #[serde(default)]
        value: Vec<String>,
    },
    SessionAttribute {
        #[serde(default)]
        value: Option<String>,
    },
    ActivationRequestParameter {
        #[serde(default)]
        value: Option<String>,
    },
    PageActivationContext {
        #[serde(default)]
        index: Option<usize>,
    },
    RequestParameter {
        value: String,
        #[serde(default)]
        allow_blank: bool,
    },
    RequestBody {
        #[serde(default)]
        allow_empty: bool,
    },
    StaticActivationContextValue {
        value: String,
    },
    SupportsInformalParameters,
    Events {
        #[serde(default)]
        value: Vec<String>,
    },
    /// `key=value` pairs.
    Meta {
        #[serde(default)]
        value: Vec<String>,
    },
}

fn yes() -> bool {
    true
}

fn default_library() -> String {
    "app".to_string()
}

fn void() -> ValueType {
    ValueType::Void
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
    /// Value assigned by the field initializer.
    #[serde(default)]
    pub initial: Option<Value>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default = "void")]
    pub returns: ValueType,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Declarative description of a component, page or mixin class.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDef {
    /// Unique class name, e.g. `pages.Index` or `core.components.Form`.
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default = "default_library")]
    pub library: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            initial: None,
            annotations: Vec::new(),
            is_static: false,
        }
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    pub fn statik(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Value before any write: the initializer, else the type default.
    pub fn default_value(&self) -> Value {
        self.initial.clone().unwrap_or_else(|| self.ty.default_value())
    }
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ValueType::Void,
            annotations: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.params.push(ParamDef::new(name, ty));
        self
    }

    pub fn param_def(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: ValueType) -> Self {
        self.returns = ty;
        self
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn has(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }

    /// `Class.name(type, type)` as used in error messages and logs.
    pub fn describe(&self, class: &str) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.label()).collect();
        format!("{class}.{}({})", self.name, params.join(", "))
    }
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            library: default_library(),
            kind,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Last dotted segment of the class name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> TapestryResult<Self> {
        let def: ClassDef = serde_json::from_reader(r)
            .map_err(|e| TapestryError::config(format!("parse class JSON: {e}")))?;
        def.validate()?;
        Ok(def)
    }

    pub fn from_path(path: impl AsRef<Path>) -> TapestryResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TapestryError::config(format!("open class JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Structural checks: non-empty unique member names.
    pub fn validate(&self) -> TapestryResult<()> {
        if self.name.trim().is_empty() {
            return Err(TapestryError::config("class name must not be empty"));
        }
        for (i, f) in self.fields.iter().enumerate() {
            if f.name.is_empty() {
                return Err(TapestryError::transform(&self.name, "field with empty name"));
            }
            if self.fields[..i].iter().any(|o| o.name == f.name) {
                return Err(TapestryError::transform(
                    &self.name,
                    format!("field '{}' is declared twice", f.name),
                ));
            }
        }
        for (i, m) in self.methods.iter().enumerate() {
            if m.name.is_empty() {
                return Err(TapestryError::transform(&self.name, "method with empty name"));
            }
            if self.methods[..i].iter().any(|o| o.name == m.name) {
                return Err(TapestryError::transform(
                    &self.name,
                    format!("method '{}' is declared twice; overloads are not supported", m.name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/class_def.rs"]
mod tests;
