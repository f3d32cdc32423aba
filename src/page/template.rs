use indexmap::IndexMap;

/// Template content of a component class, as loaded from JSON or built in code.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeSpec {
    Text {
        text: String,
    },
    Element {
        name: String,
        #[serde(default)]
        attributes: Vec<(String, String)>,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    Component(ElementSpec),
    /// `${expression}`, evaluated with the `prop` prefix by default.
    Expansion {
        expression: String,
    },
    /// Placeholder for the body the container passes in.
    Body,
}

/// A component element of a template.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    pub parameters: IndexMap<String, String>,
    pub mixins: Vec<String>,
    pub body: Vec<NodeSpec>,
    /// Where the element is written, e.g. `Index.tml, line 12`.
    pub location: Option<String>,
}

impl NodeSpec {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn element(name: impl Into<String>, attributes: &[(&str, &str)], children: Vec<NodeSpec>) -> Self {
        Self::Element {
            name: name.into(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    pub fn expansion(expression: impl Into<String>) -> Self {
        Self::Expansion {
            expression: expression.into(),
        }
    }

    pub fn component(spec: ElementSpec) -> Self {
        Self::Component(spec)
    }
}

impl ElementSpec {
    /// Element bound to the embedded component declared with this id.
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Anonymous element of the given type; its id is allocated from the type name.
    pub fn of_type(component_type: impl Into<String>) -> Self {
        Self {
            component_type: Some(component_type.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, binding: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), binding.into());
        self
    }

    pub fn mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    pub fn body(mut self, body: Vec<NodeSpec>) -> Self {
        self.body = body;
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
