/// Convenience result type used across the crate.
pub type TapestryResult<T> = Result<T, TapestryError>;

/// Top-level error taxonomy used by the transformation, dispatch and lifecycle APIs.
#[derive(thiserror::Error, Debug)]
pub enum TapestryError {
    /// Class transformation failed (double claims, malformed annotations, unknown types).
    #[error("transform error in {class}: {message}")]
    Transform { class: String, message: String },

    /// A parameter binding could not be resolved, read or updated.
    #[error("binding error for parameter '{parameter}' of {component}: {message}")]
    Binding {
        component: String,
        parameter: String,
        message: String,
    },

    /// A value could not be converted to the requested type.
    #[error("coercion error: {0}")]
    Coercion(String),

    /// An event handler method could not be matched or invoked.
    #[error("event handler error in {method}: {message}")]
    EventHandler { method: String, message: String },

    /// A handler argument could not be extracted from the event or request.
    #[error("error extracting parameter #{index} of {method}: {message}")]
    ParameterExtraction {
        method: String,
        index: usize,
        message: String,
    },

    /// A recorded form action failed to decode or execute during submission.
    #[error("replay error at {location}: {source}")]
    Replay {
        location: String,
        #[source]
        source: Box<TapestryError>,
    },

    /// Environment misuse: missing capability or out-of-order pop.
    #[error("environment error: {0}")]
    Environment(String),

    /// Errors raised while driving the render state machine.
    #[error("render error in {component}: {message}")]
    Render { component: String, message: String },

    /// A user-facing validation failure raised by field or form logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid configuration or class description.
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TapestryError {
    pub fn transform(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            class: class.into(),
            message: message.into(),
        }
    }

    pub fn binding(
        component: impl Into<String>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Binding {
            component: component.into(),
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn coercion(msg: impl Into<String>) -> Self {
        Self::Coercion(msg.into())
    }

    pub fn event_handler(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EventHandler {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn extraction(method: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        Self::ParameterExtraction {
            method: method.into(),
            index,
            message: message.into(),
        }
    }

    pub fn replay(location: impl Into<String>, source: TapestryError) -> Self {
        Self::Replay {
            location: location.into(),
            source: Box::new(source),
        }
    }

    pub fn environment(msg: impl Into<String>) -> Self {
        Self::Environment(msg.into())
    }

    pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for user-facing validation failures, which are recorded rather than propagated.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
