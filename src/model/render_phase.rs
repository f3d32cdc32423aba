use crate::model::class_def::Annotation;

/// Render phases in the order a component passes through them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    SetupRender,
    BeginRender,
    BeforeRenderTemplate,
    BeforeRenderBody,
    AfterRenderBody,
    AfterRenderTemplate,
    AfterRender,
    CleanupRender,
}

impl RenderPhase {
    pub const ALL: [RenderPhase; 8] = [
        RenderPhase::SetupRender,
        RenderPhase::BeginRender,
        RenderPhase::BeforeRenderTemplate,
        RenderPhase::BeforeRenderBody,
        RenderPhase::AfterRenderBody,
        RenderPhase::AfterRenderTemplate,
        RenderPhase::AfterRender,
        RenderPhase::CleanupRender,
    ];

    /// After-style phases run subclass methods in reverse order, then the superclass.
    pub fn is_after(self) -> bool {
        matches!(
            self,
            Self::AfterRenderBody | Self::AfterRenderTemplate | Self::AfterRender | Self::CleanupRender
        )
    }

    /// Conventional method name for the phase.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::SetupRender => "setupRender",
            Self::BeginRender => "beginRender",
            Self::BeforeRenderTemplate => "beforeRenderTemplate",
            Self::BeforeRenderBody => "beforeRenderBody",
            Self::AfterRenderBody => "afterRenderBody",
            Self::AfterRenderTemplate => "afterRenderTemplate",
            Self::AfterRender => "afterRender",
            Self::CleanupRender => "cleanupRender",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.method_name() == name)
    }

    pub fn from_annotation(annotation: &Annotation) -> Option<Self> {
        Some(match annotation {
            Annotation::SetupRender => Self::SetupRender,
            Annotation::BeginRender => Self::BeginRender,
            Annotation::BeforeRenderTemplate => Self::BeforeRenderTemplate,
            Annotation::BeforeRenderBody => Self::BeforeRenderBody,
            Annotation::AfterRenderBody => Self::AfterRenderBody,
            Annotation::AfterRenderTemplate => Self::AfterRenderTemplate,
            Annotation::AfterRender => Self::AfterRender,
            Annotation::CleanupRender => Self::CleanupRender,
            _ => return None,
        })
    }
}
