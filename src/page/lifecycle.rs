use crate::foundation::error::TapestryResult;
use crate::model::class_def::Annotation;
use crate::page::context::ComponentContext;

/// Page lifecycle notifications a component class can subscribe methods to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecyclePoint {
    Loaded,
    Attached,
    Detached,
    Reset,
}

impl LifecyclePoint {
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Loaded => "pageLoaded",
            Self::Attached => "pageAttached",
            Self::Detached => "pageDetached",
            Self::Reset => "pageReset",
        }
    }

    pub fn from_annotation(annotation: &Annotation) -> Option<Self> {
        match annotation {
            Annotation::PageLoaded => Some(Self::Loaded),
            Annotation::PageAttached => Some(Self::Attached),
            Annotation::PageDetached => Some(Self::Detached),
            Annotation::PageReset => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Per-instance listener registered by conduits that keep state across the page lifecycle.
pub trait InstanceLifecycle: Send + Sync {
    /// Once, after the whole page has been assembled.
    fn did_load(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        Ok(())
    }

    fn attached(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        Ok(())
    }

    fn detached(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        Ok(())
    }

    fn reset(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        Ok(())
    }

    /// After the component's cleanup-render phase completes.
    fn post_render_cleanup(&self, _ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        Ok(())
    }
}
