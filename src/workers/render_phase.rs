use crate::foundation::error::TapestryResult;
use crate::foundation::value::ValueType;
use crate::model::render_phase::RenderPhase;
use crate::page::lifecycle::LifecyclePoint;
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;

/// Enrols methods in render phases, by annotation or by conventional name.
pub struct RenderPhaseWorker;

impl TransformWorker for RenderPhaseWorker {
    fn name(&self) -> &'static str {
        "RenderPhase"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:OnEvent"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for method in class.methods() {
            let phase = method
                .annotations
                .iter()
                .find_map(RenderPhase::from_annotation)
                .or_else(|| RenderPhase::from_method_name(&method.name));
            let Some(phase) = phase else {
                continue;
            };
            if let Some(param) = method
                .params
                .iter()
                .find(|p| p.ty != ValueType::MarkupWriter)
            {
                return Err(class.error(format!(
                    "render phase method '{}' may only take a MarkupWriter, not '{}' of type {}",
                    method.name,
                    param.name,
                    param.ty.label()
                )));
            }
            class.add_render_phase_method(phase, &method.name);
            class.model_mut().add_render_phase(phase);
        }
        Ok(())
    }
}

fn lifecycle_methods(
    class: &mut TransformClass<'_>,
    points: &[LifecyclePoint],
) -> TapestryResult<()> {
    for method in class.methods() {
        let point = method
            .annotations
            .iter()
            .find_map(LifecyclePoint::from_annotation)
            .or_else(|| {
                points
                    .iter()
                    .copied()
                    .find(|p| p.method_name() == method.name)
            });
        let Some(point) = point.filter(|p| points.contains(p)) else {
            continue;
        };
        if !method.params.is_empty() {
            return Err(class.error(format!(
                "page lifecycle method '{}' may not take parameters",
                method.name
            )));
        }
        class.add_lifecycle_method(point, &method.name);
    }
    Ok(())
}

/// `pageLoaded`, `pageAttached` and `pageDetached` methods.
pub struct PageLifecycleWorker;

impl TransformWorker for PageLifecycleWorker {
    fn name(&self) -> &'static str {
        "PageLifecycle"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:RenderPhase"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        lifecycle_methods(
            class,
            &[
                LifecyclePoint::Loaded,
                LifecyclePoint::Attached,
                LifecyclePoint::Detached,
            ],
        )
    }
}

/// `pageReset` methods, invoked when a page render request asks for a reset.
pub struct PageResetWorker;

impl TransformWorker for PageResetWorker {
    fn name(&self) -> &'static str {
        "PageReset"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:PageLifecycle"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        lifecycle_methods(class, &[LifecyclePoint::Reset])
    }
}
