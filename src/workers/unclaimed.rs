use crate::foundation::error::TapestryResult;
use crate::model::class_def::Annotation;
use crate::transform::class::{TransformClass, default_conduit};
use crate::transform::worker::TransformWorker;

/// Runs last: every field nobody claimed becomes per-request storage (class-shared when
/// static). A field still carrying an annotation here was not understood by any worker.
pub struct UnclaimedFieldWorker;

impl TransformWorker for UnclaimedFieldWorker {
    fn name(&self) -> &'static str {
        "UnclaimedField"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:*"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for field in class.fields() {
            if class.is_claimed(&field.name) || class.has_conduit(&field.name) {
                continue;
            }
            if let Some(annotation) = field
                .annotations
                .iter()
                .find(|a| !matches!(a, Annotation::Property { .. }))
            {
                return Err(class.error(format!(
                    "annotation {annotation:?} on field '{}' is not handled by any worker",
                    field.name
                )));
            }
            class.claim_field(&field.name, self.name())?;
            class.set_conduit(&field.name, default_conduit(&field))?;
        }
        Ok(())
    }
}
