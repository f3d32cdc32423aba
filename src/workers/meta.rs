use crate::foundation::error::TapestryResult;
use crate::model::class_def::Annotation;
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;

/// Copies class-level markers into the model: `Meta` pairs, informal parameter support,
/// `MixinAfter` and declared `Events`.
pub struct MetaWorker;

impl TransformWorker for MetaWorker {
    fn name(&self) -> &'static str {
        "Meta"
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let annotations = class.annotations().to_vec();
        for annotation in annotations {
            match annotation {
                Annotation::Meta { value } => {
                    for pair in value {
                        let (key, val) = pair.split_once('=').ok_or_else(|| {
                            class.error(format!("meta value '{pair}' is not of the form key=value"))
                        })?;
                        class
                            .model_mut()
                            .set_meta(key.trim().to_ascii_lowercase(), val.trim());
                    }
                }
                Annotation::SupportsInformalParameters => {
                    class.model_mut().set_supports_informal_parameters();
                }
                Annotation::MixinAfter => {
                    if class.kind() != crate::model::class_def::ClassKind::Mixin {
                        return Err(class.error("MixinAfter may only be used on mixin classes"));
                    }
                    class.model_mut().set_mixin_after();
                }
                Annotation::Events { value } => {
                    let events: Vec<&str> = value.iter().map(|e| e.trim()).collect();
                    class.model_mut().set_meta("events", events.join(","));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
