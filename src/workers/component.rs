use std::sync::Arc;

use indexmap::IndexMap;

use crate::foundation::error::TapestryResult;
use crate::foundation::value::Value;
use crate::model::class_def::{Annotation, ClassKind};
use crate::model::component_model::{EmbeddedComponentModel, MixinRef};
use crate::page::resources::COMPONENT_HANDLE;
use crate::transform::class::TransformClass;
use crate::transform::conduit::{ComputedConduit, FieldConduit, compute, conduit_factory};
use crate::transform::worker::TransformWorker;
use crate::workers::property_name;

/// Declares embedded components from `Component` fields; the field reads as a handle to the
/// embedded instance.
pub struct ComponentWorker;

impl TransformWorker for ComponentWorker {
    fn name(&self) -> &'static str {
        "Component"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:BindParameter"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class.unclaimed_fields_with(|a| matches!(a, Annotation::Component(_)));
        for field in fields {
            let Some(ann) = field.annotations.iter().find_map(|a| match a {
                Annotation::Component(c) => Some(c.clone()),
                _ => None,
            }) else {
                continue;
            };
            class.claim_field(&field.name, self.name())?;
            let id = ann
                .id
                .clone()
                .unwrap_or_else(|| property_name(&field.name).to_string());

            let mut parameters = IndexMap::new();
            for pair in &ann.parameters {
                let (name, binding) = pair.split_once('=').ok_or_else(|| {
                    class.error(format!(
                        "parameter '{pair}' of embedded component '{id}' is not of the form name=binding"
                    ))
                })?;
                parameters.insert(name.trim().to_string(), binding.trim().to_string());
            }
            let mixins = field
                .annotations
                .iter()
                .filter_map(|a| match a {
                    Annotation::Mixins { value } => Some(value),
                    _ => None,
                })
                .flatten()
                .map(|m| MixinRef::parse(m))
                .collect();

            class.model_mut().add_embedded_component(EmbeddedComponentModel {
                id: id.clone(),
                declared_type: field.ty.object_name().map(str::to_string),
                type_override: ann.component_type.clone(),
                inherit_informal_parameters: ann.inherit_informal_parameters,
                parameters,
                publish_parameters: ann.publish_parameters.clone(),
                mixins,
            })?;

            let owner = class.class_name().to_string();
            let field_name = field.name.clone();
            class.set_conduit(
                &field.name,
                conduit_factory(move |_setup| {
                    let id = id.clone();
                    Ok(Arc::new(ComputedConduit::new(
                        field_name.clone(),
                        owner.clone(),
                        compute(move |ctx| {
                            Ok(Value::object(COMPONENT_HANDLE, Arc::new(ctx.child_handle(&id)?)))
                        }),
                    )) as Arc<dyn FieldConduit>)
                }),
            )?;
        }
        Ok(())
    }
}

/// Collects the mixins a class always carries: `MixinClasses` on the class and
/// implementation mixins held by `Mixin` fields.
pub struct MixinWorker;

impl TransformWorker for MixinWorker {
    fn name(&self) -> &'static str {
        "Mixin"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Component"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let annotations = class.annotations().to_vec();
        for annotation in annotations {
            if let Annotation::MixinClasses { value, order } = annotation {
                if class.kind() == ClassKind::Mixin {
                    return Err(class.error("mixins may not declare mixins of their own"));
                }
                for (index, raw) in value.iter().enumerate() {
                    let mut mixin = MixinRef::parse(raw);
                    if let Some(constraints) = order.get(index) {
                        mixin.constraints.extend(
                            constraints
                                .split(';')
                                .map(str::trim)
                                .filter(|c| !c.is_empty())
                                .map(str::to_string),
                        );
                    }
                    class.model_mut().add_mixin_class(mixin);
                }
            }
        }

        let fields = class.unclaimed_fields_with(|a| matches!(a, Annotation::Mixin { .. }));
        for field in fields {
            let Some((declared, order)) = field.annotations.iter().find_map(|a| match a {
                Annotation::Mixin { mixin_type, order } => Some((mixin_type.clone(), order.clone())),
                _ => None,
            }) else {
                continue;
            };
            class.claim_field(&field.name, self.name())?;
            let mixin_type = declared
                .or_else(|| field.ty.object_name().map(str::to_string))
                .ok_or_else(|| {
                    class.error(format!(
                        "mixin field '{}' names no mixin type and is not object-typed",
                        field.name
                    ))
                })?;
            class.model_mut().add_mixin_class(MixinRef {
                mixin_type: mixin_type.clone(),
                constraints: order,
            });

            let mixin_id = mixin_id(&mixin_type).to_string();
            let owner = class.class_name().to_string();
            let field_name = field.name.clone();
            class.set_conduit(
                &field.name,
                conduit_factory(move |_setup| {
                    let mixin_id = mixin_id.clone();
                    Ok(Arc::new(ComputedConduit::new(
                        field_name.clone(),
                        owner.clone(),
                        compute(move |ctx| {
                            let handle = ctx.mixin_handle(&mixin_id)?;
                            Ok(Value::object(COMPONENT_HANDLE, Arc::new(handle)))
                        }),
                    )) as Arc<dyn FieldConduit>)
                }),
            )?;
        }
        Ok(())
    }
}

/// Id of a mixin on its element: the last segment of its type name.
pub fn mixin_id(mixin_type: &str) -> &str {
    mixin_type
        .rsplit(['/', '.'])
        .next()
        .unwrap_or(mixin_type)
}
