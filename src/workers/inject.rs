use std::sync::Arc;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::{ObjectRef, Value};
use crate::model::class_def::{Annotation, FieldDef};
use crate::page::resources::{COMPONENT_HANDLE, COMPONENT_RESOURCES, PAGE_HANDLE, PageHandle};
use crate::transform::class::TransformClass;
use crate::transform::conduit::{
    ComputeFn, ComputedConduit, ConstantConduit, FieldConduit, compute, conduit_factory,
};
use crate::transform::worker::TransformWorker;
use crate::workers::property_name;

pub const SERVICES: &str = "Services";

fn computed_field(class: &mut TransformClass<'_>, field: &FieldDef, f: ComputeFn) -> TapestryResult<()> {
    let owner = class.class_name().to_string();
    let name = field.name.clone();
    class.set_conduit(
        &field.name,
        conduit_factory(move |_| {
            Ok(Arc::new(ComputedConduit::new(name.clone(), owner.clone(), f.clone()))
                as Arc<dyn FieldConduit>)
        }),
    )
}

/// Read-only fields resolved from the environment, by the field's object type, on every read.
pub struct EnvironmentalWorker;

impl TransformWorker for EnvironmentalWorker {
    fn name(&self) -> &'static str {
        "Environmental"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:ActivationRequestParameter"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class.unclaimed_fields_with(|a| matches!(a, Annotation::Environmental { .. }));
        for field in fields {
            class.claim_field(&field.name, self.name())?;
            let required = field.annotations.iter().any(|a| {
                matches!(a, Annotation::Environmental { required } if *required)
            });
            let capability = field
                .ty
                .object_name()
                .map(str::to_string)
                .ok_or_else(|| {
                    class.error(format!(
                        "environmental field '{}' must have an object type",
                        field.name
                    ))
                })?;
            computed_field(
                class,
                &field,
                compute(move |ctx| match ctx.environment().peek_by_name(&capability) {
                    Some(shared) => Ok(Value::Object(ObjectRef::from_any(&capability, shared))),
                    None if required => Err(TapestryError::environment(format!(
                        "no object of type {capability} is available from the Environment \
                         (required by {})",
                        ctx.complete_id()
                    ))),
                    None => Ok(Value::Null),
                }),
            )?;
        }
        Ok(())
    }
}

/// `Inject` (component resources, services), `InjectComponent`, `InjectContainer` and
/// `InjectPage` fields.
pub struct InjectWorker;

impl TransformWorker for InjectWorker {
    fn name(&self) -> &'static str {
        "Inject"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["after:Environmental"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        let fields = class.unclaimed_fields_with(|a| {
            matches!(
                a,
                Annotation::Inject
                    | Annotation::InjectComponent { .. }
                    | Annotation::InjectContainer
                    | Annotation::InjectPage { .. }
            )
        });
        for field in fields {
            class.claim_field(&field.name, self.name())?;
            for annotation in &field.annotations {
                match annotation {
                    Annotation::Inject => self.inject(class, &field)?,
                    Annotation::InjectComponent { id } => {
                        let id = id
                            .clone()
                            .unwrap_or_else(|| property_name(&field.name).to_string());
                        computed_field(
                            class,
                            &field,
                            compute(move |ctx| {
                                Ok(Value::object(COMPONENT_HANDLE, Arc::new(ctx.child_handle(&id)?)))
                            }),
                        )?;
                    }
                    Annotation::InjectContainer => computed_field(
                        class,
                        &field,
                        compute(|ctx| {
                            let container = ctx.container_locator().ok_or_else(|| {
                                TapestryError::config(format!(
                                    "{} is the page and has no container",
                                    ctx.complete_id()
                                ))
                            })?;
                            let handle = ctx.page().handle(container)?;
                            Ok(Value::object(COMPONENT_HANDLE, Arc::new(handle)))
                        }),
                    )?,
                    Annotation::InjectPage { page } => {
                        let name = page
                            .clone()
                            .or_else(|| field.ty.object_name().map(page_simple_name))
                            .ok_or_else(|| {
                                class.error(format!(
                                    "InjectPage field '{}' names no page",
                                    field.name
                                ))
                            })?;
                        let value = Value::object(PAGE_HANDLE, Arc::new(PageHandle { name }));
                        let owner = class.class_name().to_string();
                        let field_name = field.name.clone();
                        class.set_conduit(
                            &field.name,
                            conduit_factory(move |_| {
                                Ok(Arc::new(ConstantConduit::new(
                                    field_name.clone(),
                                    owner.clone(),
                                    value.clone(),
                                )) as Arc<dyn FieldConduit>)
                            }),
                        )?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl InjectWorker {
    fn inject(&self, class: &mut TransformClass<'_>, field: &FieldDef) -> TapestryResult<()> {
        match field.ty.object_name() {
            Some(COMPONENT_RESOURCES) => {
                let owner = class.class_name().to_string();
                let name = field.name.clone();
                class.set_conduit(
                    &field.name,
                    conduit_factory(move |setup| {
                        let resources = Value::object(COMPONENT_RESOURCES, setup.resources().clone());
                        Ok(Arc::new(ConstantConduit::new(name.clone(), owner.clone(), resources))
                            as Arc<dyn FieldConduit>)
                    }),
                )
            }
            Some(SERVICES) => {
                let owner = class.class_name().to_string();
                let name = field.name.clone();
                class.set_conduit(
                    &field.name,
                    conduit_factory(move |setup| {
                        let services = Value::object(SERVICES, setup.services().clone());
                        Ok(Arc::new(ConstantConduit::new(name.clone(), owner.clone(), services))
                            as Arc<dyn FieldConduit>)
                    }),
                )
            }
            _ => Err(class.error(format!(
                "no injectable resource matches the type {} of field '{}'",
                field.ty.label(),
                field.name
            ))),
        }
    }
}

fn page_simple_name(class_name: &str) -> String {
    class_name
        .rsplit(['.', '/'])
        .next()
        .unwrap_or(class_name)
        .to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/workers/inject.rs"]
mod tests;
