//! Built-in `core` library: `Form`, `TextField`, `Loop`, `ActionLink` and `Any`.

use crate::foundation::error::TapestryResult;
use crate::foundation::value::ValueType;
use crate::model::class_def::{Annotation, FieldDef, MethodDef, ParameterAnn};
use crate::page::context::ComponentContext;
use crate::transform::component_class::ComponentClass;

pub mod action_link;
pub mod any;
pub mod form;
pub mod loops;
pub mod text_field;

pub const LIBRARY: &str = "core";

/// Every class of the core library, ready for registration.
pub fn core_library() -> Vec<ComponentClass> {
    vec![
        form::form_class(),
        text_field::text_field_class(),
        loops::loop_class(),
        action_link::action_link_class(),
        any::any_class(),
    ]
}

/// A formal parameter field.
pub(crate) fn parameter(field: &str, ty: ValueType, ann: ParameterAnn) -> FieldDef {
    FieldDef::new(field, ty).with(Annotation::Parameter(ann))
}

/// A render phase method taking the markup writer.
pub(crate) fn phase_method(name: &str) -> MethodDef {
    MethodDef::new(name).param("writer", ValueType::MarkupWriter)
}

/// Informal parameters of the component, evaluated, as element attributes.
pub(crate) fn informal_attributes(
    ctx: &mut ComponentContext<'_>,
) -> TapestryResult<Vec<(String, String)>> {
    let bindings = ctx.resources()?.informal_bindings();
    let mut attributes = Vec::with_capacity(bindings.len());
    for (name, binding) in bindings {
        let value = binding.get(ctx)?;
        if !value.is_null() {
            attributes.push((name, value.to_client_string()));
        }
    }
    Ok(attributes)
}

/// Opens an element with owned attribute pairs.
pub(crate) fn open_element(ctx: &mut ComponentContext<'_>, name: &str, attributes: &[(String, String)]) {
    let borrowed: Vec<(&str, &str)> = attributes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    ctx.writer().element(name, &borrowed);
}
