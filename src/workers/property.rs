use crate::foundation::error::TapestryResult;
use crate::foundation::value::ValueType;
use crate::model::class_def::{Annotation, MethodDef};
use crate::page::context::capitalize;
use crate::transform::advice::method_body;
use crate::transform::class::TransformClass;
use crate::transform::worker::TransformWorker;
use crate::workers::property_name;

/// Generates `get`/`is` and `set` accessors for `Property` fields. Runs before every other
/// worker so accessors exist even for fields that later lose their storage to a conduit.
pub struct PropertyWorker;

impl TransformWorker for PropertyWorker {
    fn name(&self) -> &'static str {
        "Property"
    }

    fn constraints(&self) -> &'static [&'static str] {
        &["before:*"]
    }

    fn transform(&self, class: &mut TransformClass<'_>) -> TapestryResult<()> {
        for field in class.fields() {
            let Some((read, write)) = field.annotations.iter().find_map(|a| match a {
                Annotation::Property { read, write } => Some((*read, *write)),
                _ => None,
            }) else {
                continue;
            };
            let cap = capitalize(property_name(&field.name));
            if read {
                let getter = match field.ty {
                    ValueType::Bool => format!("is{cap}"),
                    _ => format!("get{cap}"),
                };
                if !class.has_method(&getter) {
                    let name = field.name.clone();
                    class.introduce_method(
                        MethodDef::new(getter).returns(field.ty.clone()),
                        method_body(move |ctx, _| ctx.read_field(&name).map(Some)),
                    )?;
                }
            }
            if write {
                let setter = format!("set{cap}");
                if !class.has_method(&setter) {
                    let name = field.name.clone();
                    class.introduce_method(
                        MethodDef::new(setter).param("value", field.ty.clone()),
                        method_body(move |ctx, args| {
                            let value = args.first().cloned().unwrap_or_default();
                            ctx.write_field(&name, value)?;
                            Ok(None)
                        }),
                    )?;
                }
            }
        }
        Ok(())
    }
}
