//! Schema building blocks shared by every area.
//!
//! Resolvers produce mapped JSON shapes. Object types resolve their fields by
//! reading the key of the same name from the parent shape.

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, TypeRef,
};
use serde_json::Value;

/// An output object whose fields are read from the parent JSON shape.
pub(crate) fn object(name: &str, fields: &[(&str, TypeRef)]) -> Object {
    fields
        .iter()
        .fold(Object::new(name), |object, (field, ty)| {
            object.field(json_field(field, ty.clone()))
        })
}

pub(crate) fn input_object(name: &str, fields: &[(&str, TypeRef)]) -> InputObject {
    fields
        .iter()
        .fold(InputObject::new(name), |object, (field, ty)| {
            object.field(InputValue::new(*field, ty.clone()))
        })
}

/// A field resolving to `parent[name]`. Missing keys resolve to `null`.
pub(crate) fn json_field(name: &str, ty: TypeRef) -> Field {
    let key = name.to_string();
    Field::new(name, ty, move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<Value>()?;
            Ok(parent.get(&key).cloned().and_then(to_field_value))
        })
    })
}

/// Convert a mapped shape into a resolver result. Objects stay JSON so that
/// their own fields can read from them.
pub(crate) fn to_field_value<'a>(value: Value) -> Option<FieldValue<'a>> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(list(items)),
        Value::Object(_) => Some(FieldValue::owned_any(value)),
        scalar => async_graphql::Value::from_json(scalar)
            .ok()
            .map(FieldValue::value),
    }
}

pub(crate) fn list<'a>(items: Vec<Value>) -> FieldValue<'a> {
    FieldValue::list(
        items
            .into_iter()
            .map(|item| to_field_value(item).unwrap_or(FieldValue::NULL)),
    )
}
