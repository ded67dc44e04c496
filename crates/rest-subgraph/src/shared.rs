use async_graphql::dynamic::{Scalar, TypeRef};
use field_mapper::Page;
use serde_json::{Map, Value};

use crate::composer::SubgraphDescriptor;
use crate::fields::object;

pub(crate) const DATE_TIME: &str = "ISO8601DateTime";
pub(crate) const DATE: &str = "ISO8601Date";
pub(crate) const PAGINATION: &str = "Pagination";

/// Types used by more than one area.
pub fn descriptor() -> SubgraphDescriptor {
    SubgraphDescriptor::new("Shared")
        .scalar(Scalar::new(DATE_TIME).description("An ISO 8601-encoded datetime"))
        .scalar(Scalar::new(DATE).description("An ISO 8601-encoded date"))
        .object(object(
            PAGINATION,
            &[
                ("page", TypeRef::named_nn(TypeRef::INT)),
                ("perPage", TypeRef::named_nn(TypeRef::INT)),
                ("totalCount", TypeRef::named_nn(TypeRef::INT)),
                ("totalPages", TypeRef::named_nn(TypeRef::INT)),
            ],
        ))
}

/// `{ <nodes_field>: [...], pagination: {...} }`. `pagination` is `null` when
/// the document carried no pagination metadata.
pub(crate) fn paginated(nodes_field: &str, page: Page) -> Value {
    let mut shape = Map::new();
    shape.insert(nodes_field.to_string(), Value::Array(page.nodes));
    shape.insert(
        "pagination".to_string(),
        page.pagination
            .and_then(|pagination| serde_json::to_value(pagination).ok())
            .unwrap_or(Value::Null),
    );
    Value::Object(shape)
}
