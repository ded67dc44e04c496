use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::case::snake_to_camel;
use crate::coerce::{coerce_scalar, Coercion};
use crate::document::{self, Included, Linkage, Pagination, ResourceRef, ResourceView};

/// Included resources are inlined at most this many levels deep, so cyclic
/// `included` graphs terminate.
const MAX_INLINE_DEPTH: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("a mapping for type {0} is already registered")]
    DuplicateType(String),
}

#[derive(Debug, Clone)]
struct Relationship {
    /// snake_case name under `relationships` in the REST resource
    rest_name: String,
    /// camelCase field the related resource is inlined under
    field: String,
    /// GraphQL type whose mapping is applied to the related resource
    target: String,
}

/// Mapping rules for one GraphQL type.
#[derive(Debug, Clone)]
pub struct TypeMapping {
    type_name: String,
    coercions: HashMap<String, Coercion>,
    relationships: Vec<Relationship>,
}

impl TypeMapping {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            coercions: HashMap::new(),
            relationships: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Coerce the value of an output (camelCase) field.
    #[must_use]
    pub fn coerce(mut self, field: impl Into<String>, coercion: Coercion) -> Self {
        self.coercions.insert(field.into(), coercion);
        self
    }

    /// Inline the resource referenced by the REST relationship `rest_name`,
    /// mapped as `target`. Cardinality follows the shape of the relationship data.
    #[must_use]
    pub fn relationship(mut self, rest_name: impl Into<String>, target: impl Into<String>) -> Self {
        let rest_name = rest_name.into();
        self.relationships.push(Relationship {
            field: snake_to_camel(&rest_name),
            rest_name,
            target: target.into(),
        });
        self
    }
}

/// One page of mapped resources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub nodes: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Every registered [`TypeMapping`], keyed by GraphQL type name.
///
/// Types without a registered mapping are mapped with the bare key transform.
/// None of the mapping operations fail: malformed input yields `None`, `[]` or
/// the values passed through unchanged.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    types: HashMap<String, TypeMapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mapping: TypeMapping) -> Result<(), MappingError> {
        if self.types.contains_key(&mapping.type_name) {
            return Err(MappingError::DuplicateType(mapping.type_name));
        }
        self.types.insert(mapping.type_name.clone(), mapping);
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Map one resource. `included` is the document's `included` array, if any.
    pub fn resource(
        &self,
        type_name: &str,
        resource: &Value,
        included: Option<&Value>,
    ) -> Option<Value> {
        let included = Included::new(included);
        ResourceView::new(resource).map(|view| self.map_resource(type_name, view, &included, 0))
    }

    /// Map the primary data of a document to a single shape. Absent or `null`
    /// payloads and `data: null` give `None`. An array yields its first element.
    pub fn one(&self, type_name: &str, payload: Option<&Value>) -> Option<Value> {
        let payload = payload?;
        let included = document::included(payload);
        let resource = match document::primary_data(payload) {
            Value::Array(resources) => resources.first()?,
            other => other,
        };
        ResourceView::new(resource).map(|view| self.map_resource(type_name, view, &included, 0))
    }

    /// Map the primary data of a document to a list of shapes. Absent or `null`
    /// payloads give `[]`; a single resource gives a one-element list.
    pub fn many(&self, type_name: &str, payload: Option<&Value>) -> Vec<Value> {
        let Some(payload) = payload else {
            return Vec::new();
        };
        let included = document::included(payload);
        let views: Vec<ResourceView<'_>> = match document::primary_data(payload) {
            Value::Array(resources) => resources.iter().filter_map(ResourceView::new).collect(),
            other => ResourceView::new(other).into_iter().collect(),
        };
        views
            .into_iter()
            .map(|view| self.map_resource(type_name, view, &included, 0))
            .collect()
    }

    /// Like [`MappingTable::many`], keeping `meta.pagination` as well.
    pub fn page(&self, type_name: &str, payload: Option<&Value>) -> Page {
        Page {
            nodes: self.many(type_name, payload),
            pagination: payload.and_then(Pagination::from_document),
        }
    }

    /// Key-transform a plain JSON object that is not a JSON:API resource.
    pub fn object(&self, type_name: &str, object: &Map<String, Value>) -> Value {
        Value::Object(self.map_object(type_name, object, 0))
    }

    fn map_resource(
        &self,
        type_name: &str,
        view: ResourceView<'_>,
        included: &Included<'_>,
        depth: usize,
    ) -> Value {
        let mapping = self.lookup(type_name);
        let mut shape = Map::new();
        if let Some(id) = view.id() {
            shape.insert("id".to_string(), Value::String(id));
        }
        if let Some(attributes) = view.attributes() {
            for (key, value) in attributes {
                let field = snake_to_camel(key);
                if field == "id" {
                    continue;
                }
                let value = self.coerce_field(mapping, &field, value.clone(), depth);
                shape.insert(field, value);
            }
        }
        for relationship in mapping.iter().flat_map(|mapping| &mapping.relationships) {
            let inlined = match view.linkage(&relationship.rest_name) {
                Linkage::One(reference) => {
                    self.inline(&relationship.target, &reference, included, depth)
                }
                Linkage::Many(references) => Value::Array(
                    references
                        .iter()
                        .map(|reference| {
                            self.inline(&relationship.target, reference, included, depth)
                        })
                        .collect(),
                ),
                Linkage::Empty => continue,
            };
            shape.insert(relationship.field.clone(), inlined);
        }
        Value::Object(shape)
    }

    fn inline(
        &self,
        type_name: &str,
        reference: &ResourceRef<'_>,
        included: &Included<'_>,
        depth: usize,
    ) -> Value {
        let found = (depth < MAX_INLINE_DEPTH)
            .then(|| included.get(reference))
            .flatten()
            .and_then(ResourceView::new);
        match found {
            Some(view) => self.map_resource(type_name, view, included, depth + 1),
            None => {
                let mut shape = Map::new();
                shape.insert("id".to_string(), Value::String(reference.id.to_string()));
                Value::Object(shape)
            }
        }
    }

    fn map_object(
        &self,
        type_name: &str,
        object: &Map<String, Value>,
        depth: usize,
    ) -> Map<String, Value> {
        let mapping = self.lookup(type_name);
        object
            .iter()
            .map(|(key, value)| {
                let field = snake_to_camel(key);
                let value = self.coerce_field(mapping, &field, value.clone(), depth);
                (field, value)
            })
            .collect()
    }

    fn coerce_field(
        &self,
        mapping: Option<&TypeMapping>,
        field: &str,
        value: Value,
        depth: usize,
    ) -> Value {
        match mapping.and_then(|mapping| mapping.coercions.get(field)) {
            None => value,
            Some(Coercion::Nested(nested)) => self.nested(nested, value, depth),
            Some(coercion) => coerce_scalar(coercion, value),
        }
    }

    fn nested(&self, type_name: &str, value: Value, depth: usize) -> Value {
        if depth >= MAX_INLINE_DEPTH {
            return value;
        }
        match value {
            Value::Object(object) => Value::Object(self.map_object(type_name, &object, depth + 1)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.nested(type_name, item, depth))
                    .collect(),
            ),
            other => other,
        }
    }

    fn lookup(&self, type_name: &str) -> Option<&TypeMapping> {
        let mapping = self.types.get(type_name);
        if mapping.is_none() {
            tracing::trace!(type_name, "no mapping registered, using the bare key transform");
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn table() -> MappingTable {
        let mut table = MappingTable::new();
        table
            .insert(
                TypeMapping::new("FinancialAccountEntry")
                    .coerce("amount", Coercion::Float)
                    .coerce("convertedAmount", Coercion::Float)
                    .relationship("category", "FinancialAccountCategory"),
            )
            .unwrap();
        table
            .insert(TypeMapping::new("FinancialAccountCategory").coerce("code", Coercion::EnumCase))
            .unwrap();
        table
            .insert(
                TypeMapping::new("GoogleAccountIntegration")
                    .coerce("calendarIntegrations", Coercion::EnumCase)
                    .coerce("calendars", Coercion::Nested("GoogleAccountIntegrationCalendars")),
            )
            .unwrap();
        table
            .insert(TypeMapping::new("Node").relationship("parent", "Node"))
            .unwrap();
        table
    }

    #[test]
    fn test_attributes_are_renamed_and_id_preserved() {
        let payload = json!({
            "data": {
                "id": "1",
                "type": "people",
                "attributes": { "first_name": "A", "last_name": "B" }
            }
        });
        assert_eq!(
            table().one("Person", Some(&payload)),
            Some(json!({ "id": "1", "firstName": "A", "lastName": "B" }))
        );
    }

    #[test]
    fn test_id_wins_over_id_attribute() {
        let resource =
            json!({ "id": 7, "type": "x", "attributes": { "id": "other", "name": "n" } });
        assert_eq!(
            table().resource("Anything", &resource, None),
            Some(json!({ "id": "7", "name": "n" }))
        );
    }

    #[test]
    fn test_later_attribute_wins_on_collision() {
        let resource = json!({ "id": "1", "attributes": { "a_b": 1, "a__b": 2 } });
        assert_eq!(
            table().resource("Anything", &resource, None),
            Some(json!({ "id": "1", "aB": 2 }))
        );
    }

    #[test]
    fn test_unparsable_amount_becomes_zero() {
        let payload = json!({
            "data": [
                {
                    "id": "1",
                    "type": "entries",
                    "attributes": { "amount": "abc", "converted_amount": "10.25" }
                }
            ]
        });
        assert_eq!(
            table().many("FinancialAccountEntry", Some(&payload)),
            vec![json!({ "id": "1", "amount": 0, "convertedAmount": 10.25 })]
        );
    }

    #[test]
    fn test_null_payloads() {
        let table = table();
        assert_eq!(table.one("Person", None), None);
        assert_eq!(table.one("Person", Some(&Value::Null)), None);
        assert_eq!(table.one("Person", Some(&json!({ "data": null }))), None);
        assert_eq!(table.many("Person", None), Vec::<Value>::new());
        assert_eq!(table.many("Person", Some(&Value::Null)), Vec::<Value>::new());
        assert_eq!(
            table.page("Person", None),
            Page { nodes: vec![], pagination: None }
        );
    }

    #[test]
    fn test_single_data_object_yields_one_element_list() {
        let payload = json!({ "data": { "id": "1", "type": "people", "attributes": {} } });
        assert_eq!(table().many("Person", Some(&payload)), vec![json!({ "id": "1" })]);
    }

    #[test]
    fn test_relationship_inlined_from_included() {
        let payload = json!({
            "data": [{
                "id": "e1",
                "type": "entries",
                "attributes": { "amount": "5" },
                "relationships": {
                    "category": { "data": { "id": "c1", "type": "categories" } }
                }
            }, {
                "id": "e2",
                "type": "entries",
                "attributes": { "amount": 6 },
                "relationships": {
                    "category": { "data": { "id": "missing", "type": "categories" } }
                }
            }],
            "included": [
                {
                    "id": "c1",
                    "type": "categories",
                    "attributes": { "code": "gift in kind", "name": "Gifts" }
                }
            ]
        });
        assert_eq!(
            table().many("FinancialAccountEntry", Some(&payload)),
            vec![
                json!({
                    "id": "e1",
                    "amount": 5.0,
                    "category": { "id": "c1", "code": "GIFT_IN_KIND", "name": "Gifts" }
                }),
                json!({ "id": "e2", "amount": 6.0, "category": { "id": "missing" } }),
            ]
        );
    }

    fn node(id: &str, parent: &str) -> Value {
        json!({
            "id": id,
            "type": "nodes",
            "relationships": { "parent": { "data": { "id": parent, "type": "nodes" } } }
        })
    }

    #[test]
    fn test_cyclic_includes_terminate() {
        let payload = json!({
            "data": node("a", "b"),
            "included": [node("a", "b"), node("b", "a")]
        });
        assert_eq!(
            table().one("Node", Some(&payload)),
            Some(json!({
                "id": "a",
                "parent": {
                    "id": "b",
                    "parent": { "id": "a", "parent": { "id": "b", "parent": { "id": "a" } } }
                }
            }))
        );
    }

    #[test]
    fn test_nested_objects_and_enum_lists() {
        let payload = json!({
            "data": {
                "id": "g1",
                "type": "google_integrations",
                "attributes": {
                    "calendar_integrations": ["appointment", "pre call"],
                    "calendars": [{ "id": "c", "name": "Main", "is_primary": true }]
                }
            }
        });
        assert_eq!(
            table().one("GoogleAccountIntegration", Some(&payload)),
            Some(json!({
                "id": "g1",
                "calendarIntegrations": ["APPOINTMENT", "PRE_CALL"],
                "calendars": [{ "id": "c", "name": "Main", "isPrimary": true }]
            }))
        );
    }

    #[test]
    fn test_page_keeps_pagination() {
        let payload = json!({
            "data": [{ "id": "1", "type": "x", "attributes": {} }],
            "meta": {
                "pagination": { "page": 1, "per_page": 10, "total_count": 1, "total_pages": 1 }
            }
        });
        let page = table().page("Anything", Some(&payload));
        assert_eq!(
            serde_json::to_value(page).unwrap(),
            json!({
                "nodes": [{ "id": "1" }],
                "pagination": { "page": 1, "perPage": 10, "totalCount": 1, "totalPages": 1 }
            })
        );
    }

    #[test]
    fn test_mapping_is_pure() {
        let table = table();
        let payload = json!({ "data": { "id": "1", "attributes": { "amount": "1.5" } } });
        let first = table.one("FinancialAccountEntry", Some(&payload));
        let second = table.one("FinancialAccountEntry", Some(&payload));
        assert_eq!(first, second);
        let object = json!({ "first_name": "A" });
        let once = table.object("Anything", object.as_object().unwrap());
        let twice = table.object("Anything", once.as_object().unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let mut table = table();
        assert_eq!(
            table.insert(TypeMapping::new("Node")),
            Err(MappingError::DuplicateType("Node".to_string()))
        );
    }

    #[test]
    fn test_malformed_input_passes_through() {
        let table = table();
        assert_eq!(table.one("Person", Some(&json!("nope"))), None);
        assert_eq!(table.many("Person", Some(&json!([1, "x", null]))), Vec::<Value>::new());
        let resource = json!({ "id": "1", "attributes": "not an object" });
        assert_eq!(table.resource("Person", &resource, None), Some(json!({ "id": "1" })));
    }
}
