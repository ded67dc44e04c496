//! Lenient read-only views over JSON:API documents.
//!
//! Nothing here fails: a document that does not look like JSON:API simply yields
//! no resources, and a resource without `attributes` has no attributes.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// The primary data of a payload. A JSON:API document carries it under `data`;
/// a bare resource or a bare array of resources is accepted as well.
pub(crate) fn primary_data(payload: &Value) -> &Value {
    match payload {
        Value::Object(object) if object.contains_key("data") => &object["data"],
        other => other,
    }
}

pub(crate) fn included(payload: &Value) -> Included<'_> {
    Included::new(payload.get("included"))
}

/// A `{ type, id }` reference to another resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceRef<'a> {
    pub type_: &'a str,
    pub id: &'a str,
}

impl<'a> ResourceRef<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        Some(Self {
            type_: value.get("type")?.as_str()?,
            id: value.get("id")?.as_str()?,
        })
    }
}

/// The `data` of a relationship, which is either one reference, many, or none.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Linkage<'a> {
    One(ResourceRef<'a>),
    Many(Vec<ResourceRef<'a>>),
    Empty,
}

/// A borrowed view of one JSON:API resource.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceView<'a> {
    value: &'a Value,
}

impl<'a> ResourceView<'a> {
    pub(crate) fn new(value: &'a Value) -> Option<Self> {
        value.is_object().then_some(Self { value })
    }

    /// The resource id rendered as a string. Numeric ids are stringified.
    pub(crate) fn id(&self) -> Option<String> {
        match self.value.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub(crate) fn attributes(&self) -> Option<&'a Map<String, Value>> {
        self.value.get("attributes")?.as_object()
    }

    pub(crate) fn linkage(&self, relationship: &str) -> Linkage<'a> {
        let data = self
            .value
            .get("relationships")
            .and_then(|relationships| relationships.get(relationship))
            .and_then(|relationship| relationship.get("data"));
        match data {
            Some(Value::Array(items)) => {
                Linkage::Many(items.iter().filter_map(ResourceRef::from_value).collect())
            }
            Some(value @ Value::Object(_)) => {
                ResourceRef::from_value(value).map_or(Linkage::Empty, Linkage::One)
            }
            _ => Linkage::Empty,
        }
    }
}

/// Index over the `included` side-table of a document, keyed by `(type, id)`.
#[derive(Debug, Default)]
pub(crate) struct Included<'a> {
    index: HashMap<ResourceRef<'a>, &'a Value>,
}

impl<'a> Included<'a> {
    pub(crate) fn new(included: Option<&'a Value>) -> Self {
        let index = included
            .and_then(Value::as_array)
            .map(|resources| {
                resources
                    .iter()
                    .filter_map(|resource| Some((ResourceRef::from_value(resource)?, resource)))
                    .collect()
            })
            .unwrap_or_default();
        Self { index }
    }

    pub(crate) fn get(&self, reference: &ResourceRef<'_>) -> Option<&'a Value> {
        self.index.get(reference).copied()
    }
}

/// The `meta.pagination` block of a paginated document, in GraphQL casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Read `meta.pagination` from a document. Missing or unparsable counters
    /// are `0`; a document without the block yields `None`.
    pub fn from_document(payload: &Value) -> Option<Self> {
        let pagination = payload.get("meta")?.get("pagination")?.as_object()?;
        let read = |key: &str| -> i64 {
            match pagination.get(key) {
                Some(Value::Number(number)) => number.as_i64().unwrap_or(0),
                Some(Value::String(string)) => string.trim().parse().unwrap_or(0),
                _ => 0,
            }
        };
        Some(Self {
            page: read("page"),
            per_page: read("per_page"),
            total_count: read("total_count"),
            total_pages: read("total_pages"),
        })
    }
}
