//! Normalization and pagination policy of the browser's GraphQL cache.
//!
//! The policy is declared here once and served to the client as JSON, so the
//! client cache and the server agree on which types are normalized and how
//! paginated connections are merged.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Arguments that only select a window of a connection and are therefore not
/// part of its storage key.
const CURSOR_ARGS: [&str; 2] = ["after", "before"];

/// Root connections of the remote API that are paginated relay-style.
const RELAY_PAGINATED_QUERY_FIELDS: [&str; 7] = [
    "accountListInvites",
    "appeals",
    "contacts",
    "donations",
    "financialAccounts",
    "tasks",
    "userNotifications",
];

/// How objects of a type are identified in the normalized cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFields {
    /// `__typename` and `id`
    Default,
    Fields(Vec<String>),
    /// Objects are stored inside their parent and never coalesced by id.
    NotNormalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// A relay connection. Pages that differ only in their cursor are merged
    /// into one list.
    RelayPagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePolicy {
    pub key_fields: KeyFields,
    pub fields: IndexMap<String, FieldPolicy>,
}

impl TypePolicy {
    pub fn new(key_fields: KeyFields) -> Self {
        Self {
            key_fields,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, policy: FieldPolicy) -> Self {
        self.fields.insert(name.into(), policy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheConfig {
    pub type_policies: IndexMap<String, TypePolicy>,
}

impl CacheConfig {
    /// The policy of the MPDX client cache.
    pub fn mpdx() -> Self {
        let mut type_policies = IndexMap::new();
        let query = RELAY_PAGINATED_QUERY_FIELDS.iter().fold(
            TypePolicy::new(KeyFields::Default),
            |policy, field| policy.field(*field, FieldPolicy::RelayPagination),
        );
        type_policies.insert("Query".to_string(), query);
        // two calendars with the same id inside different integrations are distinct
        type_policies.insert(
            "GoogleAccountIntegrationCalendars".to_string(),
            TypePolicy::new(KeyFields::NotNormalized),
        );
        type_policies.insert(
            "User".to_string(),
            TypePolicy::new(KeyFields::Fields(vec!["id".to_string()])),
        );
        Self { type_policies }
    }

    pub fn type_policy(&self, type_name: &str) -> Option<&TypePolicy> {
        self.type_policies.get(type_name)
    }

    pub fn field_policy(&self, type_name: &str, field: &str) -> Option<FieldPolicy> {
        self.type_policy(type_name)?.fields.get(field).copied()
    }

    /// The normalized cache id of `object`, `None` if it is stored inline.
    pub fn cache_id(&self, type_name: &str, object: &Value) -> Option<String> {
        let key_fields = self
            .type_policy(type_name)
            .map_or(&KeyFields::Default, |policy| &policy.key_fields);
        match key_fields {
            KeyFields::NotNormalized => None,
            KeyFields::Default => {
                let id = match object.get("id")? {
                    Value::String(id) => id.clone(),
                    Value::Number(id) => id.to_string(),
                    _ => return None,
                };
                Some(format!("{type_name}:{id}"))
            }
            KeyFields::Fields(fields) => {
                let mut key = Map::new();
                for field in fields {
                    key.insert(field.clone(), object.get(field)?.clone());
                }
                Some(format!("{type_name}:{}", Value::Object(key)))
            }
        }
    }

    /// The descriptor served to the browser client.
    pub fn to_json(&self) -> Value {
        serde_json::json!({ "typePolicies": self.type_policies })
    }
}

impl FieldPolicy {
    /// The arguments that distinguish stored values of the field.
    pub fn key_args(self, args: &Map<String, Value>) -> Map<String, Value> {
        match self {
            FieldPolicy::RelayPagination => args
                .iter()
                .filter(|(name, _)| !CURSOR_ARGS.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// Merge an incoming page into the stored value of the field.
    ///
    /// `nodes` and `edges` of the incoming page are appended after the stored
    /// ones; every other field (`pageInfo`, `totalCount`, …) is taken from the
    /// incoming page.
    pub fn merge(self, existing: Option<&Value>, incoming: &Value) -> Value {
        match self {
            FieldPolicy::RelayPagination => {
                let (Some(Value::Object(existing)), Value::Object(incoming)) = (existing, incoming)
                else {
                    return incoming.clone();
                };
                let mut merged = incoming.clone();
                for list in ["edges", "nodes"] {
                    if let (Some(Value::Array(stored)), Some(Value::Array(page))) =
                        (existing.get(list), incoming.get(list))
                    {
                        let items = stored.iter().chain(page).cloned().collect();
                        merged.insert(list.to_string(), Value::Array(items));
                    }
                }
                Value::Object(merged)
            }
        }
    }
}

/// The key a field value is stored under: `field` without arguments, or
/// `field({...})` with its key arguments sorted at every depth.
pub fn storage_key(
    field: &str,
    args: &Map<String, Value>,
    policy: Option<FieldPolicy>,
) -> String {
    let args = match policy {
        Some(policy) => policy.key_args(args),
        None => args.clone(),
    };
    if args.is_empty() {
        return field.to_string();
    }
    let rendered = canonical(&Value::Object(args)).to_string();
    format!("{field}({rendered})")
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let sorted: BTreeMap<&String, Value> = object
                .iter()
                .map(|(key, value)| (key, canonical(value)))
                .collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(key, value)| (key.clone(), value))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

impl Serialize for TypePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.key_fields {
            KeyFields::Default => {}
            KeyFields::Fields(fields) => map.serialize_entry("keyFields", fields)?,
            KeyFields::NotNormalized => map.serialize_entry("keyFields", &false)?,
        }
        if !self.fields.is_empty() {
            let fields: IndexMap<&String, Value> = self
                .fields
                .iter()
                .map(|(name, policy)| (name, policy.to_json()))
                .collect();
            map.serialize_entry("fields", &fields)?;
        }
        map.end()
    }
}

impl FieldPolicy {
    fn to_json(self) -> Value {
        match self {
            FieldPolicy::RelayPagination => serde_json::json!({
                "keyArgs": { "exclude": CURSOR_ARGS },
                "merge": "relayPagination"
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_calendars_are_not_normalized() {
        let config = CacheConfig::mpdx();
        let calendar = json!({ "id": "primary", "name": "Main" });
        assert_eq!(config.cache_id("GoogleAccountIntegrationCalendars", &calendar), None);
        assert_eq!(
            config.cache_id("GoogleAccountIntegration", &json!({ "id": 5 })),
            Some("GoogleAccountIntegration:5".to_string())
        );
        assert_eq!(
            config.cache_id("User", &json!({ "id": "u" })),
            Some(r#"User:{"id":"u"}"#.to_string())
        );
        assert_eq!(config.cache_id("Contact", &json!({ "name": "no id" })), None);
    }

    #[test]
    fn test_storage_key_ignores_cursors() {
        let policy = CacheConfig::mpdx().field_policy("Query", "contacts");
        assert_eq!(policy, Some(FieldPolicy::RelayPagination));
        let first = storage_key(
            "contacts",
            &args(json!({ "accountListId": "a", "first": 25 })),
            policy,
        );
        let next = storage_key(
            "contacts",
            &args(json!({ "first": 25, "after": "cursor-1", "accountListId": "a" })),
            policy,
        );
        assert_eq!(first, next);
        assert_eq!(first, r#"contacts({"accountListId":"a","first":25})"#);
        assert_eq!(storage_key("me", &Map::new(), None), "me");
        assert_eq!(
            storage_key("contact", &args(json!({ "id": "1", "accountListId": "a" })), None),
            r#"contact({"accountListId":"a","id":"1"})"#
        );
    }

    #[test]
    fn test_storage_key_sorts_nested_arguments() {
        let policy = CacheConfig::mpdx().field_policy("Query", "contacts");
        let a = storage_key(
            "contacts",
            &args(json!({
                "accountListId": "1",
                "filter": { "status": "ACTIVE", "tags": ["x"] }
            })),
            policy,
        );
        let b = storage_key(
            "contacts",
            &args(json!({
                "filter": { "tags": ["x"], "status": "ACTIVE" },
                "accountListId": "1",
                "after": "cursor-2"
            })),
            policy,
        );
        assert_eq!(a, b);
        assert_eq!(
            a,
            r#"contacts({"accountListId":"1","filter":{"status":"ACTIVE","tags":["x"]}})"#
        );
    }

    #[test]
    fn test_relay_pages_are_concatenated() {
        let existing = json!({
            "nodes": [{ "id": "1" }, { "id": "2" }],
            "pageInfo": { "endCursor": "c2", "hasNextPage": true },
            "totalCount": 3
        });
        let incoming = json!({
            "nodes": [{ "id": "3" }],
            "pageInfo": { "endCursor": "c3", "hasNextPage": false },
            "totalCount": 3
        });
        assert_eq!(
            FieldPolicy::RelayPagination.merge(Some(&existing), &incoming),
            json!({
                "nodes": [{ "id": "1" }, { "id": "2" }, { "id": "3" }],
                "pageInfo": { "endCursor": "c3", "hasNextPage": false },
                "totalCount": 3
            })
        );
        assert_eq!(FieldPolicy::RelayPagination.merge(None, &incoming), incoming);
    }

    #[test]
    fn test_descriptor() {
        let descriptor = CacheConfig::mpdx().to_json();
        assert_eq!(
            descriptor["typePolicies"]["GoogleAccountIntegrationCalendars"],
            json!({ "keyFields": false })
        );
        assert_eq!(
            descriptor["typePolicies"]["Query"]["fields"]["tasks"],
            json!({ "keyArgs": { "exclude": ["after", "before"] }, "merge": "relayPagination" })
        );
        assert_eq!(descriptor["typePolicies"]["User"], json!({ "keyFields": ["id"] }));
    }
}
