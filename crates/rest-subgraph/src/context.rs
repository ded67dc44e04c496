use std::sync::Arc;

use async_graphql::dynamic::{ObjectAccessor, ResolverContext};
use async_graphql::ErrorExtensions;
use field_mapper::{camel_to_snake, MappingTable};
use rest_client::{RestApi, RestError};
use serde_json::{Map, Value};

/// Everything a resolver needs, injected per request.
#[derive(Clone)]
pub struct DataSources {
    /// REST client bound to the bearer token of the request
    pub rest: Arc<dyn RestApi>,
    pub mapping: Arc<MappingTable>,
}

impl std::fmt::Debug for DataSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSources")
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

pub(crate) fn data_sources<'a>(
    ctx: &'a ResolverContext<'_>,
) -> async_graphql::Result<&'a DataSources> {
    ctx.data::<DataSources>()
}

/// Turn a failed REST call into a field error whose `extensions.code` tells
/// the client what went wrong.
pub(crate) fn rest_error(err: RestError) -> async_graphql::Error {
    let code = err.kind().code();
    tracing::warn!(error = %err, code, "REST request failed");
    async_graphql::Error::new(err.to_string())
        .extend_with(|_, extensions| extensions.set("code", code))
}

/// The `input` argument every root field takes.
pub(crate) struct Input<'a>(ObjectAccessor<'a>);

impl<'a> Input<'a> {
    pub(crate) fn of(ctx: &'a ResolverContext<'_>) -> async_graphql::Result<Self> {
        Ok(Self(ctx.args.try_get("input")?.object()?))
    }

    /// A required `ID` or `String` argument.
    pub(crate) fn string(&self, name: &str) -> async_graphql::Result<String> {
        Ok(self.0.try_get(name)?.string()?.to_string())
    }

    /// An optional string argument, `""` when absent or `null`.
    pub(crate) fn string_or_empty(&self, name: &str) -> async_graphql::Result<String> {
        self.optional_string(name).map(Option::unwrap_or_default)
    }

    pub(crate) fn optional_string(&self, name: &str) -> async_graphql::Result<Option<String>> {
        match self.0.get(name) {
            Some(value) if !value.is_null() => Ok(Some(value.string()?.to_string())),
            _ => Ok(None),
        }
    }

    pub(crate) fn boolean(&self, name: &str) -> async_graphql::Result<bool> {
        self.0.try_get(name)?.boolean()
    }

    /// A positive page number or size, `default` when absent or `null`.
    pub(crate) fn page(&self, name: &str, default: u32) -> async_graphql::Result<u32> {
        match self.0.get(name) {
            Some(value) if !value.is_null() => {
                let page = value.i64()?;
                u32::try_from(page)
                    .ok()
                    .filter(|page| *page > 0)
                    .ok_or_else(|| {
                        async_graphql::Error::new(format!("{name} must be a positive integer"))
                    })
            }
            _ => Ok(default),
        }
    }

    /// A nested input object as REST attributes: keys become snake_case and
    /// `null` fields are dropped.
    pub(crate) fn attributes(&self, name: &str) -> async_graphql::Result<Map<String, Value>> {
        let Some(value) = self.0.get(name).filter(|value| !value.is_null()) else {
            return Ok(Map::new());
        };
        match value.as_value().clone().into_json()? {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (camel_to_snake(&key), value))
                .collect()),
            _ => Err(async_graphql::Error::new(format!("{name} must be an object"))),
        }
    }
}
