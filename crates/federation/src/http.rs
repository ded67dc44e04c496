use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The request as we receive it from the client, before we parse the query
/// string.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
}

/// A list of path segments starting at the root of the response and
/// ending with the field associated with the error.
/// <https://spec.graphql.org/October2021/#sel-HAPHRPHABABC3vT>
pub type Path = Vec<PathSegment>;

/// A path segment is either a field name or an index into a list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A GraphQL error as defined by the GraphQL spec.
/// <https://spec.graphql.org/October2021/#sec-Errors.Error-result-format>
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    /// The path of the response field which experienced the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    /// Internal errors have their details censored unless internal errors are
    /// exposed.
    #[serde(skip)]
    pub is_internal: bool,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
            is_internal: false,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    /// Set `extensions.<key>`
    #[must_use]
    pub fn with_extension(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extensions
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// Whether internal error details reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposeInternalErrors {
    Expose,
    Censor,
}

impl ExposeInternalErrors {
    pub fn censor(self, mut error: GraphQLError) -> GraphQLError {
        if error.is_internal && self == ExposeInternalErrors::Censor {
            error.message = "internal error".to_string();
            if let Some(extensions) = &mut error.extensions {
                extensions.retain(|key, _| key == "code" || key == "serviceName");
            }
        }
        error
    }
}

/// A GraphQL response
#[derive(Debug)]
pub struct Response {
    pub status_code: http::StatusCode,
    pub headers: http::HeaderMap,
    pub body: ResponseBody,
}

/// A GraphQL response body
/// Ref: <https://spec.graphql.org/October2021/#sec-Response-Format>
#[derive(Serialize, Debug)]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "ResponseData::omit")]
    pub data: ResponseData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

/// `Omit` means the `data` key is left out of the response because an error was
/// raised before execution could begin (a request error).
#[derive(Debug)]
pub enum ResponseData {
    Omit,
    Data(Option<IndexMap<String, Value>>),
}

impl ResponseData {
    fn omit(&self) -> bool {
        matches!(self, Self::Omit)
    }
}

impl Serialize for ResponseData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ResponseData::Omit => serializer.serialize_none(),
            ResponseData::Data(data) => data.serialize(serializer),
        }
    }
}

impl ResponseBody {
    pub fn data(&self) -> Option<&IndexMap<String, Value>> {
        match &self.data {
            ResponseData::Omit => None,
            ResponseData::Data(data) => data.as_ref(),
        }
    }
}

impl Response {
    pub fn partial(data: IndexMap<String, Value>, errors: Vec<GraphQLError>) -> Self {
        Self {
            status_code: http::StatusCode::OK,
            headers: http::HeaderMap::new(),
            body: ResponseBody {
                data: ResponseData::Data(Some(data)),
                errors,
            },
        }
    }

    /// Ref: <https://spec.graphql.org/October2021/#sec-Errors.Request-errors>
    pub fn request_error(error: GraphQLError) -> Self {
        Self {
            status_code: http::StatusCode::BAD_REQUEST,
            headers: http::HeaderMap::new(),
            body: ResponseBody {
                data: ResponseData::Omit,
                errors: vec![error],
            },
        }
    }

    pub fn does_contain_error(&self) -> bool {
        !self.body.errors.is_empty()
    }
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, self.headers, axum::Json(self.body)).into_response()
    }
}
