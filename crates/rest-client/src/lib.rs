//! Client for the MPDX REST (JSON:API) backend.

mod api;
mod client;
mod error;

pub use api::{EntriesQuery, RestApi, ORGANIZATION_SEARCH_PER_PAGE};
pub use client::{Configuration, RestClient, DEFAULT_TIMEOUT};
pub use error::{RestError, RestErrorKind, RestResult};
