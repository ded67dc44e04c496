//! Transcoding of JSON:API resources from the REST backend into GraphQL shapes.
//!
//! Keys are renamed from snake_case to camelCase, values are coerced per field
//! according to a [`MappingTable`] and related resources found in the
//! `included` side-table are inlined.

mod case;
mod coerce;
mod document;
mod mapping;

pub use case::{camel_to_snake, snake_to_camel};
pub use coerce::Coercion;
pub use document::{Pagination, ResourceRef};
pub use mapping::{MappingError, MappingTable, Page, TypeMapping};
