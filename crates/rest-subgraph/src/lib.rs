//! The local "rest" subgraph: GraphQL fields answered by the REST API.
//!
//! Each domain area contributes a [`SubgraphDescriptor`] with its types, root
//! fields and field mapping rules. [`compose`] aggregates them into one
//! executable [`RestSubgraph`]. Every resolver makes exactly one REST call
//! through the [`DataSources`] of the request and maps the JSON:API document
//! into the GraphQL shape.

mod appeals;
mod composer;
mod context;
mod fields;
mod preferences;
mod reports;
mod shared;

pub use appeals::appeals;
pub use composer::{compose, ComposeError, RestSubgraph, RootField, SubgraphDescriptor};
pub use context::DataSources;
pub use preferences::preferences;
pub use reports::reports;

/// Every descriptor of the rest subgraph, shared types first.
pub fn subgraphs() -> Vec<SubgraphDescriptor> {
    std::iter::once(shared::descriptor())
        .chain(preferences())
        .chain(reports())
        .chain(appeals())
        .collect()
}

/// The rest subgraph with every area.
pub fn build() -> Result<RestSubgraph, ComposeError> {
    compose(subgraphs())
}
