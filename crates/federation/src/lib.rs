//! The gateway in front of the remote API and the local rest subgraph.
//!
//! A client operation is planned into one operation per subgraph
//! ([`plan::plan`]), the parts are fetched with the caller's api token and
//! the results are merged back into a single response ([`Gateway`]).

mod executor;
pub mod http;
pub mod plan;
mod service;
mod service_list;

pub use executor::{Gateway, SUBREQUEST_HTTP_ERROR};
pub use http::{ExposeInternalErrors, GraphQLError, RawRequest, Response};
pub use plan::PlanError;
pub use service::{
    RemoteGraphqlService, SubgraphError, SubgraphRequest, SubgraphResponse, SubgraphService,
};
pub use service_list::{CompositionError, RootKind, ServiceId, ServiceList};
