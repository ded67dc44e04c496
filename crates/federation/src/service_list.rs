use std::collections::HashMap;
use std::sync::Arc;

use crate::service::SubgraphService;

/// The root operation type a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RootKind {
    #[display("Query")]
    Query,
    #[display("Mutation")]
    Mutation,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("root field {kind}.{field} is claimed by both {first} and {second}")]
    DuplicateRootField {
        kind: RootKind,
        field: String,
        first: String,
        second: String,
    },
    #[error("a service named {0} is already registered")]
    DuplicateServiceName(String),
}

/// Index of a service inside a `ServiceList`.
pub type ServiceId = usize;

/// The subgraphs behind the gateway and the root fields each one owns.
///
/// Root fields not claimed by any registered service belong to the default
/// service, which is the remote API.
#[derive(Clone)]
pub struct ServiceList {
    services: Vec<Arc<dyn SubgraphService>>,
    owners: HashMap<(RootKind, String), ServiceId>,
}

const DEFAULT_SERVICE: ServiceId = 0;

impl ServiceList {
    pub fn new(default_service: Arc<dyn SubgraphService>) -> Self {
        Self {
            services: vec![default_service],
            owners: HashMap::new(),
        }
    }

    /// Register a service owning the given root fields.
    pub fn with_service<Q, M>(
        mut self,
        service: Arc<dyn SubgraphService>,
        query_fields: Q,
        mutation_fields: M,
    ) -> Result<Self, CompositionError>
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        if self.services.iter().any(|s| s.name() == service.name()) {
            return Err(CompositionError::DuplicateServiceName(
                service.name().to_string(),
            ));
        }
        let id = self.services.len();
        let fields = query_fields
            .into_iter()
            .map(|field| (RootKind::Query, field.into()))
            .chain(
                mutation_fields
                    .into_iter()
                    .map(|field| (RootKind::Mutation, field.into())),
            );
        for (kind, field) in fields {
            if let Some(existing) = self.owners.get(&(kind, field.clone())) {
                return Err(CompositionError::DuplicateRootField {
                    kind,
                    field,
                    first: self.services[*existing].name().to_string(),
                    second: service.name().to_string(),
                });
            }
            self.owners.insert((kind, field), id);
        }
        self.services.push(service);
        Ok(self)
    }

    pub fn owner(&self, kind: RootKind, field: &str) -> ServiceId {
        self.owners
            .get(&(kind, field.to_string()))
            .copied()
            .unwrap_or(DEFAULT_SERVICE)
    }

    pub fn service(&self, id: ServiceId) -> &Arc<dyn SubgraphService> {
        &self.services[id]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|service| service.name())
    }
}

impl std::fmt::Debug for ServiceList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceList")
            .field("services", &self.names().collect::<Vec<_>>())
            .field("owners", &self.owners)
            .finish()
    }
}
