//! Aggregating the descriptors of every area into one executable schema.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, InputObject, InputValue, Object, ResolverContext, Scalar, Schema,
    Type, TypeRef,
};
use field_mapper::{MappingError, MappingTable, TypeMapping};
use rest_client::RestApi;
use tracing_util::{ErrorVisibility, SpanVisibility, TraceableError};

use crate::context::DataSources;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("type {type_name} of subgraph {subgraph} is already defined")]
    DuplicateType { subgraph: String, type_name: String },
    #[error("root field {field} of subgraph {subgraph} is already defined")]
    DuplicateRootField { subgraph: String, field: String },
    #[error("invalid field mapping in subgraph {subgraph}: {source}")]
    Mapping {
        subgraph: String,
        source: MappingError,
    },
    #[error("invalid schema: {0}")]
    Schema(String),
}

impl TraceableError for ComposeError {
    fn visibility(&self) -> ErrorVisibility {
        ErrorVisibility::Internal
    }
}

/// A root query or mutation field together with its name.
pub struct RootField {
    name: String,
    field: Field,
}

impl RootField {
    pub fn new<F>(name: &str, ty: impl Into<TypeRef>, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            field: Field::new(name, ty, resolver),
        }
    }

    /// The `input: <type>!` argument.
    #[must_use]
    pub fn input(self, type_name: &str) -> Self {
        self.argument(InputValue::new("input", TypeRef::named_nn(type_name)))
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValue) -> Self {
        self.field = self.field.argument(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Types, root fields and mapping rules of one domain area.
pub struct SubgraphDescriptor {
    name: &'static str,
    types: Vec<(String, Type)>,
    queries: Vec<RootField>,
    mutations: Vec<RootField>,
    mappings: Vec<TypeMapping>,
}

impl SubgraphDescriptor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            types: Vec::new(),
            queries: Vec::new(),
            mutations: Vec::new(),
            mappings: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn object(mut self, object: Object) -> Self {
        self.types.push((object.type_name().to_string(), object.into()));
        self
    }

    #[must_use]
    pub fn input_object(mut self, input: InputObject) -> Self {
        self.types.push((input.type_name().to_string(), input.into()));
        self
    }

    #[must_use]
    pub fn scalar(mut self, scalar: Scalar) -> Self {
        self.types.push((scalar.type_name().to_string(), scalar.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, field: RootField) -> Self {
        self.queries.push(field);
        self
    }

    #[must_use]
    pub fn mutation(mut self, field: RootField) -> Self {
        self.mutations.push(field);
        self
    }

    #[must_use]
    pub fn mapping(mut self, mapping: TypeMapping) -> Self {
        self.mappings.push(mapping);
        self
    }
}

/// The executable local subgraph.
#[derive(Clone)]
pub struct RestSubgraph {
    schema: Schema,
    query_fields: Vec<String>,
    mutation_fields: Vec<String>,
    mapping: Arc<MappingTable>,
}

impl std::fmt::Debug for RestSubgraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSubgraph")
            .field("query_fields", &self.query_fields)
            .field("mutation_fields", &self.mutation_fields)
            .finish_non_exhaustive()
    }
}

impl RestSubgraph {
    pub fn query_fields(&self) -> &[String] {
        &self.query_fields
    }

    pub fn mutation_fields(&self) -> &[String] {
        &self.mutation_fields
    }

    pub fn mapping(&self) -> &Arc<MappingTable> {
        &self.mapping
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Execute `request` with REST calls made through `rest`.
    pub async fn execute(
        &self,
        request: impl Into<async_graphql::Request>,
        rest: Arc<dyn RestApi>,
    ) -> async_graphql::Response {
        let request: async_graphql::Request = request.into();
        let request = request.data(DataSources {
            rest,
            mapping: self.mapping.clone(),
        });
        let tracer = tracing_util::global_tracer();
        tracer
            .in_span_async(
                "execute_rest_subgraph",
                "Execute the rest subgraph",
                SpanVisibility::Internal,
                || {
                    Box::pin(async {
                        tracing_util::Successful::new(self.schema.execute(request).await)
                    })
                },
            )
            .await
            .into_inner()
    }
}

/// Aggregate `descriptors` in order into one schema. Every type, root field and
/// type mapping may be defined once.
pub fn compose(descriptors: Vec<SubgraphDescriptor>) -> Result<RestSubgraph, ComposeError> {
    let mut type_names = HashSet::new();
    let mut types = Vec::new();
    let mut queries = Vec::new();
    let mut mutations = Vec::new();
    let mut query_fields = Vec::new();
    let mut mutation_fields = Vec::new();
    let mut mapping = MappingTable::new();

    for descriptor in descriptors {
        let subgraph = descriptor.name;
        for (type_name, ty) in descriptor.types {
            if !type_names.insert(type_name.clone()) {
                return Err(ComposeError::DuplicateType {
                    subgraph: subgraph.to_string(),
                    type_name,
                });
            }
            types.push(ty);
        }
        for (fields, names, root) in [
            (descriptor.queries, &mut query_fields, &mut queries),
            (descriptor.mutations, &mut mutation_fields, &mut mutations),
        ] {
            for RootField { name, field } in fields {
                if names.contains(&name) {
                    return Err(ComposeError::DuplicateRootField {
                        subgraph: subgraph.to_string(),
                        field: name,
                    });
                }
                names.push(name);
                root.push(field);
            }
        }
        for type_mapping in descriptor.mappings {
            mapping
                .insert(type_mapping)
                .map_err(|source| ComposeError::Mapping {
                    subgraph: subgraph.to_string(),
                    source,
                })?;
        }
    }

    let has_mutations = !mutations.is_empty();
    let query = queries.into_iter().fold(Object::new("Query"), Object::field);
    let mut builder =
        Schema::build("Query", has_mutations.then_some("Mutation"), None).register(query);
    if has_mutations {
        let mutation = mutations
            .into_iter()
            .fold(Object::new("Mutation"), Object::field);
        builder = builder.register(mutation);
    }
    let schema = types
        .into_iter()
        .fold(builder, |builder, ty| builder.register(ty))
        .finish()
        .map_err(|err| ComposeError::Schema(err.to_string()))?;

    tracing::info!(
        queries = query_fields.len(),
        mutations = mutation_fields.len(),
        "composed the rest subgraph"
    );
    Ok(RestSubgraph {
        schema,
        query_fields,
        mutation_fields,
        mapping: Arc::new(mapping),
    })
}
