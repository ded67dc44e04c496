//! Splitting a client operation into one operation per subgraph.
//!
//! Only the root selection set is split. Everything below a root field is
//! forwarded verbatim to the service that owns the field, together with the
//! fragments and variables it uses.

use std::collections::{HashMap, HashSet};

use graphql_parser::query::{
    Definition, Directive, Document, Field, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, Value as GqlValue, VariableDefinition,
};
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing_util::{ErrorVisibility, TraceableError};

use crate::http::{GraphQLError, RawRequest};
use crate::service_list::{RootKind, ServiceId, ServiceList};

type Fragments<'d, 'q> = HashMap<&'d str, &'d FragmentDefinition<'q, String>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{0}")]
    Parse(String),
    #[error("unknown operation named \"{0}\"")]
    UnknownOperation(String),
    #[error("must provide operation name if query contains multiple operations")]
    OperationNameRequired,
    #[error("must provide an operation")]
    NoOperation,
    #[error("subscriptions are not supported")]
    SubscriptionNotSupported,
    #[error("unknown fragment \"{0}\"")]
    UnknownFragment(String),
    #[error("cannot spread fragment \"{0}\" within itself")]
    FragmentCycle(String),
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::Parse(_) => "GRAPHQL_PARSE_FAILED",
            PlanError::UnknownOperation(_) | PlanError::OperationNameRequired => "BAD_USER_INPUT",
            PlanError::NoOperation
            | PlanError::SubscriptionNotSupported
            | PlanError::UnknownFragment(_)
            | PlanError::FragmentCycle(_) => "GRAPHQL_VALIDATION_FAILED",
        }
    }

    pub fn to_graphql_error(&self) -> GraphQLError {
        GraphQLError::new(self.to_string()).with_extension("code", self.code())
    }
}

impl TraceableError for PlanError {
    fn visibility(&self) -> ErrorVisibility {
        ErrorVisibility::User
    }
}

/// Where the value of a root response key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootField {
    /// `__typename`, answered by the gateway
    Typename,
    /// The fetch at this index of `QueryPlan::fetches`
    Fetched(usize),
}

/// One operation sent to one subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetch {
    pub service: ServiceId,
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
    /// Root response keys this fetch answers, in selection order
    pub response_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub kind: RootKind,
    /// Every root response key in selection order
    pub root: IndexMap<String, RootField>,
    /// Fetches of a query are independent. Fetches of a mutation must run one
    /// after the other in this order.
    pub fetches: Vec<Fetch>,
}

pub fn plan(services: &ServiceList, request: &RawRequest) -> Result<QueryPlan, PlanError> {
    let document = graphql_parser::parse_query::<String>(&request.query)
        .map_err(|err| PlanError::Parse(err.to_string()))?;
    let fragments: Fragments = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
            Definition::Operation(_) => None,
        })
        .collect();
    let operation = select_operation(&document, request.operation_name.as_deref())?;
    let (kind, selection_set, variable_definitions) = match operation {
        OperationDefinition::SelectionSet(selection_set) => {
            (RootKind::Query, selection_set, &[][..])
        }
        OperationDefinition::Query(query) => (
            RootKind::Query,
            &query.selection_set,
            &query.variable_definitions[..],
        ),
        OperationDefinition::Mutation(mutation) => (
            RootKind::Mutation,
            &mutation.selection_set,
            &mutation.variable_definitions[..],
        ),
        OperationDefinition::Subscription(_) => return Err(PlanError::SubscriptionNotSupported),
    };

    let empty = Map::new();
    let variables = request.variables.as_ref().unwrap_or(&empty);
    let mut root_fields = Vec::new();
    flatten_root(selection_set, &[], &fragments, &mut Vec::new(), &mut root_fields)?;

    let mut root = IndexMap::new();
    let mut groups: Vec<(ServiceId, Vec<Field<'_, String>>)> = Vec::new();
    for field in root_fields {
        if !is_included(&field.directives, variables, variable_definitions) {
            continue;
        }
        let response_key = field.alias.clone().unwrap_or_else(|| field.name.clone());
        if field.name == "__typename" {
            root.entry(response_key).or_insert(RootField::Typename);
            continue;
        }
        let service = services.owner(kind, &field.name);
        let group = match kind {
            RootKind::Query => groups.iter().position(|(owner, _)| *owner == service),
            RootKind::Mutation => groups
                .last()
                .filter(|(owner, _)| *owner == service)
                .map(|_| groups.len() - 1),
        };
        let group = group.unwrap_or_else(|| {
            groups.push((service, Vec::new()));
            groups.len() - 1
        });
        groups[group].1.push(field);
        root.entry(response_key).or_insert(RootField::Fetched(group));
    }

    let fetches = groups
        .into_iter()
        .map(|(service, fields)| fetch(service, operation, fields, &fragments, variables))
        .collect::<Result<_, _>>()?;
    Ok(QueryPlan {
        kind,
        root,
        fetches,
    })
}

fn select_operation<'d, 'q>(
    document: &'d Document<'q, String>,
    operation_name: Option<&str>,
) -> Result<&'d OperationDefinition<'q, String>, PlanError> {
    let mut operations = document.definitions.iter().filter_map(|definition| match definition {
        Definition::Operation(operation) => Some(operation),
        Definition::Fragment(_) => None,
    });
    match operation_name {
        Some(wanted) => operations
            .find(|operation| name_of(operation) == Some(wanted))
            .ok_or_else(|| PlanError::UnknownOperation(wanted.to_string())),
        None => {
            let first = operations.next().ok_or(PlanError::NoOperation)?;
            if operations.next().is_some() {
                return Err(PlanError::OperationNameRequired);
            }
            Ok(first)
        }
    }
}

fn name_of<'d>(operation: &'d OperationDefinition<'_, String>) -> Option<&'d str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

/// Expand fragment spreads and inline fragments of the root selection set into
/// a flat list of fields. Directives of the expanded fragments are appended to
/// the directives of each field they contain.
fn flatten_root<'q>(
    selection_set: &SelectionSet<'q, String>,
    inherited: &[Directive<'q, String>],
    fragments: &Fragments<'_, 'q>,
    spreading: &mut Vec<String>,
    fields: &mut Vec<Field<'q, String>>,
) -> Result<(), PlanError> {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                let mut field = field.clone();
                field.directives.extend(inherited.iter().cloned());
                fields.push(field);
            }
            Selection::FragmentSpread(spread) => {
                let name = &spread.fragment_name;
                let fragment = fragments
                    .get(name.as_str())
                    .ok_or_else(|| PlanError::UnknownFragment(name.clone()))?;
                if spreading.contains(name) {
                    return Err(PlanError::FragmentCycle(name.clone()));
                }
                spreading.push(name.clone());
                let directives = [&spread.directives[..], inherited].concat();
                flatten_root(&fragment.selection_set, &directives, fragments, spreading, fields)?;
                spreading.pop();
            }
            Selection::InlineFragment(inline) => {
                let directives = [&inline.directives[..], inherited].concat();
                flatten_root(&inline.selection_set, &directives, fragments, spreading, fields)?;
            }
        }
    }
    Ok(())
}

/// Evaluate `@skip` and `@include`. A condition that cannot be resolved keeps
/// the field, the owning service reports the problem.
fn is_included(
    directives: &[Directive<'_, String>],
    variables: &Map<String, Value>,
    definitions: &[VariableDefinition<'_, String>],
) -> bool {
    directives.iter().all(|directive| {
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .and_then(|(_, value)| resolve_bool(value, variables, definitions));
        match (directive.name.as_str(), condition) {
            ("skip", Some(skip)) => !skip,
            ("include", Some(include)) => include,
            _ => true,
        }
    })
}

fn resolve_bool(
    value: &GqlValue<'_, String>,
    variables: &Map<String, Value>,
    definitions: &[VariableDefinition<'_, String>],
) -> Option<bool> {
    match value {
        GqlValue::Boolean(value) => Some(*value),
        GqlValue::Variable(name) => match variables.get(name) {
            Some(value) => value.as_bool(),
            None => definitions
                .iter()
                .find(|definition| &definition.name == name)
                .and_then(|definition| match &definition.default_value {
                    Some(GqlValue::Boolean(value)) => Some(*value),
                    _ => None,
                }),
        },
        _ => None,
    }
}

fn fetch<'q>(
    service: ServiceId,
    operation: &OperationDefinition<'q, String>,
    fields: Vec<Field<'q, String>>,
    fragments: &Fragments<'_, 'q>,
    variables: &Map<String, Value>,
) -> Result<Fetch, PlanError> {
    let mut response_keys = IndexSet::new();
    let mut used_variables = HashSet::new();
    let mut used_fragments = IndexSet::new();
    for field in &fields {
        response_keys.insert(field.alias.clone().unwrap_or_else(|| field.name.clone()));
        collect_field(field, fragments, &mut used_variables, &mut used_fragments)?;
    }
    let items = fields.into_iter().map(Selection::Field).collect();

    let mut operation = operation.clone();
    match &mut operation {
        OperationDefinition::SelectionSet(selection_set) => selection_set.items = items,
        OperationDefinition::Query(query) => {
            collect_directives(&query.directives, &mut used_variables);
            query.selection_set.items = items;
            query
                .variable_definitions
                .retain(|definition| used_variables.contains(&definition.name));
        }
        OperationDefinition::Mutation(mutation) => {
            collect_directives(&mutation.directives, &mut used_variables);
            mutation.selection_set.items = items;
            mutation
                .variable_definitions
                .retain(|definition| used_variables.contains(&definition.name));
        }
        OperationDefinition::Subscription(_) => return Err(PlanError::SubscriptionNotSupported),
    }
    let operation_name = name_of(&operation).map(ToString::to_string);

    let mut definitions = vec![Definition::Operation(operation)];
    definitions.extend(used_fragments.iter().filter_map(|name| {
        fragments
            .get(name.as_str())
            .map(|fragment| Definition::Fragment((*fragment).clone()))
    }));
    let query = Document { definitions }.to_string();

    let variables = variables
        .iter()
        .filter(|(name, _)| used_variables.contains(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Ok(Fetch {
        service,
        query,
        operation_name,
        variables,
        response_keys: response_keys.into_iter().collect(),
    })
}

fn collect_field(
    field: &Field<'_, String>,
    fragments: &Fragments,
    variables: &mut HashSet<String>,
    used_fragments: &mut IndexSet<String>,
) -> Result<(), PlanError> {
    for (_, value) in &field.arguments {
        collect_value(value, variables);
    }
    collect_directives(&field.directives, variables);
    collect_selection_set(&field.selection_set, fragments, variables, used_fragments)
}

fn collect_selection_set(
    selection_set: &SelectionSet<'_, String>,
    fragments: &Fragments,
    variables: &mut HashSet<String>,
    used_fragments: &mut IndexSet<String>,
) -> Result<(), PlanError> {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => collect_field(field, fragments, variables, used_fragments)?,
            Selection::FragmentSpread(spread) => {
                collect_directives(&spread.directives, variables);
                let name = &spread.fragment_name;
                if used_fragments.insert(name.clone()) {
                    let fragment = fragments
                        .get(name.as_str())
                        .ok_or_else(|| PlanError::UnknownFragment(name.clone()))?;
                    collect_directives(&fragment.directives, variables);
                    collect_selection_set(
                        &fragment.selection_set,
                        fragments,
                        variables,
                        used_fragments,
                    )?;
                }
            }
            Selection::InlineFragment(inline) => {
                collect_directives(&inline.directives, variables);
                collect_selection_set(&inline.selection_set, fragments, variables, used_fragments)?;
            }
        }
    }
    Ok(())
}

fn collect_directives(directives: &[Directive<'_, String>], variables: &mut HashSet<String>) {
    for directive in directives {
        for (_, value) in &directive.arguments {
            collect_value(value, variables);
        }
    }
}

fn collect_value(value: &GqlValue<'_, String>, variables: &mut HashSet<String>) {
    match value {
        GqlValue::Variable(name) => {
            variables.insert(name.clone());
        }
        GqlValue::List(values) => {
            for value in values {
                collect_value(value, variables);
            }
        }
        GqlValue::Object(fields) => {
            for value in fields.values() {
                collect_value(value, variables);
            }
        }
        _ => {}
    }
}
