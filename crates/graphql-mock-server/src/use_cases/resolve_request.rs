use serde_json::Value;
use tracing::{debug, warn};

use crate::entities::{
    normalize_variables, GraphQLBody, GraphQLReply, GraphQLRequest, GraphQLResponse,
    MockRegistry, QueryKey, ResolutionError,
};

/// Answer every request in `body`, preserving its shape and order.
pub fn resolve_body(registry: &mut MockRegistry, body: &GraphQLBody) -> GraphQLReply {
    match body {
        GraphQLBody::Single(request) => GraphQLReply::Single(respond(registry, request)),
        GraphQLBody::Batch(requests) => GraphQLReply::Batch(
            requests
                .iter()
                .map(|request| match request {
                    Ok(request) => respond(registry, request),
                    Err(message) => {
                        warn!(%message, "Malformed request in batch");
                        GraphQLResponse::error(message.as_str())
                    }
                })
                .collect(),
        ),
    }
}

fn respond(registry: &mut MockRegistry, request: &GraphQLRequest) -> GraphQLResponse {
    match resolve_request(registry, request) {
        Ok(data) => GraphQLResponse::data(data),
        Err(error) => error.into(),
    }
}

/// Match one request against the registry and consume the matched mock.
///
/// The limit check, payload selection and use count increment all happen
/// under the single `&mut` borrow of the registry.
pub fn resolve_request(
    registry: &mut MockRegistry,
    request: &GraphQLRequest,
) -> Result<Value, ResolutionError> {
    let outcome = match_request(registry, request);
    match &outcome {
        Ok(_) => debug!(
            operation_name = request.operation_name.as_deref().unwrap_or_default(),
            "Mocked request matched"
        ),
        Err(error) => log_unmatched(error),
    }
    outcome
}

fn match_request(
    registry: &mut MockRegistry,
    request: &GraphQLRequest,
) -> Result<Value, ResolutionError> {
    let query = match request.query.as_deref() {
        Some(query) => QueryKey::new(query),
        None => return Err(ResolutionError::QueryMissing),
    };
    if query.is_empty_body() {
        return Err(ResolutionError::QueryMissing);
    }

    let variables = normalize_variables(request.variables.as_ref());

    if registry.lookup_query(&query).is_none() {
        return Err(ResolutionError::NoQueryMock {
            query: request.query.clone().unwrap_or_default(),
            registered: registry
                .query_keys()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
        });
    }

    let entry = match registry.lookup_mut(&query, &variables) {
        Some(entry) => entry,
        None => {
            return Err(ResolutionError::NoVariablesMock {
                variables: variables.to_string(),
                registered: registry
                    .lookup_query(&query)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(variables, _)| variables.to_string())
                    .collect(),
            })
        }
    };

    if entry.is_exhausted() {
        return Err(ResolutionError::LimitReached {
            limit: entry.limit(),
        });
    }

    let data = entry.next_payload().cloned().unwrap_or(Value::Null);
    MockRegistry::mark_consumed(entry);
    Ok(data)
}

fn log_unmatched(error: &ResolutionError) {
    warn!("{}", error);
    match error {
        ResolutionError::NoQueryMock { registered, .. } => {
            debug!("Queries mocked:\n{}", registered.join("\n\n"))
        }
        ResolutionError::NoVariablesMock { registered, .. } => {
            debug!("Query variables mocked:\n{}", registered.join("\n\n"))
        }
        _ => {}
    }
}
