use tracing::debug;

use crate::entities::{
    normalize_variables, Limit, MockEntry, MockRegistry, MockRequest, MockResponse, Payload,
    QueryKey,
};
use crate::error::HarnessError;

/// Validate a mock definition and add it to `registry`.
///
/// Omitted (or `null`) variables register a wildcard for the query. A
/// response without a count may be matched once per payload.
pub fn register_mock(
    registry: &mut MockRegistry,
    request: MockRequest,
    response: MockResponse,
) -> Result<(), HarnessError> {
    let query = request.query.ok_or(HarnessError::MissingQuery)?;
    let query_key = QueryKey::new(&query);
    if query_key.is_empty_body() {
        return Err(HarnessError::EmptyQuery);
    }

    let variables_key = normalize_variables(request.variables.as_ref());

    if matches!(&response.payload, Payload::Sequence(items) if items.is_empty()) {
        return Err(HarnessError::InvalidMock(
            "response sequence is empty".to_string(),
        ));
    }
    let limit = response.limit()?;
    if limit == Limit::Times(0) {
        return Err(HarnessError::InvalidMock(
            "count must be at least 1, use null for unlimited".to_string(),
        ));
    }

    let entry = MockEntry::new(query, response.payload, limit);
    if let Some(conflict) = registry.register(query_key.clone(), variables_key.clone(), entry) {
        return Err(HarnessError::DuplicateMock {
            query: conflict.query,
            variables: conflict.variables,
        });
    }

    debug!(query = %query_key, variables = %variables_key, %limit, "Registered mock");
    Ok(())
}
