use thiserror::Error;

use super::{GraphQLResponse, Limit};

/// Why a request could not be answered with a mock.
///
/// These are normal outcomes of a test run and are sent back to the client as
/// GraphQL errors. The `registered` lists are diagnostics only and never
/// appear in the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No query specified in request to the mock server!")]
    QueryMissing,

    #[error("No query mocks found! '{query}'")]
    NoQueryMock {
        query: String,
        registered: Vec<String>,
    },

    #[error("No variables mock found! '{variables}'")]
    NoVariablesMock {
        variables: String,
        registered: Vec<String>,
    },

    #[error("Mocked query limit reached! Specified count: {limit}")]
    LimitReached { limit: Limit },
}

impl From<ResolutionError> for GraphQLResponse {
    fn from(error: ResolutionError) -> Self {
        GraphQLResponse::error(error.to_string())
    }
}
