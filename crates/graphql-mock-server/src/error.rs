use thiserror::Error;

/// Errors raised to the code driving the mock server: registration mistakes,
/// failed verification and server lifecycle problems.
///
/// Unmatched requests never surface here; they are answered over the wire
/// with a [`ResolutionError`](crate::entities::ResolutionError) payload.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Missing query in mock request")]
    MissingQuery,

    #[error("Empty query in mock request")]
    EmptyQuery,

    #[error("Duplicate mock query! '{query}... {variables}'")]
    DuplicateMock { query: String, variables: String },

    #[error("Invalid mock: {0}")]
    InvalidMock(String),

    #[error("Mock query not used! '{0}'")]
    UnusedMock(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
