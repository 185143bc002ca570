//! GraphQL Mock Server
//!
//! Register canned responses for GraphQL requests, then point client code
//! at a local server that answers with them. Queries are compared after
//! stripping whitespace, optional commas and `__typename`, and variables are
//! compared regardless of key order.
//!
//! # Example
//!
//! ```rust,no_run
//! use graphql_mock_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), HarnessError> {
//!     let mocks = MockServer::new();
//!     let server = Axum::default().spawn(mocks.clone()).await?;
//!
//!     mocks.register_mock(
//!         MockRequest::new("{ posts { title } }"),
//!         json!({"posts": [{"title": "Hello World"}]}),
//!     )?;
//!
//!     // ... point the client under test at `server.url()` ...
//!
//!     mocks.verify_all_used(VerifyOptions::default())?;
//!     server.stop().await
//! }
//! ```

mod adapters;
pub mod config;
pub mod entities;
pub mod error;
pub mod use_cases;

pub use error::HarnessError;

#[cfg(feature = "axum")]
pub use adapters::gateways::{Axum, RunningServer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::entities::{
        GraphQLBody, GraphQLReply, GraphQLRequest, GraphQLResponse, Limit, MockDefinition,
        MockRequest, MockResponse, MockSummary, ResolutionError,
    };
    pub use crate::error::HarnessError;
    pub use crate::use_cases::ports::Server;
    pub use crate::use_cases::{MockServer, VerifyOptions};
    pub use serde_json::json;

    #[cfg(feature = "axum")]
    pub use crate::{Axum, RunningServer};
}
