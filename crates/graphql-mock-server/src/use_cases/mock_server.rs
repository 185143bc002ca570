use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use super::{register_mock, resolve_body};
use crate::entities::{
    GraphQLBody, GraphQLReply, MockDefinition, MockRegistry, MockRequest, MockResponse,
    MockSummary,
};
use crate::error::HarnessError;

/// Options for [`MockServer::verify_all_used`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Clear every mock once verification passes
    pub also_reset: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { also_reset: true }
    }
}

/// Cloneable handle to a shared mock registry.
///
/// Test code registers and verifies mocks through it while the transport
/// resolves incoming requests through a clone of the same handle.
#[derive(Clone, Default)]
pub struct MockServer {
    registry: Arc<Mutex<MockRegistry>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, MockRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a canned response for a request shape.
    pub fn register_mock(
        &self,
        request: MockRequest,
        response: impl Into<MockResponse>,
    ) -> Result<(), HarnessError> {
        register_mock(&mut self.registry(), request, response.into())
    }

    /// Register every definition, stopping at the first invalid one.
    pub fn register_all(
        &self,
        definitions: impl IntoIterator<Item = MockDefinition>,
    ) -> Result<(), HarnessError> {
        let mut registry = self.registry();
        for definition in definitions {
            register_mock(&mut registry, definition.request, definition.response)?;
        }
        Ok(())
    }

    /// Answer a request body. The registry stays locked for the whole body.
    pub fn resolve(&self, body: &GraphQLBody) -> GraphQLReply {
        resolve_body(&mut self.registry(), body)
    }

    pub fn reset_all(&self) {
        self.registry().reset_all();
        info!("Mocks reset");
    }

    /// Fail with the first mock that was not matched as often as allowed.
    ///
    /// When verification passes and `also_reset` is set, the registry is
    /// cleared. A failure leaves every mock in place.
    pub fn verify_all_used(&self, options: VerifyOptions) -> Result<(), HarnessError> {
        let mut registry = self.registry();
        if let Some(unused) = registry.find_unused() {
            return Err(HarnessError::UnusedMock(unused));
        }
        if options.also_reset {
            registry.reset_all();
        }
        Ok(())
    }

    /// First unused mock, if any, without failing.
    pub fn unused(&self) -> Option<String> {
        self.registry().find_unused()
    }

    pub fn snapshot(&self) -> Vec<MockSummary> {
        self.registry().snapshot()
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("mocks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{GraphQLRequest, GraphQLResponse, Limit};
    use serde_json::json;

    fn resolve_single(mocks: &MockServer, request: GraphQLRequest) -> GraphQLResponse {
        match mocks.resolve(&GraphQLBody::Single(request)) {
            GraphQLReply::Single(response) => response,
            GraphQLReply::Batch(_) => panic!("Expected a single reply"),
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mocks = MockServer::new();
        mocks
            .register_mock(MockRequest::new("test"), json!({"hello": "world"}))
            .unwrap();

        let request = GraphQLRequest::new("test").with_variables(json!({}));
        assert_eq!(
            resolve_single(&mocks, request.clone()),
            GraphQLResponse::data(json!({"hello": "world"}))
        );
        let second = resolve_single(&mocks, request);
        assert!(second.errors.unwrap()[0].message.contains("limit reached"));
    }

    #[test]
    fn test_clones_share_registry() {
        let mocks = MockServer::new();
        let transport = mocks.clone();
        mocks
            .register_mock(MockRequest::new("test"), json!({}))
            .unwrap();
        assert!(!resolve_single(&transport, GraphQLRequest::new("test")).is_error());
        assert!(mocks.verify_all_used(VerifyOptions::default()).is_ok());
    }

    #[test]
    fn test_verify_reports_unused() {
        let mocks = MockServer::new();
        mocks
            .register_mock(MockRequest::new("test"), json!({}))
            .unwrap();

        let err = mocks.verify_all_used(VerifyOptions::default()).unwrap_err();
        assert!(err.to_string().contains("not used"));
        assert_eq!(mocks.len(), 1);
    }

    #[test]
    fn test_verify_resets_by_default() {
        let mocks = MockServer::new();
        mocks
            .register_mock(MockRequest::new("test"), MockResponse::new(json!({})).unlimited())
            .unwrap();
        mocks.verify_all_used(VerifyOptions::default()).unwrap();
        assert!(mocks.is_empty());
    }

    #[test]
    fn test_verify_can_keep_mocks() {
        let mocks = MockServer::new();
        mocks
            .register_mock(MockRequest::new("test"), MockResponse::new(json!({})).unlimited())
            .unwrap();
        mocks
            .verify_all_used(VerifyOptions { also_reset: false })
            .unwrap();
        assert_eq!(mocks.len(), 1);
    }

    #[test]
    fn test_reset_all() {
        let mocks = MockServer::new();
        mocks
            .register_mock(MockRequest::new("test"), json!({}))
            .unwrap();
        mocks.reset_all();

        assert!(mocks.snapshot().is_empty());
        assert!(mocks.unused().is_none());
        let response = resolve_single(&mocks, GraphQLRequest::new("test"));
        assert!(response.errors.unwrap()[0]
            .message
            .contains("No query mocks found"));
    }

    #[test]
    fn test_snapshot_tracks_uses() {
        let mocks = MockServer::new();
        mocks
            .register_mock(
                MockRequest::new("test"),
                MockResponse::new(json!({})).with_count(3),
            )
            .unwrap();
        resolve_single(&mocks, GraphQLRequest::new("test"));

        let snapshot = mocks.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].limit, Limit::Times(3));
        assert_eq!(snapshot[0].uses_consumed, 1);
    }

    #[test]
    fn test_register_all_stops_at_duplicate() {
        let mocks = MockServer::new();
        let definition = MockDefinition {
            request: MockRequest::new("test"),
            response: MockResponse::new(json!({})),
        };
        let err = mocks
            .register_all(vec![definition.clone(), definition])
            .unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateMock { .. }));
        assert_eq!(mocks.len(), 1);
    }

    #[test]
    fn test_concurrent_limit_is_respected() {
        let mocks = MockServer::new();
        mocks
            .register_mock(MockRequest::new("test"), MockResponse::new(json!({})).with_count(5))
            .unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let mocks = mocks.clone();
                std::thread::spawn(move || {
                    !resolve_single(&mocks, GraphQLRequest::new("test")).is_error()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 5);
    }
}
