use async_trait::async_trait;
use std::future::Future;
use std::net::SocketAddr;

use crate::error::HarnessError;
use crate::use_cases::MockServer;

/// Trait for transports that expose a [`MockServer`] over the network
#[async_trait]
pub trait Server: Send + Sync + Clone {
    /// Serve `mocks` until `shutdown` completes.
    ///
    /// `on_ready` receives the bound address once the listener is up, which
    /// matters when binding port 0.
    async fn run<F, S>(
        &self,
        mocks: MockServer,
        on_ready: Option<F>,
        shutdown: S,
    ) -> Result<(), HarnessError>
    where
        F: FnOnce(SocketAddr) + Send + 'static,
        S: Future<Output = ()> + Send + 'static;
}
