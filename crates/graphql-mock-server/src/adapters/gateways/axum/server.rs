use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::entities::{GraphQLBody, GraphQLReply, GraphQLResponse};
use crate::error::HarnessError;
use crate::use_cases::ports::Server;
use crate::use_cases::MockServer;

/// Route mocked GraphQL requests are served on.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Axum-based GraphQL transport
#[derive(Clone)]
pub struct Axum {
    addr: SocketAddr,
}

impl Axum {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn bind(addr: impl Into<SocketAddr>) -> Self {
        Self::new(addr.into())
    }

    /// Start serving in a background task and wait until the listener is
    /// bound.
    pub async fn spawn(&self, mocks: MockServer) -> Result<RunningServer, HarnessError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = self.clone();
        let task = tokio::spawn(async move {
            server
                .run(
                    mocks,
                    Some(move |addr| {
                        let _ = ready_tx.send(addr);
                    }),
                    async move {
                        let _ = shutdown_rx.await;
                    },
                )
                .await
        });

        match ready_rx.await {
            Ok(addr) => Ok(RunningServer {
                addr,
                shutdown_tx: Some(shutdown_tx),
                task,
            }),
            // The listener never came up; surface the error from the task.
            Err(_) => match task.await {
                Ok(Err(e)) => Err(e),
                Ok(Ok(())) => Err(HarnessError::ServerError(
                    "Server exited before it was ready".to_string(),
                )),
                Err(e) => Err(HarnessError::ServerError(e.to_string())),
            },
        }
    }
}

impl Default for Axum {
    fn default() -> Self {
        Self::new(([127, 0, 0, 1], 0).into())
    }
}

/// A server started with [`Axum::spawn`].
///
/// Dropping it also shuts the server down.
pub struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), HarnessError>>,
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Full URL of the GraphQL endpoint.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, GRAPHQL_PATH)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) -> Result<(), HarnessError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| HarnessError::ServerError(e.to_string()))?
    }
}

fn router(mocks: MockServer) -> Router {
    Router::new()
        .route(GRAPHQL_PATH, post(handle_graphql).options(handle_preflight))
        .layer(middleware::map_response(with_cors_headers))
        .with_state(mocks)
}

async fn handle_graphql(State(mocks): State<MockServer>, body: Bytes) -> impl IntoResponse {
    let reply = match GraphQLBody::parse(&body) {
        Ok(body) => mocks.resolve(&body),
        Err(message) => {
            warn!(%message, "Malformed GraphQL request body");
            GraphQLReply::Single(GraphQLResponse::error(message))
        }
    };

    (StatusCode::OK, Json(reply))
}

async fn handle_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn with_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
    );
    response
}

#[async_trait]
impl Server for Axum {
    async fn run<F, S>(
        &self,
        mocks: MockServer,
        on_ready: Option<F>,
        shutdown: S,
    ) -> Result<(), HarnessError>
    where
        F: FnOnce(SocketAddr) + Send + 'static,
        S: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| {
                error!(addr = %self.addr, error = %e, "Mock server failed to start");
                HarnessError::ServerError(format!("failed to bind {}: {}", self.addr, e))
            })?;

        let addr = listener
            .local_addr()
            .map_err(|e| HarnessError::ServerError(e.to_string()))?;
        info!(%addr, mocks = mocks.len(), "Mock server listening");

        if let Some(callback) = on_ready {
            callback(addr);
        }

        axum::serve(listener, router(mocks))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| HarnessError::ServerError(e.to_string()))?;

        info!(%addr, "Mock server stopped");
        Ok(())
    }
}
