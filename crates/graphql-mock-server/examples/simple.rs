//! Simple example demonstrating basic usage of graphql-mock-server
//!
//! This example shows how to:
//! - Start the mock server on a free port
//! - Register mocks, including one matching specific variables
//! - Query it like a client would, then verify every mock was used

use graphql_mock_server::prelude::*;

#[tokio::main]
async fn main() -> Result<(), HarnessError> {
    let mocks = MockServer::new();
    let server = Axum::default().spawn(mocks.clone()).await?;
    println!("Mock server listening on {}", server.url());

    mocks.register_mock(
        MockRequest::new("{ posts { title } }"),
        json!({"posts": [{"title": "Hello World"}]}),
    )?;
    mocks.register_mock(
        MockRequest::new("query Post($id: ID!) { post(id: $id) { title } }")
            .with_variables(json!({"id": "1"})),
        MockResponse::new(json!({"post": {"title": "Hello World"}})).unlimited(),
    )?;

    let client = reqwest::Client::new();
    let posts: serde_json::Value = client
        .post(server.url())
        .json(&json!({"query": "{\n  posts {\n    title\n    __typename\n  }\n}"}))
        .send()
        .await
        .map_err(|e| HarnessError::ServerError(e.to_string()))?
        .json()
        .await
        .map_err(|e| HarnessError::ServerError(e.to_string()))?;
    println!("posts: {}", posts);

    let batch: serde_json::Value = client
        .post(server.url())
        .json(&json!([
            {"query": "query Post($id: ID!) { post(id: $id) { title } }", "variables": {"id": "1"}},
            {"query": "query Post($id: ID!) { post(id: $id) { title } }", "variables": {"id": "2"}}
        ]))
        .send()
        .await
        .map_err(|e| HarnessError::ServerError(e.to_string()))?
        .json()
        .await
        .map_err(|e| HarnessError::ServerError(e.to_string()))?;
    println!("batch: {}", batch);

    for mock in mocks.snapshot() {
        println!(
            "{} {} used {} of {}",
            mock.query, mock.variables, mock.uses_consumed, mock.limit
        );
    }

    mocks.verify_all_used(VerifyOptions::default())?;
    server.stop().await
}
