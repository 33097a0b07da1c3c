/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for mstodo-adapter tests

use mstodo_adapter::{ClientConfig, GraphClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Build a client with both base URLs pointed at the mock server
pub fn mock_graph_client(server: &MockServer) -> GraphClient {
    GraphClient::with_config_and_base_urls(ClientConfig::default(), &server.uri(), &server.uri())
        .expect("client init")
}

/// Mock bearer token for testing
#[allow(dead_code)]
pub fn mock_bearer_token() -> String {
    "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9.test.signature".to_string()
}
