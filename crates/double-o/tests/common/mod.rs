//! Common test utilities and fixtures
//!
//! - rstest for fixtures
//! - wiremock for HTTP mocking (isolated, parallel-safe)
//! - #[tokio::test] for async testing

#![allow(dead_code)]

pub mod responses;

use double_o::Client;
use rstest::*;
use std::time::Duration;
use wiremock::MockServer;

pub use responses::{env_response, error_response, secret_response};

/// Token used by most tests
pub const TEST_TOKEN: &str = "test-token-12345";

/// Fixture providing a wiremock HTTP server
#[fixture]
pub async fn mock_server() -> MockServer {
    MockServer::start().await
}

/// Async client pointed at `server`, with near-instant backoff.
pub fn client_for(server: &MockServer, max_retries: u32) -> Client {
    Client::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .max_retries(max_retries)
        .backoff_factor(Duration::from_millis(1))
        .retry_jitter(Duration::ZERO)
        .build()
        .expect("Failed to build test client")
}

/// Blocking client pointed at `uri`, with near-instant backoff.
#[cfg(feature = "blocking")]
pub fn blocking_client_for(uri: &str, max_retries: u32) -> double_o::blocking::Client {
    double_o::blocking::Client::builder()
        .base_url(uri)
        .timeout(Duration::from_secs(5))
        .max_retries(max_retries)
        .backoff_factor(Duration::from_millis(1))
        .retry_jitter(Duration::ZERO)
        .build()
        .expect("Failed to build blocking test client")
}
