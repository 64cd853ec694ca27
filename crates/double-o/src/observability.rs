//! Centralized observability utilities for structured logging
//!
//! All HTTP exchanges and cache decisions are logged through this layer so
//! the field names stay consistent. Tokens are never logged: requests are
//! identified by method and path only, and cache entries by their namespace.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// HTTP request metadata for structured logging
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path, relative to the base URL and without query
    pub path: String,
    /// Request body size in bytes (optional)
    pub body_size: Option<usize>,
}

impl RequestMetadata {
    /// Create new request metadata
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body_size: None,
        }
    }

    /// Set the request body size
    pub fn with_body_size(mut self, size: usize) -> Self {
        self.body_size = Some(size);
        self
    }

    /// Log request being sent
    pub fn log_request(&self) {
        debug!(
            method = %self.method,
            path = %self.path,
            body_size = self.body_size,
            "Sending HTTP request"
        );
    }
}

/// HTTP response metadata for structured logging
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
    /// Response body size in bytes (optional)
    pub body_size: Option<usize>,
    /// Time elapsed for the request
    pub elapsed: Duration,
}

impl ResponseMetadata {
    /// Create new response metadata
    pub fn new(status: Option<u16>, elapsed: Duration) -> Self {
        Self {
            status,
            body_size: None,
            elapsed,
        }
    }

    /// Set the response body size
    pub fn with_body_size(mut self, size: usize) -> Self {
        self.body_size = Some(size);
        self
    }

    /// Log successful response
    pub fn log_success(&self, request: &RequestMetadata) {
        info!(
            method = %request.method,
            path = %request.path,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis() as u64,
            body_size = self.body_size,
            "HTTP request succeeded"
        );
    }

    /// Log failed response
    pub fn log_error(&self, request: &RequestMetadata, error: &str) {
        warn!(
            method = %request.method,
            path = %request.path,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis() as u64,
            error = %error,
            "HTTP request failed"
        );
    }
}

/// Timer for measuring request duration
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Log a cache hit for the given namespace ("secret" or "env").
pub fn log_cache_hit(namespace: &str) {
    debug!(namespace = %namespace, "Cache hit");
}

/// Log a cache miss for the given namespace.
pub fn log_cache_miss(namespace: &str) {
    debug!(namespace = %namespace, "Cache miss");
}

/// Log a cache write.
pub fn log_cache_write(namespace: &str, ttl: Duration) {
    debug!(
        namespace = %namespace,
        ttl_ms = ttl.as_millis() as u64,
        "Cached response"
    );
}

/// Log a classified failure surfaced to the caller.
pub fn log_classified_error(endpoint: &str, error: &crate::Error) {
    warn!(
        endpoint = %endpoint,
        kind = ?error.kind(),
        status = error.status(),
        error = %error,
        "Request failed"
    );
}

/// Install a `tracing-subscriber` formatter filtered by `RUST_LOG`
/// (default `double_o=info`).
///
/// Intended for applications and examples. Does nothing if a global
/// subscriber is already installed.
#[cfg(feature = "trace")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("double_o=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
