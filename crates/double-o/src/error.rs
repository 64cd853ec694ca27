//! Error types for the double-o client
//!
//! Every failure a caller can observe is one [`Error`]. The four service
//! variants ([`Error::Authentication`], [`Error::Secret`], [`Error::Env`],
//! [`Error::Proxy`]) come out of response classification; the remaining
//! variants are library-level problems such as a malformed base URL.
//! [`Error::kind`] collapses all of them onto [`ErrorKind`] so callers can
//! match as broadly or as narrowly as they need.
//!
//! [`TransportError`] is the failure type of a single HTTP attempt. It is what
//! the retry executor sees; callers only meet it wrapped into a classified
//! [`Error`] once the retry budget is spent.

use double_o_core::error_boundary;
use thiserror::Error;

/// Result type alias for operations that can fail with a double-o error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the double-o client.
#[derive(Debug, Error)]
pub enum Error {
    /// The token was rejected (HTTP 401, or an upstream error message that
    /// mentions authentication or tokens).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Human-readable description
        message: String,
        /// Upstream HTTP status, when a response was received
        status: Option<u16>,
    },

    /// Fetching a single secret failed.
    #[error("Secret error: {message}")]
    Secret {
        /// Human-readable description
        message: String,
        /// Upstream HTTP status, when a response was received
        status: Option<u16>,
    },

    /// Fetching an environment map failed.
    #[error("Environment error: {message}")]
    Env {
        /// Human-readable description
        message: String,
        /// Upstream HTTP status, when a response was received
        status: Option<u16>,
    },

    /// A proxied API call failed.
    #[error("Proxy error: {message}")]
    Proxy {
        /// Human-readable description
        message: String,
        /// Upstream HTTP status, when a response was received
        status: Option<u16>,
    },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid HTTP header name.
    #[error("Invalid HTTP header name: {0}")]
    InvalidHeaderName(String),

    /// Invalid HTTP header value.
    #[error("Invalid HTTP header value: {0}")]
    InvalidHeaderValue(String),

    /// HTTP client configuration or initialization error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or unparseable configuration.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

/// Broad classification of an [`Error`].
///
/// Every error is a double-o error; `Library` covers the ones that did not
/// come from talking to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Token rejected.
    Authentication,
    /// Secret endpoint failure.
    Secret,
    /// Environment endpoint failure.
    Env,
    /// Proxy endpoint failure.
    Proxy,
    /// Configuration, serialization or client setup failure.
    Library,
}

impl Error {
    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>, status: Option<u16>) -> Self {
        Error::Authentication {
            message: message.into(),
            status,
        }
    }

    /// The broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Secret { .. } => ErrorKind::Secret,
            Error::Env { .. } => ErrorKind::Env,
            Error::Proxy { .. } => ErrorKind::Proxy,
            Error::InvalidUrl(_)
            | Error::InvalidHeaderName(_)
            | Error::InvalidHeaderValue(_)
            | Error::HttpClient(_)
            | Error::Serialization(_)
            | Error::MissingConfig(_) => ErrorKind::Library,
        }
    }

    /// Upstream HTTP status code, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. }
            | Error::Secret { status, .. }
            | Error::Env { status, .. }
            | Error::Proxy { status, .. } => *status,
            _ => None,
        }
    }

    /// The human-readable message, without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Authentication { message, .. }
            | Error::Secret { message, .. }
            | Error::Env { message, .. }
            | Error::Proxy { message, .. } => message.clone(),
            Error::InvalidUrl(msg)
            | Error::InvalidHeaderName(msg)
            | Error::InvalidHeaderValue(msg)
            | Error::HttpClient(msg)
            | Error::MissingConfig(msg) => msg.clone(),
            Error::Serialization(err) => err.to_string(),
        }
    }

    /// Whether the token was rejected.
    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }
}

/// Failure of a single HTTP attempt.
///
/// Non-2xx responses are only represented here when they are worth retrying
/// (5xx); every other response reaches the classifier as a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established or was dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The attempt exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The service answered with a server error.
    #[error("server returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as received
        body: String,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built (never sent).
    #[error("invalid request: {0}")]
    Request(String),
}

impl TransportError {
    /// Check if another attempt could plausibly succeed.
    ///
    /// Connection failures, timeouts, interrupted bodies and 5xx responses are
    /// retryable. A request that could not be built never is.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connection(_)
            | TransportError::Timeout(_)
            | TransportError::Body(_) => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::Request(_) => false,
        }
    }
}

error_boundary!(reqwest::Error => TransportError, |err| {
    // Strip the URL: it carries the token as a query parameter.
    let err = err.without_url();
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::Request(err.to_string())
    } else if err.is_body() || err.is_decode() {
        TransportError::Body(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status {
            status: status.as_u16(),
            body: String::new(),
        }
    } else {
        TransportError::Connection(err.to_string())
    }
});
