//! Transport traits for sending requests to the service
//!
//! The clients never talk to an HTTP library directly. They hand an
//! [`ApiRequest`] to a transport and get back either a [`RawResponse`] (any
//! status) or a [`TransportError`] when no response was obtained. This keeps
//! the caching, retry and classification logic testable without a network.

use super::{ApiRequest, RawResponse};
use crate::error::TransportError;
use async_trait::async_trait;

/// Sends requests from async code.
///
/// Implementations own the underlying session. The session is created on
/// first use; [`close`](Self::close) releases it and the next `send` must
/// transparently create a new one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response could be obtained.
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;

    /// Release the underlying session, if one is open.
    fn close(&self) {}
}

/// Sends requests from ordinary threads, blocking the caller.
///
/// Same contract as [`Transport`]. Implementations must be shareable between
/// threads.
#[cfg_attr(test, mockall::automock)]
pub trait BlockingTransport: Send + Sync {
    /// Perform one HTTP exchange, blocking the current thread.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response could be obtained.
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;

    /// Release the underlying session, if one is open.
    fn close(&self) {}
}
