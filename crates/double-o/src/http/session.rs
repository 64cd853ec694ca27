//! reqwest-backed transports
//!
//! Both transports keep their `reqwest` client in a [`LazyResource`]: it is
//! built on the first request, shared by every request of the owning client
//! (and its clones), dropped by `close()`, and rebuilt by the next request.

use super::{ApiRequest, RawResponse, Transport};
use crate::config::ClientConfig;
use crate::error::{Error, Result, TransportError};
use crate::observability::{RequestMetadata, RequestTimer, ResponseMetadata};
use async_trait::async_trait;
use double_o_core::resource::{LazyResource, Resource};
use http::HeaderMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Settings a session is built from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    timeout: Duration,
    default_headers: HeaderMap,
}

impl SessionConfig {
    fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            timeout: config.timeout,
            default_headers: config.default_headers.clone(),
        }
    }
}

fn user_agent() -> String {
    format!("double-o-rust/{}", crate::VERSION)
}

/// Async HTTP session.
pub struct AsyncSession {
    client: reqwest::Client,
}

impl Resource for AsyncSession {
    type Config = SessionConfig;
    type Error = Error;

    fn initialize(config: &Self::Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(config.default_headers.clone())
            .user_agent(user_agent())
            .build()
            .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {e}")))?;
        tracing::debug!("Opened HTTP session");
        Ok(Self { client })
    }
}

/// [`Transport`] over an async `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    base_url: Url,
    session: LazyResource<AsyncSession>,
}

impl ReqwestTransport {
    /// Create a transport for `config`. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the base URL is invalid.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.resolved_base_url()?,
            session: LazyResource::new(SessionConfig::from_client_config(config)),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.session.is_initialized()
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .field("open", &self.is_open())
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> std::result::Result<RawResponse, TransportError> {
        let session = self
            .session
            .get()
            .map_err(|e| TransportError::Request(e.message()))?;
        let url = request.url(&self.base_url)?;
        let metadata = request_metadata(request);
        metadata.log_request();

        let mut builder = session
            .client
            .request(request.method().clone(), url)
            .headers(request.wire_headers()?);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let timer = RequestTimer::start();
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, TransportError>(RawResponse::new(status, body))
        };
        let result = exchange.await;
        log_exchange(&metadata, &timer, &result);
        result
    }

    fn close(&self) {
        if self.session.release() {
            tracing::debug!("Closed HTTP session");
        }
    }
}

/// Blocking HTTP session.
#[cfg(feature = "blocking")]
pub struct BlockingSession {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "blocking")]
impl Resource for BlockingSession {
    type Config = SessionConfig;
    type Error = Error;

    fn initialize(config: &Self::Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .default_headers(config.default_headers.clone())
            .user_agent(user_agent())
            .build()
            .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {e}")))?;
        tracing::debug!("Opened blocking HTTP session");
        Ok(Self { client })
    }
}

/// [`BlockingTransport`](super::BlockingTransport) over a blocking `reqwest`
/// client.
///
/// Must not be used from inside an async runtime.
#[cfg(feature = "blocking")]
#[derive(Clone)]
pub struct BlockingReqwestTransport {
    base_url: Url,
    session: LazyResource<BlockingSession>,
}

#[cfg(feature = "blocking")]
impl BlockingReqwestTransport {
    /// Create a transport for `config`. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the base URL is invalid.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.resolved_base_url()?,
            session: LazyResource::new(SessionConfig::from_client_config(config)),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.session.is_initialized()
    }
}

#[cfg(feature = "blocking")]
impl fmt::Debug for BlockingReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(feature = "blocking")]
impl super::BlockingTransport for BlockingReqwestTransport {
    fn send(&self, request: &ApiRequest) -> std::result::Result<RawResponse, TransportError> {
        let session = self
            .session
            .get()
            .map_err(|e| TransportError::Request(e.message()))?;
        let url = request.url(&self.base_url)?;
        let metadata = request_metadata(request);
        metadata.log_request();

        let mut builder = session
            .client
            .request(request.method().clone(), url)
            .headers(request.wire_headers()?);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let timer = RequestTimer::start();
        let exchange = || {
            let response = builder.send()?;
            let status = response.status().as_u16();
            let body = response.text()?;
            Ok::<_, TransportError>(RawResponse::new(status, body))
        };
        let result = exchange();
        log_exchange(&metadata, &timer, &result);
        result
    }

    fn close(&self) {
        if self.session.release() {
            tracing::debug!("Closed blocking HTTP session");
        }
    }
}

fn request_metadata(request: &ApiRequest) -> RequestMetadata {
    let metadata = RequestMetadata::new(request.method().as_str(), request.path());
    match request.body() {
        Some(body) => metadata.with_body_size(body.len()),
        None => metadata,
    }
}

fn log_exchange(
    metadata: &RequestMetadata,
    timer: &RequestTimer,
    result: &std::result::Result<RawResponse, TransportError>,
) {
    match result {
        Ok(response) => {
            let meta = ResponseMetadata::new(Some(response.status()), timer.elapsed())
                .with_body_size(response.body().len());
            if response.is_success() {
                meta.log_success(metadata);
            } else {
                meta.log_error(metadata, "non-success status");
            }
        }
        Err(err) => {
            ResponseMetadata::new(None, timer.elapsed()).log_error(metadata, &err.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig::with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_session_is_lazy_and_recreated_after_close() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/secret"))
            .and(query_param("token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":"v"}"#))
            .expect(2)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(&config_for(&server)).unwrap();
        assert!(!transport.is_open());

        let response = transport.send(&ApiRequest::secret("tok")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(transport.is_open());

        transport.close();
        assert!(!transport.is_open());

        // Use after close reopens the session
        let response = transport.send(&ApiRequest::secret("tok")).await.unwrap();
        assert_eq!(response.body(), r#"{"value":"v"}"#);
        assert!(transport.is_open());
    }

    #[tokio::test]
    async fn test_every_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proxy/v1/things"))
            .and(header("authorization", "Bearer tok"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(&config_for(&server)).unwrap();
        let response = transport
            .send(&ApiRequest::proxy(http::Method::POST, "/v1/things", "tok"))
            .await
            .unwrap();

        assert_eq!(response.status(), 503);
        assert_eq!(response.body(), "down");
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/env"))
            .and(header("x-team", "platform"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ClientConfig::builder()
            .base_url(server.uri())
            .default_header("X-Team", "platform")
            .unwrap()
            .build();
        let transport = ReqwestTransport::new(&config).unwrap();

        let response = transport.send(&ApiRequest::env("tok")).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = ClientConfig::builder()
            .base_url(server.uri())
            .timeout(Duration::from_millis(50))
            .build();
        let transport = ReqwestTransport::new(&config).unwrap();

        let err = transport.send(&ApiRequest::secret("tok")).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = ReqwestTransport::new(&ClientConfig::with_base_url("not a url"));
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
