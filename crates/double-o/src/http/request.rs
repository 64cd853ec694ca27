//! Transport-neutral request descriptor

use crate::error::{Error, Result, TransportError};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use url::Url;

/// Where the caller's token travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `?token=<token>` query parameter (secret and environment endpoints)
    Query,
    /// `Authorization: Bearer <token>` header (proxy endpoint)
    Bearer,
}

/// One logical call to the service, independent of the HTTP client that
/// sends it.
///
/// The path is relative to the configured base URL. The token is kept as a
/// [`SecretString`] and only exposed when a transport renders the request,
/// so neither `Debug` output nor logs ever contain it.
pub struct ApiRequest {
    method: Method,
    path: String,
    token: SecretString,
    placement: TokenPlacement,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request for `path` authenticated with `token`.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        token: &str,
        placement: TokenPlacement,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            token: SecretString::new(token.to_owned().into_boxed_str()),
            placement,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `GET /api/secret?token=<token>`
    pub fn secret(token: &str) -> Self {
        Self::new(Method::GET, "api/secret", token, TokenPlacement::Query)
    }

    /// `GET /api/env?token=<token>`
    pub fn env(token: &str) -> Self {
        Self::new(Method::GET, "api/env", token, TokenPlacement::Query)
    }

    /// `<method> /api/proxy/<path>` with a bearer token and a JSON content type.
    ///
    /// Leading slashes of `path` are ignored.
    pub fn proxy(method: Method, path: &str, token: &str) -> Self {
        let path = format!("api/proxy/{}", path.trim_start_matches('/'));
        let mut request = Self::new(method, path, token, TokenPlacement::Bearer);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
    }

    /// Merge `headers` over the request's own, replacing same-named entries.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Set the raw request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Get the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the path, relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// How the token is attached.
    pub fn placement(&self) -> TokenPlacement {
        self.placement
    }

    /// Get the extra headers (the authorization header is added at send time).
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Whether this request carries `token`.
    pub fn has_token(&self, token: &str) -> bool {
        self.token.expose_secret() == token
    }

    /// Resolve the absolute URL against `base`, adding the token query
    /// parameter when it travels in the query.
    pub fn url(&self, base: &Url) -> std::result::Result<Url, TransportError> {
        let mut url = base
            .join(&self.path)
            .map_err(|e| TransportError::Request(format!("invalid path '{}': {e}", self.path)))?;
        if self.placement == TokenPlacement::Query {
            url.query_pairs_mut()
                .append_pair("token", self.token.expose_secret());
        }
        Ok(url)
    }

    /// The headers to send: the bearer authorization (if any) overlaid by the
    /// request's own headers.
    pub fn wire_headers(&self) -> std::result::Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        if self.placement == TokenPlacement::Bearer {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
                    .map_err(|_| {
                        TransportError::Request("token is not a valid header value".to_string())
                    })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        Ok(headers)
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("token", &"[REDACTED]")
            .field("placement", &self.placement)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

/// Parse a header name/value pair, reporting which half was invalid.
pub fn parse_header(
    key: impl Into<String>,
    value: impl Into<String>,
) -> Result<(HeaderName, HeaderValue)> {
    let key_str = key.into();
    let value_str = value.into();

    let key = key_str
        .parse::<HeaderName>()
        .map_err(|_| Error::InvalidHeaderName(key_str.clone()))?;
    let value = value_str
        .parse::<HeaderValue>()
        .map_err(|_| Error::InvalidHeaderValue(value_str.clone()))?;

    Ok((key, value))
}

/// Helper function to serialize a body to JSON bytes.
pub(crate) fn serialize_body(body: &(dyn erased_serde::Serialize + Send + Sync)) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(Error::Serialization)
}
