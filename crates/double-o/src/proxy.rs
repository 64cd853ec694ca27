//! Proxied API calls

use crate::error::Result;
use crate::http::{ApiRequest, HeaderMap, Method, parse_header, serialize_body};
use serde::Serialize;

/// A call to forward through `/api/proxy/<path>`.
///
/// Defaults to `POST` with no body. The proxy token is supplied when the
/// request is sent, as `Authorization: Bearer <token>`; headers added here
/// are merged over the defaults and win on conflicts.
///
/// # Examples
///
/// ```rust
/// use double_o::{ProxyRequest, http::Method};
/// use serde_json::json;
///
/// # fn example() -> double_o::Result<()> {
/// let request = ProxyRequest::new("v1/embeddings")
///     .json(&json!({"input": "hello", "model": "text-embedding-3-small"}))?
///     .header("X-Request-Source", "batch")?;
///
/// let listing = ProxyRequest::new("/v1/models").method(Method::GET);
/// assert_eq!(listing.path(), "v1/models");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    path: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ProxyRequest {
    /// Create a `POST` request for `path`. Leading slashes are ignored.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: path.as_ref().trim_start_matches('/').to_string(),
            method: Method::POST,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Serialize `payload` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if the
    /// payload cannot be serialized.
    pub fn json<T>(mut self, payload: &T) -> Result<Self>
    where
        T: Serialize + Send + Sync,
    {
        self.body = Some(serialize_body(payload)?);
        Ok(self)
    }

    /// Add a header, replacing any default of the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let (key, value) = parse_header(key, value)?;
        self.headers.insert(key, value);
        Ok(self)
    }

    /// Add several headers at once.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (key, value) in headers.iter() {
            self.headers.insert(key.clone(), value.clone());
        }
        self
    }

    /// Get the path below `/api/proxy/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the method.
    pub fn http_method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn into_api_request(self, token: &str) -> ApiRequest {
        let request = ApiRequest::proxy(self.method, &self.path, token).with_headers(self.headers);
        match self.body {
            Some(body) => request.with_body(body),
            None => request,
        }
    }
}

impl From<&str> for ProxyRequest {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ProxyRequest {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{AUTHORIZATION, CONTENT_TYPE};
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let request = ProxyRequest::new("//v1/models");
        assert_eq!(request.path(), "v1/models");
        assert_eq!(request.http_method(), Method::POST);

        let api = request.into_api_request("tok");
        assert_eq!(api.path(), "api/proxy/v1/models");
        assert!(api.body().is_none());
    }

    #[test]
    fn test_json_body_and_headers() {
        let api = ProxyRequest::from("v1/chat/completions")
            .json(&json!({"model": "gpt-4o-mini"}))
            .unwrap()
            .header("X-Trace", "1")
            .unwrap()
            .into_api_request("tok");

        let body: serde_json::Value = serde_json::from_slice(api.body().unwrap()).unwrap();
        assert_eq!(body, json!({"model": "gpt-4o-mini"}));

        let headers = api.wire_headers().unwrap();
        assert_eq!(headers["x-trace"], "1");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
    }

    #[test]
    fn test_caller_headers_override_authorization() {
        let api = ProxyRequest::new("x")
            .header("Authorization", "Bearer other")
            .unwrap()
            .into_api_request("tok");

        assert_eq!(api.wire_headers().unwrap()[AUTHORIZATION], "Bearer other");
    }
}
