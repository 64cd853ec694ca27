//! HTTP response as seen by the classifier

/// Status and body of one HTTP response.
///
/// Transports return every status they receive here; deciding what a status
/// means is left to the client and the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    /// Create a new response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response carrying `value` serialized as JSON.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Get the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Check if response was successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the server failed (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}
