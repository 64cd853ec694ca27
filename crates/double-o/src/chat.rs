//! Chat-completion convenience over the proxy endpoint.

use crate::error::Result;
use crate::proxy::ProxyRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Model used when none is set.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Proxy path of the chat-completions API.
pub const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an arbitrary role.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// A `system` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// A `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// An `assistant` message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Body of a chat-completion call.
///
/// Extra parameters (`temperature`, `max_tokens`, ...) are sent alongside
/// `model` and `messages`; they can never replace those two.
///
/// # Examples
///
/// ```rust
/// use double_o::{ChatCompletionRequest, ChatMessage};
///
/// let request = ChatCompletionRequest::new(vec![ChatMessage::user("Hello!")])
///     .model("gpt-4o")
///     .param("temperature", 0.2);
/// assert_eq!(request.model_name(), "gpt-4o");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    extra: Map<String, Value>,
}

impl ChatCompletionRequest {
    /// Create a request for `messages` using [`DEFAULT_CHAT_MODEL`].
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            messages,
            extra: Map::new(),
        }
    }

    /// Set the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Add an extra top-level parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Get the model.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Get the messages.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The JSON payload sent to the proxy.
    pub fn to_payload(&self) -> Result<Value> {
        let mut payload = self.extra.clone();
        payload.insert("model".to_string(), Value::String(self.model.clone()));
        payload.insert("messages".to_string(), serde_json::to_value(&self.messages)?);
        Ok(Value::Object(payload))
    }

    pub(crate) fn into_proxy_request(self) -> Result<ProxyRequest> {
        ProxyRequest::new(CHAT_COMPLETIONS_PATH).json(&self.to_payload()?)
    }
}
