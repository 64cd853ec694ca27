//! # Double-O client
//!
//! Rust client for the Double-O service:
//! - Fetch secrets and environment maps by token
//! - Load environment maps into the process environment
//! - Forward API calls (chat completions and anything else) through the proxy
//! - Optional per-call TTL caching and automatic retries with exponential backoff
//!
//! Both an async [`Client`] and a thread-based [`blocking::Client`] are
//! provided, with identical semantics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use double_o::{ChatCompletionRequest, ChatMessage, Client};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder().max_retries(2).build()?;
//!
//!     let api_key = client
//!         .get_secret("secret-token", Some(Duration::from_secs(300)))
//!         .await?;
//!     println!("fetched a key of {} characters", api_key.len());
//!
//!     let reply = client
//!         .chat_completion(
//!             "proxy-token",
//!             ChatCompletionRequest::new(vec![ChatMessage::user("Hello!")]),
//!         )
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every failure is an [`Error`]. Rejected tokens surface as
//! [`Error::Authentication`]; other failures carry the endpoint they came
//! from ([`Error::Secret`], [`Error::Env`] or [`Error::Proxy`]) together with
//! the HTTP status when one was received.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use cache::{AsyncResponseCache, CacheKey, CachedValue, ResponseCache};
pub use chat::{ChatCompletionRequest, ChatMessage};
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use environment::EnvironmentMap;
pub use error::{Error, ErrorKind, Result, TransportError};
pub use global::{
    chat, default_client, get_env, get_secret, invalidate_cache, load_env, proxy,
    reset_default_client, set_default_client,
};
pub use proxy::ProxyRequest;

#[cfg(feature = "blocking")]
#[cfg_attr(docsrs, doc(cfg(feature = "blocking")))]
pub mod blocking;
pub mod cache;
pub mod chat;
mod classify;
pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod global;
pub mod http;
pub mod observability;
pub mod proxy;

pub use serde_json::Value as JsonValue;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use double_o::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ChatCompletionRequest, ChatMessage, Client, ClientConfig, EnvironmentMap, Error,
        ErrorKind, ProxyRequest, Result,
    };
}

/// Crate version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default service base URL
pub const DEFAULT_BASE_URL: &str = "https://double-o-539191849800.europe-west1.run.app";
