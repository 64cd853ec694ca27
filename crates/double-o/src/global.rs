//! Module-level convenience functions backed by a shared default client.
//!
//! The default [`Client`] is created on first use. With the `env` feature it
//! is configured from `DOUBLE_O_*` variables (see [`ClientConfig::from_env`]),
//! otherwise from [`ClientConfig::default`]. Every function here uses the same
//! instance, so they share one session and one response cache.
//!
//! [`set_default_client`] installs a custom client and
//! [`reset_default_client`] discards the current one; the next call then
//! creates a fresh client, re-reading the environment.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! # async fn example() -> double_o::Result<()> {
//! let key = double_o::get_secret("secret-token", Some(Duration::from_secs(300))).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`ClientConfig::from_env`]: crate::ClientConfig::from_env
//! [`ClientConfig::default`]: crate::ClientConfig::default

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;

use crate::{
    Client, chat::ChatCompletionRequest, environment::EnvironmentMap, error::Result,
    proxy::ProxyRequest,
};

static DEFAULT_CLIENT: RwLock<Option<Client>> = RwLock::new(None);

/// The shared default client, created on first use.
///
/// # Errors
///
/// Returns an error if the client has to be created and its configuration is
/// invalid.
pub fn default_client() -> Result<Client> {
    if let Some(client) = current() {
        return Ok(client);
    }

    let mut slot = DEFAULT_CLIENT.write().unwrap_or_else(PoisonError::into_inner);
    // Another caller may have won the race for the write lock.
    if let Some(client) = slot.as_ref() {
        return Ok(client.clone());
    }

    let client = build_default()?;
    tracing::debug!("created default client");
    *slot = Some(client.clone());
    Ok(client)
}

/// Replace the default client. Returns the previous one, if any.
pub fn set_default_client(client: Client) -> Option<Client> {
    DEFAULT_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(client)
}

/// Discard the default client and release its session.
///
/// Clones handed out earlier keep working. Returns the discarded client.
pub fn reset_default_client() -> Option<Client> {
    let previous = DEFAULT_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(client) = &previous {
        client.close();
    }
    previous
}

/// [`Client::get_secret`] on the default client.
pub async fn get_secret(token: &str, cache_ttl: Option<Duration>) -> Result<String> {
    default_client()?.get_secret(token, cache_ttl).await
}

/// [`Client::get_env`] on the default client.
pub async fn get_env(token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
    default_client()?.get_env(token, cache_ttl).await
}

/// [`Client::load_env`] on the default client.
pub async fn load_env(token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
    default_client()?.load_env(token, cache_ttl).await
}

/// [`Client::proxy`] on the default client.
pub async fn proxy(token: &str, request: impl Into<ProxyRequest>) -> Result<Value> {
    default_client()?.proxy(token, request).await
}

/// [`Client::chat_completion`] on the default client.
pub async fn chat(token: &str, request: ChatCompletionRequest) -> Result<Value> {
    default_client()?.chat_completion(token, request).await
}

/// [`Client::invalidate_cache`] on the default client.
///
/// Does nothing when no default client exists yet.
pub async fn invalidate_cache(token: Option<&str>) {
    if let Some(client) = current() {
        client.invalidate_cache(token).await;
    }
}

fn current() -> Option<Client> {
    DEFAULT_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(feature = "env")]
fn build_default() -> Result<Client> {
    Client::from_env()
}

#[cfg(not(feature = "env"))]
fn build_default() -> Result<Client> {
    Client::new()
}
