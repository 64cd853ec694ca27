//! Blocking counterparts of the crate-level convenience functions.
//!
//! Backed by a default [`blocking::Client`](Client) that is separate from the
//! async one, with its own session and cache. Created on first use the same
//! way as [`crate::global::default_client`].

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;

use super::Client;
use crate::{
    chat::ChatCompletionRequest, environment::EnvironmentMap, error::Result, proxy::ProxyRequest,
};

static DEFAULT_CLIENT: RwLock<Option<Client>> = RwLock::new(None);

/// The shared default blocking client, created on first use.
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
    if let Some(client) = slot.as_ref() {
        return Ok(client.clone());
    }

    let client = build_default()?;
    tracing::debug!("created default blocking client");
    *slot = Some(client.clone());
    Ok(client)
}

/// Replace the default blocking client. Returns the previous one, if any.
pub fn set_default_client(client: Client) -> Option<Client> {
    DEFAULT_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(client)
}

/// Discard the default blocking client and release its session.
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

/// [`Client::get_secret`] on the default blocking client.
pub fn get_secret(token: &str, cache_ttl: Option<Duration>) -> Result<String> {
    default_client()?.get_secret(token, cache_ttl)
}

/// [`Client::get_env`] on the default blocking client.
pub fn get_env(token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
    default_client()?.get_env(token, cache_ttl)
}

/// [`Client::load_env`] on the default blocking client.
pub fn load_env(token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
    default_client()?.load_env(token, cache_ttl)
}

/// [`Client::proxy`] on the default blocking client.
pub fn proxy(token: &str, request: impl Into<ProxyRequest>) -> Result<Value> {
    default_client()?.proxy(token, request)
}

/// [`Client::chat_completion`] on the default blocking client.
pub fn chat(token: &str, request: ChatCompletionRequest) -> Result<Value> {
    default_client()?.chat_completion(token, request)
}

/// [`Client::invalidate_cache`] on the default blocking client.
///
/// Does nothing when no default client exists yet.
pub fn invalidate_cache(token: Option<&str>) {
    if let Some(client) = current() {
        client.invalidate_cache(token);
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
