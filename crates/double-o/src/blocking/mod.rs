//! Blocking client for thread-based programs
//!
//! [`Client`] has the same operations and semantics as the async
//! [`crate::Client`], but every call blocks the current thread. It is `Send +
//! Sync` and cheap to clone, so any number of threads can share one instance.
//! The response cache is a [`ResponseCache`] guarded by a blocking mutex that
//! is only held for the cache operation itself, never across a request.
//!
//! Do not use it from inside an async runtime.

pub mod global;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use double_o_core::retry::{BackoffStrategy, ExponentialBackoff};
use serde_json::Value;

use crate::{
    cache::{CacheKey, CachedValue, ResponseCache},
    chat::ChatCompletionRequest,
    classify::{Endpoint, classify_env, classify_failure, classify_proxy, classify_secret},
    config::ClientConfig,
    environment::{self, EnvironmentMap},
    error::{Error, Result, TransportError},
    http::{ApiRequest, BlockingReqwestTransport, BlockingTransport, RawResponse},
    observability,
    proxy::ProxyRequest,
};

/// Blocking client for fetching secrets and proxying API calls.
///
/// # Example
///
/// ```rust,no_run
/// use double_o::blocking::Client;
/// use std::time::Duration;
///
/// # fn example() -> double_o::Result<()> {
/// let client = Client::builder().max_retries(2).build()?;
///
/// let env = client.load_env("env-token", Some(Duration::from_secs(60)))?;
/// println!("loaded {} variables", env.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn BlockingTransport>,
    cache: Arc<ResponseCache>,
    retry: ExponentialBackoff,
}

impl Client {
    /// Create a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be configured.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a new client builder for advanced configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from a configuration object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the base URL is invalid.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a client configured from `DOUBLE_O_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the base URL is invalid.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Fetch the secret identified by `token`.
    ///
    /// See [`crate::Client::get_secret`].
    pub fn get_secret(&self, token: &str, cache_ttl: Option<Duration>) -> Result<String> {
        let key = CacheKey::Secret(token.to_owned());
        if cache_ttl.is_some()
            && let Some(secret) = self.cached(&key).and_then(CachedValue::into_secret)
        {
            return Ok(secret);
        }

        let response = self.execute(Endpoint::Secret, &ApiRequest::secret(token))?;
        let secret = classify_secret(&response).inspect_err(|e| log_failure(Endpoint::Secret, e))?;

        if let Some(ttl) = cache_ttl {
            self.store(key, CachedValue::Secret(secret.clone()), ttl);
        }
        Ok(secret)
    }

    /// Fetch the environment map identified by `token`.
    ///
    /// See [`crate::Client::get_env`].
    pub fn get_env(&self, token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
        let key = CacheKey::Env(token.to_owned());
        if cache_ttl.is_some()
            && let Some(env) = self.cached(&key).and_then(CachedValue::into_env)
        {
            return Ok(env);
        }

        let response = self.execute(Endpoint::Env, &ApiRequest::env(token))?;
        let env = classify_env(&response).inspect_err(|e| log_failure(Endpoint::Env, e))?;

        if let Some(ttl) = cache_ttl {
            self.store(key, CachedValue::Env(env.clone()), ttl);
        }
        Ok(env)
    }

    /// Fetch the environment map and write it into the process environment.
    ///
    /// See [`crate::Client::load_env`].
    pub fn load_env(&self, token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
        let env = self.get_env(token, cache_ttl)?;
        environment::install(&env)?;
        Ok(env)
    }

    /// Forward an API call through the proxy.
    ///
    /// See [`crate::Client::proxy`].
    pub fn proxy(&self, token: &str, request: impl Into<ProxyRequest>) -> Result<Value> {
        let request = request.into().into_api_request(token);
        let response = self.execute(Endpoint::Proxy, &request)?;
        classify_proxy(&response).inspect_err(|e| log_failure(Endpoint::Proxy, e))
    }

    /// Send a chat completion through the proxy.
    ///
    /// See [`crate::Client::chat_completion`].
    pub fn chat_completion(&self, token: &str, request: ChatCompletionRequest) -> Result<Value> {
        self.proxy(token, request.into_proxy_request()?)
    }

    /// Drop one token's cached responses, or all of them with `None`.
    pub fn invalidate_cache(&self, token: Option<&str>) {
        match token {
            Some(token) => {
                self.inner.cache.invalidate(&CacheKey::Secret(token.to_owned()));
                self.inner.cache.invalidate(&CacheKey::Env(token.to_owned()));
            }
            None => self.inner.cache.clear(),
        }
    }

    /// Release the HTTP session. The next request opens a new one.
    pub fn close(&self) {
        self.inner.transport.close();
    }

    /// The response cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.inner.cache
    }

    /// The retry policy applied to every request.
    pub fn retry_policy(&self) -> &ExponentialBackoff {
        &self.inner.retry
    }

    fn cached(&self, key: &CacheKey) -> Option<CachedValue> {
        let value = self.inner.cache.get(key);
        if value.is_some() {
            observability::log_cache_hit(key.namespace());
        } else {
            observability::log_cache_miss(key.namespace());
        }
        value
    }

    fn store(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        observability::log_cache_write(key.namespace(), ttl);
        self.inner.cache.set(key, value, ttl);
    }

    fn execute(&self, endpoint: Endpoint, request: &ApiRequest) -> Result<RawResponse> {
        self.inner
            .retry
            .execute_blocking(|| {
                let response = self.inner.transport.send(request)?;
                if response.is_server_error() {
                    return Err(TransportError::Status {
                        status: response.status(),
                        body: response.body().to_string(),
                    });
                }
                Ok(response)
            })
            .map_err(|failure| {
                let error = classify_failure(endpoint, failure);
                log_failure(endpoint, &error);
                error
            })
    }
}

fn log_failure(endpoint: Endpoint, error: &Error) {
    observability::log_classified_error(endpoint.name(), error);
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::Client")
            .field("retry", &self.inner.retry)
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a configured blocking [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    cache: Option<Arc<ResponseCache>>,
    transport: Option<Arc<dyn BlockingTransport>>,
    retry: Option<ExponentialBackoff>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::ClientBuilder")
            .field("config", &self.config)
            .field("shared_cache", &self.cache.is_some())
            .field("custom_transport", &self.transport.is_some())
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the backoff factor (delay before the first retry).
    pub fn backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.config.backoff_factor = backoff_factor;
        self
    }

    /// Set the upper bound of the random jitter added to backoff waits.
    pub fn retry_jitter(mut self, jitter: Duration) -> Self {
        self.config.retry_jitter = jitter;
        self
    }

    /// Add a default header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let (key, value) = crate::http::parse_header(key, value)?;
        self.config.default_headers.insert(key, value);
        Ok(self)
    }

    /// Share `cache` with other blocking clients.
    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Send requests through `transport` instead of the default HTTP client.
    pub fn transport(mut self, transport: Arc<dyn BlockingTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the retry policy derived from the configuration.
    pub fn retry_policy(mut self, retry: ExponentialBackoff) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if no transport was supplied and the
    /// base URL is invalid.
    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(BlockingReqwestTransport::new(&self.config)?),
        };
        let retry = self.retry.unwrap_or_else(|| self.config.retry_policy());

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                cache: self.cache.unwrap_or_default(),
                retry,
            }),
        })
    }
}
