//! Async client for the double-o service

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use double_o_core::retry::{BackoffStrategy, ExponentialBackoff};
use serde_json::Value;

use crate::{
    cache::{AsyncResponseCache, CacheKey, CachedValue},
    chat::ChatCompletionRequest,
    classify::{Endpoint, classify_env, classify_failure, classify_proxy, classify_secret},
    config::ClientConfig,
    environment::{self, EnvironmentMap},
    error::{Error, Result, TransportError},
    http::{ApiRequest, RawResponse, ReqwestTransport, Transport},
    observability,
    proxy::ProxyRequest,
};

/// Async client for fetching secrets and proxying API calls.
///
/// Cloning is cheap; clones share the HTTP session and the response cache.
/// Every operation follows the same path: optional cache lookup, the request
/// under the configured retry policy, classification, optional cache write.
/// The cache lock is never held while a request is in flight.
///
/// # Example
///
/// ```rust,no_run
/// use double_o::Client;
/// use std::time::Duration;
///
/// # async fn example() -> double_o::Result<()> {
/// let client = Client::builder().max_retries(2).build()?;
///
/// // Cached for five minutes; a second call within that window makes no request
/// let api_key = client
///     .get_secret("sk-token", Some(Duration::from_secs(300)))
///     .await?;
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    cache: Arc<AsyncResponseCache>,
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
    /// With `cache_ttl`, a live cached value is returned without a request,
    /// and a fetched value is cached for that long. Without it the cache is
    /// neither read nor written.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the token is rejected
    /// - [`Error::Secret`] for upstream errors, malformed responses, and
    ///   transport failures that outlast the retry budget
    pub async fn get_secret(&self, token: &str, cache_ttl: Option<Duration>) -> Result<String> {
        let key = CacheKey::Secret(token.to_owned());
        if cache_ttl.is_some()
            && let Some(secret) = self.cached(&key).await.and_then(CachedValue::into_secret)
        {
            return Ok(secret);
        }

        let response = self.execute(Endpoint::Secret, &ApiRequest::secret(token)).await?;
        let secret = classify_secret(&response).inspect_err(|e| log_failure(Endpoint::Secret, e))?;

        if let Some(ttl) = cache_ttl {
            self.store(key, CachedValue::Secret(secret.clone()), ttl).await;
        }
        Ok(secret)
    }

    /// Fetch the environment map identified by `token`.
    ///
    /// Caching works as for [`get_secret`](Self::get_secret), in a separate
    /// namespace.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the token is rejected
    /// - [`Error::Env`] for upstream errors, malformed responses, and
    ///   transport failures that outlast the retry budget
    pub async fn get_env(&self, token: &str, cache_ttl: Option<Duration>) -> Result<EnvironmentMap> {
        let key = CacheKey::Env(token.to_owned());
        if cache_ttl.is_some()
            && let Some(env) = self.cached(&key).await.and_then(CachedValue::into_env)
        {
            return Ok(env);
        }

        let response = self.execute(Endpoint::Env, &ApiRequest::env(token)).await?;
        let env = classify_env(&response).inspect_err(|e| log_failure(Endpoint::Env, e))?;

        if let Some(ttl) = cache_ttl {
            self.store(key, CachedValue::Env(env.clone()), ttl).await;
        }
        Ok(env)
    }

    /// Fetch the environment map and write it into the process environment,
    /// overwriting variables of the same name.
    ///
    /// Meant for start-up code: the process environment is global state and
    /// other threads may be reading it.
    ///
    /// # Errors
    ///
    /// Same as [`get_env`](Self::get_env), plus [`Error::Env`] if a returned
    /// name or value cannot be stored in the environment.
    pub async fn load_env(
        &self,
        token: &str,
        cache_ttl: Option<Duration>,
    ) -> Result<EnvironmentMap> {
        let env = self.get_env(token, cache_ttl).await?;
        environment::install(&env)?;
        Ok(env)
    }

    /// Forward an API call through the proxy. Responses are never cached.
    ///
    /// A 2xx JSON body is returned unchanged, including any `error` field it
    /// carries.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the proxy token is rejected (HTTP 401)
    /// - [`Error::Proxy`] for other non-2xx statuses, bodies that are not JSON,
    ///   and transport failures that outlast the retry budget
    pub async fn proxy(&self, token: &str, request: impl Into<ProxyRequest>) -> Result<Value> {
        let request = request.into().into_api_request(token);
        let response = self.execute(Endpoint::Proxy, &request).await?;
        classify_proxy(&response).inspect_err(|e| log_failure(Endpoint::Proxy, e))
    }

    /// Send a chat completion through the proxy (`v1/chat/completions`).
    ///
    /// # Errors
    ///
    /// Same as [`proxy`](Self::proxy).
    pub async fn chat_completion(
        &self,
        token: &str,
        request: ChatCompletionRequest,
    ) -> Result<Value> {
        self.proxy(token, request.into_proxy_request()?).await
    }

    /// Drop cached responses.
    ///
    /// With a token, only that token's secret and environment entries are
    /// removed; with `None`, the whole cache is cleared.
    pub async fn invalidate_cache(&self, token: Option<&str>) {
        match token {
            Some(token) => {
                self.inner
                    .cache
                    .invalidate(&CacheKey::Secret(token.to_owned()))
                    .await;
                self.inner
                    .cache
                    .invalidate(&CacheKey::Env(token.to_owned()))
                    .await;
            }
            None => self.inner.cache.clear().await,
        }
    }

    /// Release the HTTP session. The next request opens a new one.
    pub fn close(&self) {
        self.inner.transport.close();
    }

    /// The response cache (shared with clones and any client built with it).
    pub fn cache(&self) -> &Arc<AsyncResponseCache> {
        &self.inner.cache
    }

    /// The retry policy applied to every request.
    pub fn retry_policy(&self) -> &ExponentialBackoff {
        &self.inner.retry
    }

    async fn cached(&self, key: &CacheKey) -> Option<CachedValue> {
        let value = self.inner.cache.get(key).await;
        if value.is_some() {
            observability::log_cache_hit(key.namespace());
        } else {
            observability::log_cache_miss(key.namespace());
        }
        value
    }

    async fn store(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        observability::log_cache_write(key.namespace(), ttl);
        self.inner.cache.set(key, value, ttl).await;
    }

    /// Send `request` under the retry policy.
    ///
    /// 5xx responses are turned into retryable failures; every other status
    /// is handed back for classification.
    async fn execute(&self, endpoint: Endpoint, request: &ApiRequest) -> Result<RawResponse> {
        let transport = &self.inner.transport;
        self.inner
            .retry
            .execute(|| async move {
                let response = transport.send(request).await?;
                if response.is_server_error() {
                    return Err(TransportError::Status {
                        status: response.status(),
                        body: response.body().to_string(),
                    });
                }
                Ok(response)
            })
            .await
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
        f.debug_struct("Client")
            .field("retry", &self.inner.retry)
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a configured [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    cache: Option<Arc<AsyncResponseCache>>,
    transport: Option<Arc<dyn Transport>>,
    retry: Option<ExponentialBackoff>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
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

    /// Share `cache` with other clients instead of creating a private one.
    pub fn cache(mut self, cache: Arc<AsyncResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Send requests through `transport` instead of the default HTTP client.
    ///
    /// The base URL, timeout and default headers of the configuration are
    /// then the transport's concern.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
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
            None => Arc::new(ReqwestTransport::new(&self.config)?),
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
