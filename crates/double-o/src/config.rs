//! Configuration for the double-o client

use crate::error::{Error, Result, TransportError};
use double_o_core::retry::ExponentialBackoff;
use http::HeaderMap;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_millis(500);
const DEFAULT_RETRY_JITTER: Duration = Duration::from_millis(100);

/// Configuration for the double-o client.
///
/// Shared by the async [`Client`](crate::Client) and the blocking client.
/// Retries are off by default: a failed request is reported after one attempt
/// unless `max_retries` is raised.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service. `None` means [`DEFAULT_BASE_URL`](crate::DEFAULT_BASE_URL).
    pub base_url: Option<String>,

    /// Timeout applied to each HTTP attempt
    pub timeout: Duration,

    /// Number of retries after the first attempt (0 disables retrying)
    pub max_retries: u32,

    /// Delay before the first retry; doubled for every further retry
    pub backoff_factor: Duration,

    /// Upper bound of the random delay added to every backoff wait
    pub retry_jitter: Duration,

    /// Custom headers to include with every request
    pub default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            retry_jitter: DEFAULT_RETRY_JITTER,
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration pointing at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Start a fluent builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `DOUBLE_O_BASE_URL` for the service base URL
    /// - `DOUBLE_O_TIMEOUT` for the request timeout (in seconds)
    /// - `DOUBLE_O_RETRIES` for the number of retries
    /// - `DOUBLE_O_BACKOFF_FACTOR` for the backoff factor (in seconds, fractional)
    ///
    /// Unset variables keep their defaults. A variable that is set but cannot
    /// be parsed is reported as [`Error::MissingConfig`].
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        use std::env;

        let mut config = Self::default();

        if let Ok(base_url) = env::var("DOUBLE_O_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config.base_url = Some(base_url);
        }

        if let Ok(timeout) = env::var("DOUBLE_O_TIMEOUT") {
            config.timeout = parse_seconds("DOUBLE_O_TIMEOUT", &timeout)?;
        }

        if let Ok(retries) = env::var("DOUBLE_O_RETRIES") {
            config.max_retries = retries.trim().parse::<u32>().map_err(|_| {
                Error::MissingConfig(format!(
                    "DOUBLE_O_RETRIES must be a non-negative integer, got {retries:?}"
                ))
            })?;
        }

        if let Ok(backoff) = env::var("DOUBLE_O_BACKOFF_FACTOR") {
            config.backoff_factor = parse_seconds("DOUBLE_O_BACKOFF_FACTOR", &backoff)?;
        }

        Ok(config)
    }

    /// Load a `.env` file from the current directory (if any) into the
    /// process environment, then read the configuration with
    /// [`from_env`](Self::from_env).
    #[cfg(feature = "env")]
    pub fn from_dotenv() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(Error::MissingConfig(format!("failed to load .env: {err}"))),
        }
        Self::from_env()
    }

    /// Merge this configuration with another, with the other taking precedence.
    ///
    /// Fields of `other` still at their default value do not override.
    pub fn merge(mut self, other: ClientConfig) -> Self {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout != DEFAULT_TIMEOUT {
            self.timeout = other.timeout;
        }
        if other.max_retries != DEFAULT_MAX_RETRIES {
            self.max_retries = other.max_retries;
        }
        if other.backoff_factor != DEFAULT_BACKOFF_FACTOR {
            self.backoff_factor = other.backoff_factor;
        }
        if other.retry_jitter != DEFAULT_RETRY_JITTER {
            self.retry_jitter = other.retry_jitter;
        }
        for (key, value) in other.default_headers.iter() {
            self.default_headers.insert(key.clone(), value.clone());
        }

        self
    }

    /// The validated base URL, always ending in `/` so relative endpoint
    /// paths join beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for an empty or unparseable URL, or one
    /// whose scheme is not `http`/`https`.
    pub fn resolved_base_url(&self) -> Result<Url> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or(crate::DEFAULT_BASE_URL)
            .trim();

        if raw.is_empty() {
            return Err(Error::InvalidUrl("base URL is empty".to_string()));
        }

        let mut url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{raw}: scheme must be http or https"
            )));
        }
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{raw}: cannot be used as a base")));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(url)
    }

    /// The retry policy described by this configuration.
    ///
    /// Only transport failures that [`TransportError::is_retryable`] accepts
    /// are retried.
    pub fn retry_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .max_retries(self.max_retries)
            .initial_delay(self.backoff_factor)
            .multiplier(2.0)
            .jitter(self.retry_jitter)
            .retry_if(|err| {
                err.downcast_ref::<TransportError>()
                    .is_some_and(TransportError::is_retryable)
            })
            .build()
    }
}

#[cfg(feature = "env")]
fn parse_seconds(name: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| {
            Error::MissingConfig(format!(
                "{name} must be a non-negative number of seconds, got {raw:?}"
            ))
        })
}

/// Builder for creating ClientConfig with a fluent API.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
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

    /// Add a default header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid according to HTTP specifications.
    pub fn default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> crate::Result<Self> {
        let (key, value) = crate::http::parse_header(key, value)?;
        self.config.default_headers.insert(key, value);
        Ok(self)
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
