//! Cache keys and values shared by both clients.
//!
//! Secrets and environment maps live in one cache. Keys are namespaced by
//! type, so a secret token and an environment token with the same text can
//! never collide.

use crate::environment::EnvironmentMap;
use double_o_core::cache::{AsyncTtlCache, TtlCache};

/// Key of a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Secret fetched with this token.
    Secret(String),
    /// Environment map fetched with this token.
    Env(String),
}

impl CacheKey {
    /// The namespace, for logging. Never includes the token.
    pub fn namespace(&self) -> &'static str {
        match self {
            CacheKey::Secret(_) => "secret",
            CacheKey::Env(_) => "env",
        }
    }
}

/// A cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// A secret value.
    Secret(String),
    /// An environment map.
    Env(EnvironmentMap),
}

impl CachedValue {
    /// The secret, if this is one.
    pub fn into_secret(self) -> Option<String> {
        match self {
            CachedValue::Secret(value) => Some(value),
            CachedValue::Env(_) => None,
        }
    }

    /// The environment map, if this is one.
    pub fn into_env(self) -> Option<EnvironmentMap> {
        match self {
            CachedValue::Env(map) => Some(map),
            CachedValue::Secret(_) => None,
        }
    }
}

/// Cache used by the async client.
pub type AsyncResponseCache = AsyncTtlCache<CacheKey, CachedValue>;

/// Cache used by the blocking client.
pub type ResponseCache = TtlCache<CacheKey, CachedValue>;
