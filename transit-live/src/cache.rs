//! Caching layer for idempotent procedure calls.
//!
//! Timetable procedures are idempotent: the same arguments always return
//! the same arrivals. Caching their results saves a round trip whenever a
//! query is repeated, e.g. by two screens showing the same station.
//!
//! Subscriptions and "last event" calls are never cached.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use serde_json::Value;
use tracing::trace;

use crate::connection::{Connection, ConnectionError, EventFeed};
use crate::timetable::PROCEDURE_PREFIX;

/// Cache key: (procedure, arguments serialized as JSON).
type CallKey = (String, String);

/// Configuration for the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,

    /// Only procedures starting with one of these are cached.
    pub prefixes: Vec<String>,
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Cache procedures starting with `prefix` as well.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Whether results of `procedure` may be cached.
    pub fn caches(&self, procedure: &str) -> bool {
        self.prefixes.iter().any(|p| procedure.starts_with(p.as_str()))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
            prefixes: vec![PROCEDURE_PREFIX.to_string()],
        }
    }
}

/// Connection with cached procedure results.
///
/// Wraps any [`Connection`]. Successful results of cacheable procedures
/// are kept for the configured TTL; failures are never cached.
pub struct CachedConnection<C> {
    inner: C,
    calls: MokaCache<CallKey, Value>,
    config: CacheConfig,
}

impl<C: Connection> CachedConnection<C> {
    /// Create a new cached connection.
    pub fn new(inner: C, config: &CacheConfig) -> Self {
        let calls = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            calls,
            config: config.clone(),
        }
    }

    /// Access the underlying connection.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.calls.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.calls.invalidate_all();
    }
}

impl<C: Connection> Connection for CachedConnection<C> {
    fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Value, ConnectionError>> + Send {
        async move {
            if !self.config.caches(procedure) {
                return self.inner.call(procedure, args).await;
            }

            let key = (procedure.to_string(), Value::Array(args.clone()).to_string());

            // Try cache first
            if let Some(cached) = self.calls.get(&key).await {
                trace!(procedure, "cache hit");
                return Ok(cached);
            }

            let result = self.inner.call(procedure, args).await?;
            self.calls.insert(key, result.clone()).await;

            Ok(result)
        }
    }

    fn subscribe(&self, topic: &str) -> EventFeed {
        self.inner.subscribe(topic)
    }
}
