//! Mirror configuration.

/// Default number of retries before a failure is reported.
pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Default capacity of the fan-in channel between sources and dispatch.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for entity mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// How many consecutive failures are retried by resubscribing before
    /// the next one is reported to the delegate.
    pub retry_attempts: usize,

    /// Events buffered between the sources and the dispatch loop.
    pub channel_capacity: usize,
}

impl MirrorConfig {
    /// Set the retry bound.
    pub fn with_retry_attempts(mut self, n: usize) -> Self {
        self.retry_attempts = n;
        self
    }

    /// Set the fan-in channel capacity. Zero is raised to one.
    pub fn with_channel_capacity(mut self, n: usize) -> Self {
        self.channel_capacity = n.max(1);
        self
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
