use crate::ResolveMethod;
use std::time::Duration;

/// A builder for DNS `Config`.
///
/// # Example
///
/// Build a DNS `Config` which resolves using the Cloudflare `1.1.1.1` DNS service.
///
/// ```no_run
/// use std::time::Duration;
/// use syntrace_dns::{Builder, ResolveMethod};
///
/// let config = Builder::new()
///     .resolve_method(ResolveMethod::Cloudflare)
///     .timeout(Duration::from_secs(2))
///     .build();
/// ```
#[derive(Debug)]
pub struct Builder {
    resolve_method: ResolveMethod,
    timeout: Duration,
    ttl: Duration,
}

impl Builder {
    /// Create a new `Builder`.
    #[must_use]
    pub fn new() -> Self {
        let config = Config::default();
        Self {
            resolve_method: config.resolve_method,
            timeout: config.timeout,
            ttl: config.ttl,
        }
    }

    /// Set the method to use for DNS resolution.
    #[must_use]
    pub const fn resolve_method(self, resolve_method: ResolveMethod) -> Self {
        Self {
            resolve_method,
            ..self
        }
    }

    /// Set the timeout for DNS resolution.
    #[must_use]
    pub const fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Set the time-to-live (TTL) for reverse DNS cache entries.
    #[must_use]
    pub const fn ttl(self, ttl: Duration) -> Self {
        Self { ttl, ..self }
    }

    /// Build the DNS `Config`.
    #[must_use]
    pub const fn build(self) -> Config {
        Config {
            resolve_method: self.resolve_method,
            timeout: self.timeout,
            ttl: self.ttl,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the `DnsResolver`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    /// The method to use for DNS resolution.
    pub resolve_method: ResolveMethod,
    /// The timeout for DNS resolution.
    pub timeout: Duration,
    /// The time-to-live (TTL) for reverse DNS cache entries.
    pub ttl: Duration,
}

impl Config {
    /// Create a `Config`.
    #[must_use]
    pub const fn new(resolve_method: ResolveMethod, timeout: Duration, ttl: Duration) -> Self {
        Self {
            resolve_method,
            timeout,
            ttl,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolve_method: ResolveMethod::System,
            timeout: Duration::from_millis(5000),
            ttl: Duration::from_secs(300),
        }
    }
}
