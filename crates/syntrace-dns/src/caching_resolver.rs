use crate::config::Config;
use crate::resolver::{DnsEntry, ResolvedIpAddrs, Resolver, Result};
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::rc::Rc;

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolveMethod {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

impl Display for ResolveMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Resolv => write!(f, "resolv"),
            Self::Google => write!(f, "google"),
            Self::Cloudflare => write!(f, "cloudflare"),
        }
    }
}

/// A cheaply cloneable, blocking, caching, forward and reverse DNS resolver.
///
/// Only `IPv4` addresses are returned from forward lookups.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Rc<inner::DnsResolver>,
}

impl DnsResolver {
    /// Create and start a new `DnsResolver`.
    pub fn start(config: Config) -> std::io::Result<Self> {
        Ok(Self {
            inner: Rc::new(inner::DnsResolver::start(config)?),
        })
    }

    /// Get the `Config`.
    #[must_use]
    pub fn config(&self) -> &Config {
        self.inner.config()
    }

    /// Flush the cache of responses.
    pub fn flush(&self) {
        self.inner.flush();
    }
}

impl Resolver for DnsResolver {
    fn lookup(&self, hostname: impl AsRef<str>) -> Result<ResolvedIpAddrs> {
        self.inner.lookup(hostname.as_ref())
    }
    fn reverse_lookup(&self, addr: impl Into<IpAddr>) -> DnsEntry {
        self.inner.reverse_lookup(addr.into())
    }
}

/// Private impl of resolver.
mod inner {
    use super::{Config, ResolveMethod};
    use crate::resolver::{DnsEntry, Error, Resolved, ResolvedIpAddrs, Result, Unresolved};
    use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
    use hickory_resolver::error::ResolveErrorKind;
    use hickory_resolver::Resolver;
    use itertools::Itertools;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::time::{Duration, SystemTime};

    /// A cache entry for a reverse DNS lookup.
    #[derive(Debug, Clone)]
    pub(super) struct CacheEntry {
        /// The DNS entry to cache.
        pub(super) entry: DnsEntry,
        /// The timestamp of the entry.
        pub(super) timestamp: SystemTime,
    }

    impl CacheEntry {
        pub(super) const fn new(entry: DnsEntry, timestamp: SystemTime) -> Self {
            Self { entry, timestamp }
        }

        /// Can the entry be returned without a fresh lookup?
        ///
        /// Failed and timed out lookups are always retried.
        pub(super) fn is_fresh(&self, now: SystemTime, ttl: Duration) -> bool {
            match self.entry {
                DnsEntry::Resolved(_) | DnsEntry::NotFound(_) => {
                    now.duration_since(self.timestamp).unwrap_or_default() <= ttl
                }
                DnsEntry::Failed(_) | DnsEntry::Timeout(_) => false,
            }
        }
    }

    enum DnsProvider {
        Hickory(Resolver),
        DnsLookup,
    }

    /// Resolver implementation.
    pub(super) struct DnsResolver {
        config: Config,
        provider: DnsProvider,
        addr_cache: RwLock<HashMap<IpAddr, CacheEntry>>,
    }

    impl DnsResolver {
        pub(super) fn start(config: Config) -> std::io::Result<Self> {
            let provider = if matches!(config.resolve_method, ResolveMethod::System) {
                DnsProvider::DnsLookup
            } else {
                let mut options = ResolverOpts::default();
                options.timeout = config.timeout;
                options.ip_strategy = LookupIpStrategy::Ipv4Only;
                let res = match config.resolve_method {
                    ResolveMethod::Resolv => {
                        let (resolver_cfg, mut options) =
                            hickory_resolver::system_conf::read_system_conf()?;
                        options.timeout = config.timeout;
                        options.ip_strategy = LookupIpStrategy::Ipv4Only;
                        Resolver::new(resolver_cfg, options)
                    }
                    ResolveMethod::Google => Resolver::new(ResolverConfig::google(), options),
                    ResolveMethod::Cloudflare => {
                        Resolver::new(ResolverConfig::cloudflare(), options)
                    }
                    ResolveMethod::System => unreachable!(),
                }?;
                DnsProvider::Hickory(res)
            };
            Ok(Self {
                config,
                provider,
                addr_cache: RwLock::new(HashMap::new()),
            })
        }

        pub(super) const fn config(&self) -> &Config {
            &self.config
        }

        pub(super) fn lookup(&self, hostname: &str) -> Result<ResolvedIpAddrs> {
            match &self.provider {
                DnsProvider::Hickory(resolver) => Ok(resolver
                    .lookup_ip(hostname)
                    .map_err(|err| Error::LookupFailed(Box::new(err)))?
                    .iter()
                    .unique()
                    .collect()),
                DnsProvider::DnsLookup => Ok(dns_lookup::lookup_host(hostname)
                    .map_err(|err| Error::LookupFailed(Box::new(err)))?
                    .into_iter()
                    .unique()
                    .collect()),
            }
        }

        /// Return the cached entry for `addr` if it is fresh, otherwise resolve and cache it.
        pub(super) fn reverse_lookup(&self, addr: IpAddr) -> DnsEntry {
            let now = SystemTime::now();
            if let Some(cached) = self.addr_cache.read().get(&addr) {
                if cached.is_fresh(now, self.config.ttl) {
                    return cached.entry.clone();
                }
            }
            let entry = reverse_lookup(&self.provider, addr);
            self.addr_cache
                .write()
                .insert(addr, CacheEntry::new(entry.clone(), now));
            entry
        }

        pub(super) fn flush(&self) {
            self.addr_cache.write().clear();
        }
    }

    fn reverse_lookup(provider: &DnsProvider, addr: IpAddr) -> DnsEntry {
        match provider {
            DnsProvider::DnsLookup => {
                // we can't distinguish between a failed lookup or a genuine error, and so we just
                // assume all failures are `DnsEntry::NotFound`.
                match dns_lookup::lookup_addr(&addr) {
                    Ok(dns) => DnsEntry::Resolved(Resolved(addr, vec![dns])),
                    Err(_) => DnsEntry::NotFound(Unresolved(addr)),
                }
            }
            DnsProvider::Hickory(resolver) => match resolver.reverse_lookup(addr) {
                Ok(name) => {
                    let hostnames = name
                        .into_iter()
                        .map(|mut s| {
                            s.0.set_fqdn(false);
                            s.to_string()
                        })
                        .collect();
                    DnsEntry::Resolved(Resolved(addr, hostnames))
                }
                Err(err) => match err.kind() {
                    ResolveErrorKind::NoRecordsFound { .. } => {
                        DnsEntry::NotFound(Unresolved(addr))
                    }
                    ResolveErrorKind::Timeout => DnsEntry::Timeout(addr),
                    _ => DnsEntry::Failed(addr),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::inner::CacheEntry;
    use super::*;
    use crate::resolver::{Resolved, Unresolved};
    use std::net::Ipv4Addr;
    use std::time::{Duration, SystemTime};

    const ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_cache_entry_fresh_within_ttl() {
        let now = SystemTime::now();
        let entry = CacheEntry::new(
            DnsEntry::Resolved(Resolved(ADDR, vec![String::from("gw.lan")])),
            now,
        );
        assert!(entry.is_fresh(now, TTL));
        assert!(entry.is_fresh(now + TTL, TTL));
        assert!(!entry.is_fresh(now + TTL + Duration::from_secs(1), TTL));
    }

    #[test]
    fn test_cache_entry_not_found_is_cached() {
        let now = SystemTime::now();
        let entry = CacheEntry::new(DnsEntry::NotFound(Unresolved(ADDR)), now);
        assert!(entry.is_fresh(now + Duration::from_secs(1), TTL));
    }

    #[test]
    fn test_cache_entry_failures_are_retried() {
        let now = SystemTime::now();
        assert!(!CacheEntry::new(DnsEntry::Failed(ADDR), now).is_fresh(now, TTL));
        assert!(!CacheEntry::new(DnsEntry::Timeout(ADDR), now).is_fresh(now, TTL));
    }

    #[test]
    fn test_cache_entry_clock_skew() {
        let now = SystemTime::now();
        let entry = CacheEntry::new(DnsEntry::NotFound(Unresolved(ADDR)), now);
        assert!(entry.is_fresh(now - Duration::from_secs(10), TTL));
    }

    #[test]
    fn test_resolve_method_display() {
        assert_eq!("system", ResolveMethod::System.to_string());
        assert_eq!("cloudflare", ResolveMethod::Cloudflare.to_string());
    }

    #[test]
    fn test_system_resolver_start() -> anyhow::Result<()> {
        let resolver = DnsResolver::start(Config::default())?;
        assert_eq!(ResolveMethod::System, resolver.config().resolve_method);
        resolver.flush();
        Ok(())
    }
}
