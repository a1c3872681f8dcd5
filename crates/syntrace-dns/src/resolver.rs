use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use thiserror::Error;

/// A DNS resolver.
pub trait Resolver {
    /// Perform a blocking DNS hostname lookup and return the resolved `IPv4` addresses.
    fn lookup(&self, hostname: impl AsRef<str>) -> Result<ResolvedIpAddrs>;

    /// Perform a blocking reverse DNS lookup of `IpAddr` and return a `DnsEntry`.
    ///
    /// A failed lookup is reported in the returned `DnsEntry` rather than as an error.
    #[must_use]
    fn reverse_lookup(&self, addr: impl Into<IpAddr>) -> DnsEntry;
}

/// A DNS resolver error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A DNS resolver error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("DNS lookup failed")]
    LookupFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// The output of a successful DNS lookup.
#[derive(Debug, Clone, Default)]
pub struct ResolvedIpAddrs(pub(super) Vec<IpAddr>);

impl ResolvedIpAddrs {
    pub fn iter(&self) -> impl Iterator<Item = &'_ IpAddr> {
        self.0.iter()
    }

    /// The first resolved address, if any.
    #[must_use]
    pub fn first(&self) -> Option<IpAddr> {
        self.0.first().copied()
    }
}

impl IntoIterator for ResolvedIpAddrs {
    type Item = IpAddr;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<IpAddr> for ResolvedIpAddrs {
    fn from_iter<T: IntoIterator<Item = IpAddr>>(iter: T) -> Self {
        Self(iter.into_iter().filter(IpAddr::is_ipv4).collect())
    }
}

/// The state of reverse DNS resolution.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DnsEntry {
    /// The reverse DNS resolution of `IpAddr` has resolved.
    Resolved(Resolved),
    /// The `IpAddr` could not be resolved.
    NotFound(Unresolved),
    /// The reverse DNS resolution of `IpAddr` failed.
    Failed(IpAddr),
    /// The reverse DNS resolution of `IpAddr` timed out.
    Timeout(IpAddr),
}

/// The resolved hostnames of a `DnsEntry`.
#[derive(Debug, Clone)]
pub struct ResolvedHostnames<'a>(pub(super) std::slice::Iter<'a, String>);

impl<'a> Iterator for ResolvedHostnames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(String::as_str)
    }
}

impl DnsEntry {
    /// The resolved hostnames.
    #[must_use]
    pub fn hostnames(&self) -> ResolvedHostnames<'_> {
        match self {
            Self::Resolved(Resolved(_, hosts)) => ResolvedHostnames(hosts.iter()),
            Self::NotFound(_) | Self::Failed(_) | Self::Timeout(_) =>
            {
                #[expect(clippy::iter_on_empty_collections)]
                ResolvedHostnames([].iter())
            }
        }
    }

    /// The address this entry is for.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        match self {
            Self::Resolved(Resolved(addr, _))
            | Self::NotFound(Unresolved(addr))
            | Self::Failed(addr)
            | Self::Timeout(addr) => *addr,
        }
    }
}

/// A resolved `IpAddr` and its hostnames.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resolved(pub IpAddr, pub Vec<String>);

/// An `IpAddr` with no matching records.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Unresolved(pub IpAddr);

impl Display for DnsEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(Resolved(_, hosts)) => write!(f, "{}", hosts.join(" ")),
            Self::NotFound(Unresolved(ip)) => write!(f, "{ip}"),
            Self::Timeout(ip) => write!(f, "Timeout: {ip}"),
            Self::Failed(ip) => write!(f, "Failed: {ip}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;
    use std::str::FromStr;

    #[test]
    fn test_iterator_returns_each_hostname_once() -> anyhow::Result<()> {
        let entry = DnsEntry::Resolved(Resolved(
            IpAddr::from_str("10.0.0.1")?,
            vec![String::from("gw.lan"), String::from("router.lan")],
        ));
        let hostnames = entry.hostnames().collect::<Vec<_>>();
        assert_eq!(vec!["gw.lan", "router.lan"], hostnames);
        Ok(())
    }

    #[test]
    fn test_unresolved_has_no_hostnames() -> anyhow::Result<()> {
        let addr = IpAddr::from_str("10.0.0.1")?;
        assert_eq!(None, DnsEntry::NotFound(Unresolved(addr)).hostnames().next());
        assert_eq!(None, DnsEntry::Failed(addr).hostnames().next());
        assert_eq!(None, DnsEntry::Timeout(addr).hostnames().next());
        assert_eq!(addr, DnsEntry::Timeout(addr).addr());
        Ok(())
    }

    #[test]
    fn test_display() -> anyhow::Result<()> {
        let addr = IpAddr::from_str("10.0.0.1")?;
        let resolved = DnsEntry::Resolved(Resolved(addr, vec![String::from("gw.lan")]));
        assert_eq!("gw.lan", resolved.to_string());
        assert_eq!("10.0.0.1", DnsEntry::NotFound(Unresolved(addr)).to_string());
        assert_eq!("Failed: 10.0.0.1", DnsEntry::Failed(addr).to_string());
        assert_eq!("Timeout: 10.0.0.1", DnsEntry::Timeout(addr).to_string());
        Ok(())
    }

    #[test]
    fn test_resolved_addrs_ipv4_only() -> anyhow::Result<()> {
        let addrs = [
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::from_str("1.1.1.1")?,
            IpAddr::from_str("1.0.0.1")?,
        ];
        let resolved = addrs.into_iter().collect::<ResolvedIpAddrs>();
        assert_eq!(Some(IpAddr::from_str("1.1.1.1")?), resolved.first());
        assert_eq!(2, resolved.iter().count());
        Ok(())
    }
}
