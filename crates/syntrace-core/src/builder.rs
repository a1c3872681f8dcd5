use crate::config::{defaults, SessionConfig};
use crate::constants::{MAX_PROBES_PER_HOP, MAX_RANDOM_INITIAL_SEQUENCE, MAX_TTL};
use crate::error::{Error, Result};
use crate::types::{Port, ProbesPerHop, Sequence, TimeToLive};
use crate::Tracer;
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Build a tracer.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use std::time::Duration;
/// use syntrace_core::Builder;
///
/// let addr = std::net::IpAddr::from([1, 2, 3, 4]);
/// let tracer = Builder::new(addr)
///     .max_hops(16)
///     .hop_timeout(Duration::from_secs(2))
///     .probes_per_hop(1)
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// # See Also
///
/// - [`Tracer`] - A TCP SYN traceroute implementation.
#[derive(Debug)]
pub struct Builder {
    interface: Option<String>,
    source_addr: Option<IpAddr>,
    target_addr: IpAddr,
    max_hops: u8,
    hop_timeout: Duration,
    read_timeout: Option<Duration>,
    probes_per_hop: u8,
    initial_sequence: Option<u32>,
    source_port: u16,
    dest_port: Option<u16>,
    reverse_dns: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            interface: None,
            source_addr: None,
            target_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_hops: defaults::DEFAULT_MAX_HOPS,
            hop_timeout: defaults::DEFAULT_HOP_TIMEOUT,
            read_timeout: None,
            probes_per_hop: defaults::DEFAULT_PROBES_PER_HOP,
            initial_sequence: None,
            source_port: defaults::DEFAULT_SOURCE_PORT,
            dest_port: None,
            reverse_dns: defaults::DEFAULT_REVERSE_DNS,
        }
    }
}

impl Builder {
    /// Build a tracer builder for a given target.
    #[must_use]
    pub fn new(target_addr: IpAddr) -> Self {
        Self {
            target_addr,
            ..Default::default()
        }
    }

    /// Set the source address.
    ///
    /// If not set then the source address will be discovered based on the target address and
    /// the interface.
    #[must_use]
    pub fn source_addr(self, source_addr: Option<IpAddr>) -> Self {
        Self {
            source_addr,
            ..self
        }
    }

    /// Set the source interface.
    ///
    /// If the source interface is provided it will be used to look up the IPv4 source address.
    #[must_use]
    pub fn interface<S: Into<String>>(self, interface: Option<S>) -> Self {
        Self {
            interface: interface.map(Into::into),
            ..self
        }
    }

    /// Set the maximum number of hops (the largest ttl probed).
    #[must_use]
    pub fn max_hops(self, max_hops: u8) -> Self {
        Self { max_hops, ..self }
    }

    /// Set the hop timeout.
    ///
    /// A response which arrives after this much time has elapsed ends the trace.
    #[must_use]
    pub fn hop_timeout(self, hop_timeout: Duration) -> Self {
        Self {
            hop_timeout,
            ..self
        }
    }

    /// Set how long to wait for a response for each hop.
    ///
    /// Defaults to the hop timeout if not set.
    #[must_use]
    pub fn read_timeout(self, read_timeout: Option<Duration>) -> Self {
        Self {
            read_timeout,
            ..self
        }
    }

    /// Set the number of copies of the probe sent for each hop.
    #[must_use]
    pub fn probes_per_hop(self, probes_per_hop: u8) -> Self {
        Self {
            probes_per_hop,
            ..self
        }
    }

    /// Set the initial `TCP` sequence number.
    ///
    /// A random sequence number between 0 and 1000 is chosen if not set.
    #[must_use]
    pub fn initial_sequence(self, initial_sequence: Option<u32>) -> Self {
        Self {
            initial_sequence,
            ..self
        }
    }

    /// Set the `TCP` source port of the first hop.
    #[must_use]
    pub fn source_port(self, source_port: u16) -> Self {
        Self {
            source_port,
            ..self
        }
    }

    /// Set the `TCP` destination port of the first hop.
    ///
    /// If not set a random port from `33434` to `33434 + max_hops + probes_per_hop - 1` is
    /// chosen.
    #[must_use]
    pub fn dest_port(self, dest_port: Option<u16>) -> Self {
        Self { dest_port, ..self }
    }

    /// Reverse resolve the address of each responding host.
    #[must_use]
    pub fn reverse_dns(self, reverse_dns: bool) -> Self {
        Self {
            reverse_dns,
            ..self
        }
    }

    /// Build the `Tracer`.
    pub fn build(self) -> Result<Tracer> {
        let IpAddr::V4(target_addr) = self.target_addr else {
            return Err(Error::UnsupportedAddr(self.target_addr));
        };
        let source_addr = match self.source_addr {
            None => None,
            Some(IpAddr::V4(addr)) => Some(addr),
            Some(addr) => return Err(Error::UnsupportedAddr(addr)),
        };
        if !(1..=MAX_TTL).contains(&self.max_hops) {
            return Err(Error::BadConfig(format!(
                "max_hops {} must be between 1 and {MAX_TTL}",
                self.max_hops
            )));
        }
        if !(1..=MAX_PROBES_PER_HOP).contains(&self.probes_per_hop) {
            return Err(Error::BadConfig(format!(
                "probes_per_hop {} must be between 1 and {MAX_PROBES_PER_HOP}",
                self.probes_per_hop
            )));
        }
        if self.hop_timeout.is_zero() {
            return Err(Error::BadConfig(String::from("hop_timeout must be non-zero")));
        }
        let read_timeout = self.read_timeout.unwrap_or(self.hop_timeout);
        if read_timeout.is_zero() {
            return Err(Error::BadConfig(String::from("read_timeout must be non-zero")));
        }
        let dest_port = self
            .dest_port
            .unwrap_or_else(|| random_dest_port(self.max_hops, self.probes_per_hop));
        validate_port_range("source_port", self.source_port, self.max_hops)?;
        validate_port_range("dest_port", dest_port, self.max_hops)?;
        let initial_sequence = self
            .initial_sequence
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..=MAX_RANDOM_INITIAL_SEQUENCE));
        let config = SessionConfig {
            target_addr,
            max_hops: TimeToLive(self.max_hops),
            hop_timeout: self.hop_timeout,
            read_timeout,
            probes_per_hop: ProbesPerHop(self.probes_per_hop),
            initial_sequence: Sequence(initial_sequence),
            source_port: Port(self.source_port),
            dest_port: Port(dest_port),
            reverse_dns: self.reverse_dns,
        };
        tracing::debug!(?config);
        Ok(Tracer::new(config, self.interface, source_addr))
    }
}

/// Choose a random destination port above the traditional traceroute base port.
fn random_dest_port(max_hops: u8, probes_per_hop: u8) -> u16 {
    let base = defaults::DEFAULT_DEST_PORT_BASE;
    let span = (u16::from(max_hops) + u16::from(probes_per_hop)).saturating_sub(1);
    rand::thread_rng().gen_range(base..=base + span)
}

/// The port is incremented for each hop and so must not overflow over `max_hops` hops.
fn validate_port_range(name: &str, port: u16, max_hops: u8) -> Result<()> {
    if port.checked_add(u16::from(max_hops) - 1).is_none() {
        Err(Error::BadConfig(format!(
            "{name} {port} overflows over {max_hops} hops"
        )))
    } else {
        Ok(())
    }
}
