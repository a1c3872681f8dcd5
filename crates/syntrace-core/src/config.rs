use crate::types::{Port, ProbesPerHop, Sequence, TimeToLive};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use std::time::Duration;

    /// The default value for `max-hops`.
    pub const DEFAULT_MAX_HOPS: u8 = 30;

    /// The default value for `hop-timeout`.
    pub const DEFAULT_HOP_TIMEOUT: Duration = Duration::from_millis(5000);

    /// The default value for `probes-per-hop`.
    pub const DEFAULT_PROBES_PER_HOP: u8 = 3;

    /// The default value for `source-port`.
    pub const DEFAULT_SOURCE_PORT: u16 = 55000;

    /// The lowest destination port chosen when no `dest-port` is given.
    pub const DEFAULT_DEST_PORT_BASE: u16 = 33434;

    /// The default value for `reverse-dns`.
    pub const DEFAULT_REVERSE_DNS: bool = true;
}

/// Probe session configuration.
///
/// Immutable once a trace starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SessionConfig {
    pub target_addr: Ipv4Addr,
    pub max_hops: TimeToLive,
    /// A response whose round trip time exceeds this ends the trace.
    pub hop_timeout: Duration,
    /// How long to wait for a response to each hop.
    pub read_timeout: Duration,
    pub probes_per_hop: ProbesPerHop,
    pub initial_sequence: Sequence,
    pub source_port: Port,
    pub dest_port: Port,
    /// Reverse resolve the address of each responding host.
    pub reverse_dns: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_addr: Ipv4Addr::UNSPECIFIED,
            max_hops: TimeToLive(defaults::DEFAULT_MAX_HOPS),
            hop_timeout: defaults::DEFAULT_HOP_TIMEOUT,
            read_timeout: defaults::DEFAULT_HOP_TIMEOUT,
            probes_per_hop: ProbesPerHop(defaults::DEFAULT_PROBES_PER_HOP),
            initial_sequence: Sequence(0),
            source_port: Port(defaults::DEFAULT_SOURCE_PORT),
            dest_port: Port(defaults::DEFAULT_DEST_PORT_BASE),
            reverse_dns: defaults::DEFAULT_REVERSE_DNS,
        }
    }
}

/// Tracer network channel configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelConfig {
    pub source_addr: Ipv4Addr,
    pub target_addr: Ipv4Addr,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            source_addr: Ipv4Addr::UNSPECIFIED,
            target_addr: Ipv4Addr::UNSPECIFIED,
        }
    }
}
