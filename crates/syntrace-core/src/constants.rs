/// The maximum time-to-live value allowed.
///
/// The IP `ttl` is an u8 (0..255) but since a `ttl` of zero isn't useful we only allow 254 distinct
/// hops (1..255).
pub const MAX_TTL: u8 = 254;

/// The maximum number of copies of a probe which may be sent for a single hop.
pub const MAX_PROBES_PER_HOP: u8 = 10;

/// The maximum _starting_ `TCP` sequence number chosen when none is configured.
pub const MAX_RANDOM_INITIAL_SEQUENCE: u32 = 1000;

/// The size of the buffer used to receive `ICMP` datagrams.
pub const MAX_PACKET_SIZE: usize = 1024;
