use crate::types::{Port, Sequence, TimeToLive};
use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime};
use syntrace_packet::IpProtocol;

/// A single TCP SYN probe.
///
/// The `ttl`, `sequence`, `src_port` and `dest_port` together identify the hop the probe was sent
/// for.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Probe {
    /// The TTL of the probe.
    pub ttl: TimeToLive,
    /// The `TCP` sequence number.
    pub sequence: Sequence,
    /// The `TCP` source port.
    pub src_port: Port,
    /// The `TCP` destination port, also the port the hop listener is bound to.
    pub dest_port: Port,
    /// The `IPv4` identification, chosen at random for each probe.
    pub identification: u16,
    /// Timestamp when the probe was sent.
    pub sent: SystemTime,
}

impl Probe {
    #[must_use]
    pub const fn new(
        ttl: TimeToLive,
        sequence: Sequence,
        src_port: Port,
        dest_port: Port,
        identification: u16,
        sent: SystemTime,
    ) -> Self {
        Self {
            ttl,
            sequence,
            src_port,
            dest_port,
            identification,
            sent,
        }
    }
}

/// The type of an `ICMP` response.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IcmpPacketType(pub u8);

/// The code of an `ICMP` response.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IcmpPacketCode(pub u8);

/// An `IPv4/ICMP` datagram received in response to a probe.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ReceivedDatagram {
    /// The source address of the `IPv4` header.
    pub addr: Ipv4Addr,
    /// The protocol of the `IPv4` header.
    pub protocol: IpProtocol,
    pub icmp_type: IcmpPacketType,
    pub icmp_code: IcmpPacketCode,
    /// Timestamp when the datagram was received.
    pub received: SystemTime,
}

impl ReceivedDatagram {
    #[must_use]
    pub const fn new(
        addr: Ipv4Addr,
        protocol: IpProtocol,
        icmp_type: IcmpPacketType,
        icmp_code: IcmpPacketCode,
        received: SystemTime,
    ) -> Self {
        Self {
            addr,
            protocol,
            icmp_type,
            icmp_code,
            received,
        }
    }

    /// Classify the datagram.
    ///
    /// Only a destination port unreachable (type 3, code 3) is treated as coming from the target,
    /// every other `ICMP` message is from an intermediate hop.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        match (self.icmp_type, self.icmp_code) {
            (IcmpPacketType(3), IcmpPacketCode(3)) => Classification::PortUnreachable,
            _ => Classification::IntermediateHop,
        }
    }
}

/// The classification of a received datagram.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Classification {
    /// The target has no listener on the probe destination port.
    PortUnreachable,
    /// A router on the path responded, most commonly with a TTL exceeded in transit.
    IntermediateHop,
}

/// The response to a hop.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HopResponse {
    /// The responding host.
    pub addr: Ipv4Addr,
    /// The hostname of the responding host, or the numeric address if it could not be resolved.
    pub hostname: String,
    /// The round trip time from sending the probe to receiving the response.
    pub rtt: Duration,
    pub classification: Classification,
}

/// The outcome of a single hop.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HopResult {
    /// The probe sent for this hop.
    pub probe: Probe,
    /// The response, if any was received.
    pub response: Option<HopResponse>,
    /// The state the hop ended in.
    pub state: HopState,
}

impl HopResult {
    /// The TTL of the hop.
    #[must_use]
    pub const fn ttl(&self) -> TimeToLive {
        self.probe.ttl
    }
}

/// The state of the hop state machine.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HopState {
    /// A probe with the given ttl is in flight.
    Probing(TimeToLive),
    /// A response was received from an intermediate hop.
    HopAnswered,
    /// No usable response was received within the read timeout.
    HopTimedOut,
    /// The trace is complete.
    Finished(CompletionReason),
}

/// The reason a trace completed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CompletionReason {
    /// The target responded with `ICMP` destination port unreachable.
    PortUnreachable,
    /// A response was received from the target address.
    AddressMatch,
    /// A response was received but the round trip time exceeded the hop timeout.
    Timeout,
    /// The ttl exceeded the maximum number of hops.
    MaxHopsReached,
}
