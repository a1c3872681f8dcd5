//! Packet wire formats used by the syntrace TCP SYN traceroute engine.
//!
//! This crate provides zero-copy views over raw byte buffers for the `IPv4`, `TCP` and `ICMPv4`
//! headers syntrace builds and parses, along with the Internet checksum functions required to
//! build them.
//!
//! Each packet type offers a `new` constructor, which wraps a mutable buffer and allows the
//! packet to be written, and a `new_view` constructor, which wraps an immutable buffer and allows
//! the packet to be read. Both fail if the supplied buffer is shorter than the minimum size of
//! the header.
//!
//! # Example
//!
//! Build a minimal `TCP` SYN header and read it back:
//!
//! ```
//! # fn main() -> anyhow::Result<()> {
//! use syntrace_packet::tcp::{TcpFlags, TcpPacket};
//!
//! let mut buf = [0_u8; TcpPacket::minimum_packet_size()];
//! let mut tcp = TcpPacket::new(&mut buf)?;
//! tcp.set_source(55000);
//! tcp.set_destination(33434);
//! tcp.set_data_offset(5);
//! tcp.set_flags(TcpFlags::SYN);
//! assert_eq!(55000, tcp.get_source());
//! assert_eq!(TcpFlags::SYN, tcp.get_flags());
//! # Ok(())
//! # }
//! ```
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![forbid(unsafe_code)]

mod buffer;

/// Packet errors.
pub mod error;

/// Functions for calculating network checksums.
pub mod checksum;

/// `ICMPv4` packets.
pub mod icmpv4;

/// `IPv4` packets.
pub mod ipv4;

/// `TCP` packets.
pub mod tcp;

/// The IP packet next layer protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Icmp => 1,
            Self::Tcp => 6,
            Self::Udp => 17,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Icmp,
            6 => Self::Tcp,
            17 => Self::Udp,
            p => Self::Other(p),
        }
    }
}

/// Format a payload as a hexadecimal string.
#[must_use]
pub fn fmt_payload(bytes: &[u8]) -> String {
    use itertools::Itertools as _;
    format!("{:02x}", bytes.iter().format(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, IpProtocol::Icmp)]
    #[test_case(6, IpProtocol::Tcp)]
    #[test_case(17, IpProtocol::Udp)]
    #[test_case(58, IpProtocol::Other(58))]
    fn test_ip_protocol(id: u8, expected: IpProtocol) {
        let protocol = IpProtocol::from(id);
        assert_eq!(expected, protocol);
        assert_eq!(id, protocol.id());
    }

    #[test]
    fn test_fmt_payload() {
        assert_eq!("45 00 00 28", fmt_payload(&[0x45, 0x00, 0x00, 0x28]));
        assert_eq!("", fmt_payload(&[]));
    }
}
