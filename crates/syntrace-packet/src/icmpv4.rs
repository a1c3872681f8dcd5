use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

/// The type of `ICMPv4` packet.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IcmpType {
    EchoReply,
    DestinationUnreachable,
    EchoRequest,
    TimeExceeded,
    Other(u8),
}

impl IcmpType {
    #[must_use]
    pub const fn id(&self) -> u8 {
        match self {
            Self::EchoReply => 0,
            Self::DestinationUnreachable => 3,
            Self::EchoRequest => 8,
            Self::TimeExceeded => 11,
            Self::Other(id) => *id,
        }
    }
}

impl From<u8> for IcmpType {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::EchoReply,
            3 => Self::DestinationUnreachable,
            8 => Self::EchoRequest,
            11 => Self::TimeExceeded,
            id => Self::Other(id),
        }
    }
}

/// The `ICMPv4` code.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct IcmpCode(pub u8);

impl From<u8> for IcmpCode {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

/// The code for `DestinationUnreachable` `ICMPv4` packet type.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IcmpDestinationUnreachableCode {
    NetUnreachable,
    HostUnreachable,
    ProtocolUnreachable,
    /// The destination host has no listener on the destination port.
    PortUnreachable,
    /// An unknown code.
    Unknown(u8),
}

impl From<IcmpCode> for IcmpDestinationUnreachableCode {
    fn from(val: IcmpCode) -> Self {
        match val {
            IcmpCode(0) => Self::NetUnreachable,
            IcmpCode(1) => Self::HostUnreachable,
            IcmpCode(2) => Self::ProtocolUnreachable,
            IcmpCode(3) => Self::PortUnreachable,
            IcmpCode(id) => Self::Unknown(id),
        }
    }
}

/// The code for `TimeExceeded` `ICMPv4` packet type.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IcmpTimeExceededCode {
    /// TTL expired in transit.
    TtlExpired,
    /// Fragment reassembly time exceeded.
    FragmentReassembly,
    /// An unknown code.
    Unknown(u8),
}

impl From<IcmpCode> for IcmpTimeExceededCode {
    fn from(val: IcmpCode) -> Self {
        match val {
            IcmpCode(0) => Self::TtlExpired,
            IcmpCode(1) => Self::FragmentReassembly,
            IcmpCode(id) => Self::Unknown(id),
        }
    }
}

const TYPE_OFFSET: usize = 0;
const CODE_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;
const REST_OF_HEADER_OFFSET: usize = 4;

/// Represents the fixed 8 byte header of an `ICMPv4` packet.
///
/// The contents of the rest of the header and of the payload (for error messages, the leading
/// bytes of the datagram which provoked the error) are exposed as raw bytes.
///
/// The internal representation is held in network byte order (big-endian) and all accessor methods
/// take and return data in host byte order, converting as necessary for the given architecture.
pub struct IcmpPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> IcmpPacket<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Mutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("IcmpPacket"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Immutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("IcmpPacket"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        8
    }

    #[must_use]
    pub fn get_icmp_type(&self) -> IcmpType {
        IcmpType::from(self.buf.read(TYPE_OFFSET))
    }

    #[must_use]
    pub fn get_icmp_code(&self) -> IcmpCode {
        IcmpCode::from(self.buf.read(CODE_OFFSET))
    }

    /// The checksum as received, it is not validated.
    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_rest_of_header(&self) -> [u8; 4] {
        self.buf.get_bytes(REST_OF_HEADER_OFFSET)
    }

    /// Is this a destination port unreachable message?
    #[must_use]
    pub fn is_port_unreachable(&self) -> bool {
        self.get_icmp_type() == IcmpType::DestinationUnreachable
            && IcmpDestinationUnreachableCode::from(self.get_icmp_code())
                == IcmpDestinationUnreachableCode::PortUnreachable
    }

    pub fn set_icmp_type(&mut self, val: IcmpType) {
        *self.buf.write(TYPE_OFFSET) = val.id();
    }

    pub fn set_icmp_code(&mut self, val: IcmpCode) {
        *self.buf.write(CODE_OFFSET) = val.0;
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, val);
    }

    pub fn set_rest_of_header(&mut self, val: [u8; 4]) {
        self.buf.set_bytes(REST_OF_HEADER_OFFSET, val);
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf.as_slice()[Self::minimum_packet_size()..]
    }
}

impl Debug for IcmpPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPacket")
            .field("icmp_type", &self.get_icmp_type())
            .field("icmp_code", &self.get_icmp_code())
            .field("checksum", &self.get_checksum())
            .field("rest_of_header", &self.get_rest_of_header())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::internet_checksum;
    use hex_literal::hex;
    use test_case::test_case;

    #[test_case(0, IcmpType::EchoReply)]
    #[test_case(3, IcmpType::DestinationUnreachable)]
    #[test_case(8, IcmpType::EchoRequest)]
    #[test_case(11, IcmpType::TimeExceeded)]
    #[test_case(5, IcmpType::Other(5))]
    fn test_icmp_type(id: u8, expected: IcmpType) {
        assert_eq!(expected, IcmpType::from(id));
        assert_eq!(id, expected.id());
    }

    #[test]
    fn test_icmp_type_and_code() {
        let mut buf = [0_u8; IcmpPacket::minimum_packet_size()];
        let mut packet = IcmpPacket::new(&mut buf).unwrap();
        packet.set_icmp_type(IcmpType::TimeExceeded);
        packet.set_icmp_code(IcmpCode(0));
        assert_eq!(IcmpType::TimeExceeded, packet.get_icmp_type());
        assert_eq!(
            IcmpTimeExceededCode::TtlExpired,
            IcmpTimeExceededCode::from(packet.get_icmp_code())
        );
        assert_eq!([0x0b, 0x00], packet.packet()[0..2]);
    }

    #[test]
    fn test_checksum_and_rest_of_header() {
        let mut buf = [0_u8; IcmpPacket::minimum_packet_size()];
        let mut packet = IcmpPacket::new(&mut buf).unwrap();
        packet.set_checksum(0xf4ff);
        packet.set_rest_of_header([0x00, 0x00, 0x05, 0xdc]);
        assert_eq!(0xf4ff, packet.get_checksum());
        assert_eq!([0x00, 0x00, 0x05, 0xdc], packet.get_rest_of_header());
        assert_eq!(hex!("00 00 f4 ff 00 00 05 dc"), packet.packet());
    }

    #[test]
    fn test_view_time_exceeded() {
        let buf = hex!(
            "
            0b 00 f4 ff 00 00 00 00 45 00 00 28 75 30 00 00
            01 06 4c a6 c0 a8 01 77 5d b8 d8 22 d6 d8 82 9a
            00 00 03 e8
            "
        );
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::TimeExceeded, packet.get_icmp_type());
        assert_eq!(IcmpCode(0), packet.get_icmp_code());
        assert_eq!(0xf4ff, packet.get_checksum());
        assert!(!packet.is_port_unreachable());
        assert_eq!(28, packet.payload().len());
    }

    #[test]
    fn test_view_port_unreachable() {
        let buf = hex!("03 03 fc fc 00 00 00 00");
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::DestinationUnreachable, packet.get_icmp_type());
        assert_eq!(
            IcmpDestinationUnreachableCode::PortUnreachable,
            IcmpDestinationUnreachableCode::from(packet.get_icmp_code())
        );
        assert!(packet.is_port_unreachable());
        assert_eq!(0, internet_checksum(packet.packet()));
    }

    #[test_case(hex!("03 01 fc fe 00 00 00 00"); "host unreachable")]
    #[test_case(hex!("0b 03 f4 fc 00 00 00 00"); "time exceeded with code three")]
    fn test_not_port_unreachable(buf: [u8; 8]) {
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert!(!packet.is_port_unreachable());
    }

    #[test]
    fn test_new_view_insufficient_buffer() {
        const SIZE: usize = IcmpPacket::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = IcmpPacket::new_view(&buf).unwrap_err();
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("IcmpPacket"), SIZE, SIZE - 1),
            err
        );
    }
}
