use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};
use std::ops::BitOr;

const SOURCE_PORT_OFFSET: usize = 0;
const DESTINATION_PORT_OFFSET: usize = 2;
const SEQUENCE_OFFSET: usize = 4;
const ACKNOWLEDGEMENT_OFFSET: usize = 8;
const DATA_OFFSET_OFFSET: usize = 12;
const FLAGS_OFFSET: usize = 13;
const WINDOW_SIZE_OFFSET: usize = 14;
const CHECKSUM_OFFSET: usize = 16;
const URGENT_POINTER_OFFSET: usize = 18;

/// The control bits of a `TCP` header.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    pub const FIN: Self = Self(0x01);
    pub const SYN: Self = Self(0x02);
    pub const RST: Self = Self(0x04);
    pub const PSH: Self = Self(0x08);
    pub const ACK: Self = Self(0x10);
    pub const URG: Self = Self(0x20);

    /// Are all of the bits of `other` set?
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TcpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Represents a TCP Packet.
///
/// The internal representation is held in network byte order (big-endian) and all accessor methods
/// take and return data in host byte order, converting as necessary for the given architecture.
pub struct TcpPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> TcpPacket<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Mutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("TcpPacket"),
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
                String::from("TcpPacket"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    /// The size of a `TCP` header without options.
    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    #[must_use]
    pub fn get_source(&self) -> u16 {
        self.buf.get_u16(SOURCE_PORT_OFFSET)
    }

    #[must_use]
    pub fn get_destination(&self) -> u16 {
        self.buf.get_u16(DESTINATION_PORT_OFFSET)
    }

    #[must_use]
    pub fn get_sequence(&self) -> u32 {
        self.buf.get_u32(SEQUENCE_OFFSET)
    }

    #[must_use]
    pub fn get_acknowledgement(&self) -> u32 {
        self.buf.get_u32(ACKNOWLEDGEMENT_OFFSET)
    }

    /// The header length, in 32-bit words.
    #[must_use]
    pub fn get_data_offset(&self) -> u8 {
        self.buf.read(DATA_OFFSET_OFFSET) >> 4
    }

    #[must_use]
    pub fn get_flags(&self) -> TcpFlags {
        TcpFlags(self.buf.read(FLAGS_OFFSET) & 0x3f)
    }

    #[must_use]
    pub fn get_window_size(&self) -> u16 {
        self.buf.get_u16(WINDOW_SIZE_OFFSET)
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_urgent_pointer(&self) -> u16 {
        self.buf.get_u16(URGENT_POINTER_OFFSET)
    }

    pub fn set_source(&mut self, val: u16) {
        self.buf.set_u16(SOURCE_PORT_OFFSET, val);
    }

    pub fn set_destination(&mut self, val: u16) {
        self.buf.set_u16(DESTINATION_PORT_OFFSET, val);
    }

    pub fn set_sequence(&mut self, val: u32) {
        self.buf.set_u32(SEQUENCE_OFFSET, val);
    }

    pub fn set_acknowledgement(&mut self, val: u32) {
        self.buf.set_u32(ACKNOWLEDGEMENT_OFFSET, val);
    }

    pub fn set_data_offset(&mut self, val: u8) {
        *self.buf.write(DATA_OFFSET_OFFSET) =
            (self.buf.read(DATA_OFFSET_OFFSET) & 0x0f) | ((val & 0x0f) << 4);
    }

    pub fn set_flags(&mut self, val: TcpFlags) {
        *self.buf.write(FLAGS_OFFSET) = (self.buf.read(FLAGS_OFFSET) & 0xc0) | (val.0 & 0x3f);
    }

    pub fn set_window_size(&mut self, val: u16) {
        self.buf.set_u16(WINDOW_SIZE_OFFSET, val);
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, val);
    }

    pub fn set_urgent_pointer(&mut self, val: u16) {
        self.buf.set_u16(URGENT_POINTER_OFFSET, val);
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let start = (usize::from(self.get_data_offset()) * 4)
            .clamp(Self::minimum_packet_size(), self.buf.as_slice().len());
        &self.buf.as_slice()[start..]
    }
}

impl Debug for TcpPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpPacket")
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("sequence", &self.get_sequence())
            .field("acknowledgement", &self.get_acknowledgement())
            .field("data_offset", &self.get_data_offset())
            .field("flags", &self.get_flags())
            .field("window_size", &self.get_window_size())
            .field("checksum", &self.get_checksum())
            .field("urgent_pointer", &self.get_urgent_pointer())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_source() {
        let mut buf = [0_u8; TcpPacket::minimum_packet_size()];
        let mut packet = TcpPacket::new(&mut buf).unwrap();
        packet.set_source(55000);
        assert_eq!(55000, packet.get_source());
        assert_eq!([0xd6, 0xd8], packet.packet()[0..2]);
    }

    #[test]
    fn test_destination() {
        let mut buf = [0_u8; TcpPacket::minimum_packet_size()];
        let mut packet = TcpPacket::new(&mut buf).unwrap();
        packet.set_destination(33434);
        assert_eq!(33434, packet.get_destination());
        assert_eq!([0x82, 0x9a], packet.packet()[2..4]);
    }

    #[test]
    fn test_sequence_and_acknowledgement() {
        let mut buf = [0_u8; TcpPacket::minimum_packet_size()];
        let mut packet = TcpPacket::new(&mut buf).unwrap();
        packet.set_sequence(0xdead_beef);
        packet.set_acknowledgement(1);
        assert_eq!(0xdead_beef, packet.get_sequence());
        assert_eq!(1, packet.get_acknowledgement());
        assert_eq!(hex!("de ad be ef 00 00 00 01"), packet.packet()[4..12]);
    }

    #[test]
    fn test_data_offset_and_flags() {
        let mut buf = [0_u8; TcpPacket::minimum_packet_size()];
        let mut packet = TcpPacket::new(&mut buf).unwrap();
        packet.set_data_offset(5);
        packet.set_flags(TcpFlags::SYN);
        assert_eq!(5, packet.get_data_offset());
        assert_eq!(TcpFlags::SYN, packet.get_flags());
        assert_eq!([0x50, 0x02], packet.packet()[12..14]);
        packet.set_flags(TcpFlags::SYN | TcpFlags::ACK);
        assert!(packet.get_flags().contains(TcpFlags::SYN));
        assert!(packet.get_flags().contains(TcpFlags::ACK));
        assert!(!packet.get_flags().contains(TcpFlags::RST));
        assert_eq!(5, packet.get_data_offset());
        assert_eq!([0x50, 0x12], packet.packet()[12..14]);
    }

    #[test]
    fn test_window_checksum_and_urgent_pointer() {
        let mut buf = [0_u8; TcpPacket::minimum_packet_size()];
        let mut packet = TcpPacket::new(&mut buf).unwrap();
        packet.set_window_size(8192);
        packet.set_checksum(0x3a8d);
        packet.set_urgent_pointer(0);
        assert_eq!(8192, packet.get_window_size());
        assert_eq!(0x3a8d, packet.get_checksum());
        assert_eq!(0, packet.get_urgent_pointer());
        assert_eq!(hex!("20 00 3a 8d 00 00"), packet.packet()[14..20]);
    }

    #[test]
    fn test_view() {
        let buf = hex!("00 50 80 ea 00 00 00 00 95 9d 2e c7 50 12 ff ff 55 cc 00 00");
        let packet = TcpPacket::new_view(&buf).unwrap();
        assert_eq!(80, packet.get_source());
        assert_eq!(33002, packet.get_destination());
        assert_eq!(0, packet.get_sequence());
        assert_eq!(2_510_106_311, packet.get_acknowledgement());
        assert_eq!(5, packet.get_data_offset());
        assert_eq!(TcpFlags::SYN | TcpFlags::ACK, packet.get_flags());
        assert_eq!(0xffff, packet.get_window_size());
        assert_eq!(0x55cc, packet.get_checksum());
        assert_eq!(0, packet.get_urgent_pointer());
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_new_insufficient_buffer() {
        const SIZE: usize = TcpPacket::minimum_packet_size();
        let mut buf = [0_u8; SIZE - 1];
        let err = TcpPacket::new(&mut buf).unwrap_err();
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("TcpPacket"), SIZE, SIZE - 1),
            err
        );
    }

    #[test]
    fn test_new_view_insufficient_buffer() {
        const SIZE: usize = TcpPacket::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = TcpPacket::new_view(&buf).unwrap_err();
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("TcpPacket"), SIZE, SIZE - 1),
            err
        );
    }
}
