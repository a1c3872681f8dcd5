use crate::constants::MAX_PACKET_SIZE;
use crate::error::Result;
use crate::net::platform::Ipv4ByteOrder;
use crate::net::socket::Socket;
use crate::probe::{IcmpPacketCode, IcmpPacketType, Probe, ReceivedDatagram};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::SystemTime;
use syntrace_packet::checksum::{ipv4_header_checksum, tcp_ipv4_checksum};
use syntrace_packet::icmpv4::IcmpPacket;
use syntrace_packet::ipv4::Ipv4Packet;
use syntrace_packet::tcp::{TcpFlags, TcpPacket};
use syntrace_packet::IpProtocol;
use tracing::instrument;

/// The size of a probe, a 20 byte `IPv4` header and a 20 byte `TCP` header with no options.
const PROBE_PACKET_SIZE: usize =
    Ipv4Packet::minimum_packet_size() + TcpPacket::minimum_packet_size();

/// The `TCP` window size advertised by a probe.
const TCP_WINDOW_SIZE: u16 = 8192;

/// IPv4 configuration.
#[derive(Debug)]
pub struct Ipv4 {
    pub src_addr: Ipv4Addr,
    pub dest_addr: Ipv4Addr,
    pub byte_order: Ipv4ByteOrder,
}

impl Default for Ipv4 {
    fn default() -> Self {
        Self {
            src_addr: Ipv4Addr::UNSPECIFIED,
            dest_addr: Ipv4Addr::UNSPECIFIED,
            byte_order: Ipv4ByteOrder::Network,
        }
    }
}

impl Ipv4 {
    /// Dispatch a TCP SYN probe using a raw socket with `IP_HDRINCL` set.
    ///
    /// As `IP_HDRINCL` is set we must supply both the `IPv4` and `TCP` headers, which is what
    /// allows the ttl to be set per probe without any socket option.
    #[instrument(skip(self, raw_send_socket), level = "trace")]
    pub fn dispatch_tcp_probe<S: Socket>(
        &self,
        raw_send_socket: &mut S,
        probe: &Probe,
    ) -> Result<()> {
        let mut tcp_buf = [0_u8; TcpPacket::minimum_packet_size()];
        let mut ipv4_buf = [0_u8; PROBE_PACKET_SIZE];
        let tcp = self.make_tcp_syn_packet(&mut tcp_buf, probe)?;
        let ipv4 = self.make_ipv4_packet(&mut ipv4_buf, probe, tcp.packet())?;
        let remote_addr = SocketAddr::new(IpAddr::V4(self.dest_addr), 0);
        raw_send_socket.send_to(ipv4.packet(), remote_addr)?;
        Ok(())
    }

    /// Receive a single `IPv4/ICMP` datagram.
    ///
    /// Errors from the socket are fatal, errors from parsing the datagram are returned as
    /// [`crate::Error::MalformedHeader`].
    #[instrument(skip(self, recv_socket), level = "trace")]
    pub fn recv_icmp_datagram<S: Socket>(&self, recv_socket: &mut S) -> Result<ReceivedDatagram> {
        let mut buf = [0_u8; MAX_PACKET_SIZE];
        let bytes_read = recv_socket.recv(&mut buf)?;
        let datagram = extract_datagram(&buf[..bytes_read], SystemTime::now())?;
        tracing::debug!(?datagram);
        Ok(datagram)
    }

    /// Create a `TcpPacket` with only the `SYN` flag set.
    fn make_tcp_syn_packet<'a>(
        &self,
        tcp_buf: &'a mut [u8],
        probe: &Probe,
    ) -> Result<TcpPacket<'a>> {
        let mut tcp = TcpPacket::new(tcp_buf)?;
        tcp.set_source(probe.src_port.0);
        tcp.set_destination(probe.dest_port.0);
        tcp.set_sequence(probe.sequence.0);
        tcp.set_acknowledgement(0);
        tcp.set_data_offset(5);
        tcp.set_flags(TcpFlags::SYN);
        tcp.set_window_size(TCP_WINDOW_SIZE);
        tcp.set_urgent_pointer(0);
        tcp.set_checksum(tcp_ipv4_checksum(
            tcp.packet(),
            self.src_addr,
            self.dest_addr,
        ));
        Ok(tcp)
    }

    /// Create an `Ipv4Packet`.
    ///
    /// The header checksum is filled in here, on most platforms the kernel overwrites it.
    fn make_ipv4_packet<'a>(
        &self,
        ipv4_buf: &'a mut [u8],
        probe: &Probe,
        payload: &[u8],
    ) -> Result<Ipv4Packet<'a>> {
        let ipv4_total_length = (Ipv4Packet::minimum_packet_size() + payload.len()) as u16;
        let ipv4_total_length_header = self.byte_order.adjust_length(ipv4_total_length);
        let mut ipv4 = Ipv4Packet::new(&mut ipv4_buf[..usize::from(ipv4_total_length)])?;
        ipv4.set_version(4);
        ipv4.set_header_length(5);
        ipv4.set_tos(0);
        ipv4.set_total_length(ipv4_total_length_header);
        ipv4.set_identification(probe.identification);
        ipv4.set_flags_and_fragment_offset(0);
        ipv4.set_ttl(probe.ttl.0);
        ipv4.set_protocol(IpProtocol::Tcp);
        ipv4.set_source(self.src_addr);
        ipv4.set_destination(self.dest_addr);
        ipv4.set_payload(payload);
        ipv4.set_checksum(ipv4_header_checksum(ipv4.header()));
        Ok(ipv4)
    }
}

/// Extract a `ReceivedDatagram` from the raw bytes of an `IPv4/ICMP` datagram.
///
/// The `ICMP` header is read from the offset given by the `IPv4` header length; the copy of the
/// original datagram an `ICMP` error carries is ignored.
#[instrument(skip(buf), level = "trace")]
pub fn extract_datagram(buf: &[u8], received: SystemTime) -> Result<ReceivedDatagram> {
    let ipv4 = Ipv4Packet::new_view(buf)?;
    let header_size = ipv4.header_size()?;
    let icmp = IcmpPacket::new_view(&buf[header_size..])?;
    Ok(ReceivedDatagram::new(
        ipv4.get_source(),
        ipv4.get_protocol(),
        IcmpPacketType(icmp.get_icmp_type().id()),
        IcmpPacketCode(icmp.get_icmp_code().0),
        received,
    ))
}
