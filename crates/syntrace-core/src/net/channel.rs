use crate::config::ChannelConfig;
use crate::error::{Error, Result};
use crate::net::ipv4::Ipv4;
use crate::net::platform::Ipv4ByteOrder;
use crate::net::socket::Socket;
use crate::net::{Network, Recv};
use crate::probe::Probe;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::instrument;

/// A channel for sending `Probe` packets and receiving the `ICMP` responses they provoke.
///
/// Probes are sent on a single raw socket which lives as long as the channel. Responses are read
/// from a raw `ICMP` socket which is opened for a single hop by [`Network::open_listener`] and
/// released by [`Network::close_listener`].
pub struct Channel<S: Socket> {
    ipv4: Ipv4,
    send_socket: S,
    recv_socket: Option<S>,
}

impl<S: Socket> Channel<S> {
    /// Create a `Channel`.
    ///
    /// This operation requires the `CAP_NET_RAW` capability on Linux.
    #[instrument(skip_all, level = "trace")]
    pub fn connect(config: &ChannelConfig) -> Result<Self> {
        tracing::debug!(?config);
        let byte_order = Ipv4ByteOrder::for_platform();
        let send_socket = S::new_raw_send_socket_ipv4()?;
        Ok(Self::new(config, byte_order, send_socket))
    }

    fn new(config: &ChannelConfig, byte_order: Ipv4ByteOrder, send_socket: S) -> Self {
        Self {
            ipv4: Ipv4 {
                src_addr: config.source_addr,
                dest_addr: config.target_addr,
                byte_order,
            },
            send_socket,
            recv_socket: None,
        }
    }
}

impl<S: Socket> Network for Channel<S> {
    #[instrument(skip(self), level = "trace")]
    fn open_listener(&mut self, probe: &Probe) -> Result<()> {
        let mut socket = S::new_icmp_recv_socket_ipv4()?;
        socket.bind(SocketAddr::new(
            IpAddr::V4(self.ipv4.src_addr),
            probe.dest_port.0,
        ))?;
        self.recv_socket = Some(socket);
        Ok(())
    }

    #[instrument(skip(self), level = "trace")]
    fn close_listener(&mut self) {
        self.recv_socket = None;
    }

    #[instrument(skip(self), level = "trace")]
    fn send_probe(&mut self, probe: &Probe) -> Result<()> {
        tracing::debug!(?probe);
        self.ipv4.dispatch_tcp_probe(&mut self.send_socket, probe)
    }

    #[instrument(skip(self), level = "trace")]
    fn recv_probe(&mut self, timeout: Duration) -> Result<Recv> {
        let socket = self.recv_socket.as_mut().ok_or(Error::NoListener)?;
        if socket.is_readable(timeout)? {
            Ok(Recv::Answered(self.ipv4.recv_icmp_datagram(socket)?))
        } else {
            Ok(Recv::TimedOut)
        }
    }
}
