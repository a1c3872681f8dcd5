use crate::error::{Error, IoError, IoOperation, IoResult, Result};
use crate::net::platform::Platform;
use crate::net::socket::Socket;
use itertools::Itertools;
use nix::ifaddrs::InterfaceAddress;
use nix::poll::{PollFd, PollFlags, PollTimeout};
use socket2::{Domain, Protocol, SockAddr, Type};
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::os::fd::AsFd;
use std::time::Duration;
use tracing::instrument;

pub struct PlatformImpl;

impl Platform for PlatformImpl {
    #[instrument(ret, level = "trace")]
    fn lookup_interface_addr(name: &str) -> Result<Ipv4Addr> {
        nix::ifaddrs::getifaddrs()
            .map_err(|_| Error::UnknownInterface(name.to_string()))?
            .filter(|ia| ia.interface_name == name)
            .find_map(|ia| interface_ipv4(&ia))
            .ok_or_else(|| Error::UnknownInterface(name.to_string()))
    }

    /// Connecting a `UDP` socket selects a route without transmitting anything.
    #[instrument(ret, level = "trace")]
    fn discover_local_addr(target_addr: Ipv4Addr, port: u16) -> Result<Ipv4Addr> {
        let mut socket = SocketImpl::new_udp_dgram_socket_ipv4()?;
        socket.connect(SocketAddr::new(IpAddr::V4(target_addr), port))?;
        match socket.local_addr()?.map(|addr| addr.ip()) {
            Some(IpAddr::V4(addr)) => Ok(addr),
            Some(addr) => Err(Error::UnsupportedAddr(addr)),
            None => Err(Error::MissingAddr),
        }
    }
}

fn interface_ipv4(ia: &InterfaceAddress) -> Option<Ipv4Addr> {
    ia.address
        .as_ref()
        .and_then(|addr| addr.as_sockaddr_in())
        .map(|sin| sin.ip())
}

/// A raw or datagram socket backed by `socket2`.
pub struct SocketImpl {
    inner: socket2::Socket,
}

impl SocketImpl {
    fn open(domain: Domain, ty: Type, protocol: Protocol) -> IoResult<Self> {
        socket2::Socket::new(domain, ty, Some(protocol))
            .map(|inner| Self { inner })
            .map_err(|err| IoError::Other(err, IoOperation::NewSocket))
    }
}

impl Socket for SocketImpl {
    #[instrument(level = "trace")]
    fn new_raw_send_socket_ipv4() -> IoResult<Self> {
        let socket = Self::open(
            Domain::IPV4,
            Type::RAW,
            Protocol::from(nix::libc::IPPROTO_RAW),
        )?;
        socket
            .inner
            .set_header_included_v4(true)
            .map_err(|err| IoError::Other(err, IoOperation::SetHeaderIncluded))?;
        Ok(socket)
    }

    #[instrument(level = "trace")]
    fn new_icmp_recv_socket_ipv4() -> IoResult<Self> {
        Self::open(Domain::IPV4, Type::RAW, Protocol::ICMPV4)
    }

    #[instrument(level = "trace")]
    fn new_udp_dgram_socket_ipv4() -> IoResult<Self> {
        Self::open(Domain::IPV4, Type::DGRAM, Protocol::UDP)
    }

    #[instrument(skip(self), level = "trace")]
    fn bind(&mut self, address: SocketAddr) -> IoResult<()> {
        self.inner
            .bind(&SockAddr::from(address))
            .map_err(|err| IoError::Bind(err, address))
    }

    #[instrument(skip(self), level = "trace")]
    fn connect(&mut self, address: SocketAddr) -> IoResult<()> {
        self.inner
            .connect(&SockAddr::from(address))
            .map_err(|err| IoError::Connect(err, address))
    }

    #[instrument(skip(self, buf), level = "trace")]
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> IoResult<()> {
        tracing::trace!(buf = format!("{:02x}", buf.iter().format(" ")), ?addr);
        self.inner
            .send_to(buf, &SockAddr::from(addr))
            .map(|_| ())
            .map_err(|err| IoError::SendTo(err, addr))
    }

    /// An interrupted wait is reported as not readable.
    #[instrument(skip(self), level = "trace")]
    fn is_readable(&mut self, timeout: Duration) -> IoResult<bool> {
        let timeout = PollTimeout::try_from(timeout).unwrap_or(PollTimeout::MAX);
        let mut fds = [PollFd::new(self.inner.as_fd(), PollFlags::POLLIN)];
        match nix::poll::poll(&mut fds, timeout) {
            Ok(ready) => Ok(ready > 0),
            Err(nix::Error::EINTR) => Ok(false),
            Err(err) => Err(IoError::Other(err.into(), IoOperation::Poll)),
        }
    }

    #[instrument(skip(self, buf), level = "trace")]
    fn recv(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let bytes_read = (&self.inner)
            .read(buf)
            .map_err(|err| IoError::Other(err, IoOperation::Recv))?;
        tracing::trace!(
            buf = format!("{:02x}", buf[..bytes_read].iter().format(" ")),
            bytes_read
        );
        Ok(bytes_read)
    }

    #[instrument(skip(self), level = "trace")]
    fn local_addr(&mut self) -> IoResult<Option<SocketAddr>> {
        self.inner
            .local_addr()
            .map(|addr| addr.as_socket())
            .map_err(|err| IoError::Other(err, IoOperation::LocalAddr))
    }
}
