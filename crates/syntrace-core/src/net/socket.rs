use crate::error::IoResult as Result;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
pub trait Socket
where
    Self: Sized,
{
    /// Create a raw IPv4 socket for sending fully formed IPv4/TCP probe datagrams.
    ///
    /// The socket has `IP_HDRINCL` set and so the caller supplies the IPv4 header.
    fn new_raw_send_socket_ipv4() -> Result<Self>;
    /// Create a raw IPv4 socket for receiving ICMP responses.
    fn new_icmp_recv_socket_ipv4() -> Result<Self>;
    /// Create (non-raw) IPv4/UDP socket for local address discovery and validation.
    fn new_udp_dgram_socket_ipv4() -> Result<Self>;
    fn bind(&mut self, address: SocketAddr) -> Result<()>;
    fn connect(&mut self, address: SocketAddr) -> Result<()>;
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<()>;
    /// Returns true if the socket becomes readable before the timeout, false otherwise.
    fn is_readable(&mut self, timeout: Duration) -> Result<bool>;
    /// Read a single datagram into `buf`, returning the number of bytes read.
    ///
    /// The sender is not returned as raw `IPv4` datagrams carry it in the header.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn local_addr(&mut self) -> Result<Option<SocketAddr>>;
}

#[cfg(test)]
pub mod tests {
    use std::sync::Mutex;

    /// Held by every test which sets expectations on the static constructors of `MockSocket` or
    /// the static methods of `MockPlatform`, as those expectations are global.
    pub static MTX: Mutex<()> = Mutex::new(());

    #[macro_export]
    macro_rules! mocket_recv {
        ($packet: expr) => {
            move |buf: &mut [u8]| -> IoResult<usize> {
                buf[..$packet.len()].copy_from_slice(&$packet);
                Ok($packet.len())
            }
        };
    }
}
