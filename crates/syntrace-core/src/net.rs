use crate::error::Result;
use crate::probe::{Probe, ReceivedDatagram};
use std::time::Duration;

/// IPv4 implementation.
mod ipv4;

/// Platform specific network code.
pub(crate) mod platform;

/// A network socket.
pub(crate) mod socket;

/// A channel for sending and receiving probes.
pub mod channel;

/// Determine the source address.
pub mod source;

pub use ipv4::extract_datagram;

/// The platform specific socket type.
pub use platform::{PlatformImpl, SocketImpl};

/// The outcome of waiting for a response to a probe.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Recv {
    /// A datagram was received.
    Answered(ReceivedDatagram),
    /// No datagram was received before the timeout.
    TimedOut,
}

/// An abstraction over a raw network transport for tracing.
#[cfg_attr(test, mockall::automock)]
pub trait Network {
    /// Open a listener for the responses to `Probe`.
    ///
    /// At most one listener is open at a time, it is scoped to a single hop.
    fn open_listener(&mut self, probe: &Probe) -> Result<()>;

    /// Release the listener opened by `open_listener`, if any.
    fn close_listener(&mut self);

    /// Send a `Probe`.
    fn send_probe(&mut self, probe: &Probe) -> Result<()>;

    /// Wait up to `timeout` for the next datagram on the open listener.
    ///
    /// Returns `Recv::TimedOut` if nothing is received before the timeout. A datagram which
    /// cannot be parsed is returned as an [`crate::Error::MalformedHeader`] error.
    fn recv_probe(&mut self, timeout: Duration) -> Result<Recv>;
}
