pub mod byte_order;

pub use byte_order::Ipv4ByteOrder;
use std::net::Ipv4Addr;

#[cfg(unix)]
mod unix;

use crate::error::Result;
#[cfg(unix)]
pub use unix::*;

/// Platform specific operations.
///
/// Abstracts over the differences between operating systems for the source address queries a
/// trace needs before any probe is sent.
///
/// # Errors
///
/// Implementations should return an error if any of the operations fail due to platform-specific
/// limitations or configurations.
#[cfg_attr(test, mockall::automock)]
pub trait Platform {
    /// Lookup the `Ipv4Addr` of a named interface.
    ///
    /// If the interface has more than one IPv4 address then an arbitrary address is selected and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownInterface`] if no IPv4 address can be found for the
    /// interface.
    fn lookup_interface_addr(name: &str) -> Result<Ipv4Addr>;

    /// Discover a local `Ipv4Addr` which can route to the target address.
    ///
    /// No packets are sent.
    ///
    /// # Errors
    ///
    /// Returns an error if a routing local address cannot be found for the target.
    fn discover_local_addr(target_addr: Ipv4Addr, port: u16) -> Result<Ipv4Addr>;
}
