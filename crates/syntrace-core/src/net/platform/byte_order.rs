/// The byte order to encode the `total_length`, `flags` and `fragment_offset` fields of the IPv4
/// header.
///
/// Nearly all fields of an IPv4 header handed to a raw socket with `IP_HDRINCL` set are expected
/// in network byte order. The length field is the exception on Apple platforms, where the kernel
/// expects host byte order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Ipv4ByteOrder {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    Host,
    Network,
}

impl Ipv4ByteOrder {
    /// The byte ordering the kernel of the current platform expects.
    #[must_use]
    pub const fn for_platform() -> Self {
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            Self::Host
        }
        #[cfg(not(any(target_os = "macos", target_os = "ios")))]
        {
            Self::Network
        }
    }

    /// Adjust the IPv4 `total_length` header.
    #[must_use]
    pub const fn adjust_length(self, ipv4_total_length: u16) -> u16 {
        match self {
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            Self::Host => ipv4_total_length.swap_bytes(),
            Self::Network => ipv4_total_length,
        }
    }
}
