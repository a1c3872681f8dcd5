use crate::error::Error::InvalidSourceAddr;
use crate::error::Result;
use crate::net::platform::Platform;
use crate::net::socket::Socket;
use crate::types::Port;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Discover or validate a source address.
pub struct SourceAddr;

impl SourceAddr {
    /// Discover the source `Ipv4Addr`.
    ///
    /// The address of the interface is used if one is given, otherwise the local address the OS
    /// would route to the target from.
    pub fn discover<P: Platform>(
        target_addr: Ipv4Addr,
        dest_port: Port,
        interface: Option<&str>,
    ) -> Result<Ipv4Addr> {
        match interface {
            Some(interface) => P::lookup_interface_addr(interface),
            None => P::discover_local_addr(target_addr, dest_port.0),
        }
    }

    /// Validate that we can bind to the source `Ipv4Addr`.
    pub fn validate<S: Socket>(source_addr: Ipv4Addr) -> Result<Ipv4Addr> {
        let mut socket = S::new_udp_dgram_socket_ipv4()?;
        let sock_addr = SocketAddr::new(IpAddr::V4(source_addr), 0);
        match socket.bind(sock_addr) {
            Ok(()) => Ok(source_addr),
            Err(_) => Err(InvalidSourceAddr(sock_addr.ip())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, IoError};
    use crate::net::platform::MockPlatform;
    use crate::net::socket::tests::MTX;
    use crate::net::socket::MockSocket;
    use mockall::predicate;
    use std::str::FromStr;

    #[test]
    fn test_discover_local_addr() -> anyhow::Result<()> {
        let _m = MTX.lock();

        let expected_target = Ipv4Addr::from_str("1.2.3.4")?;
        let expected_port = 33440;
        let expected_src = Ipv4Addr::from_str("192.168.0.1")?;

        let ctx = MockPlatform::discover_local_addr_context();
        ctx.expect()
            .with(predicate::eq(expected_target), predicate::eq(expected_port))
            .times(1)
            .returning(move |_, _| Ok(expected_src));

        let src_addr = SourceAddr::discover::<MockPlatform>(
            expected_target,
            Port(expected_port),
            None,
        )?;
        assert_eq!(expected_src, src_addr);
        Ok(())
    }

    #[test]
    fn test_discover_lookup_interface() -> anyhow::Result<()> {
        let _m = MTX.lock();

        let expected_target = Ipv4Addr::from_str("1.2.3.4")?;
        let expected_src = Ipv4Addr::from_str("192.168.0.1")?;

        let ctx = MockPlatform::lookup_interface_addr_context();
        ctx.expect()
            .with(predicate::eq("en0"))
            .times(1)
            .returning(move |_| Ok(expected_src));

        let src_addr = SourceAddr::discover::<MockPlatform>(
            expected_target,
            Port(33434),
            Some("en0"),
        )?;
        assert_eq!(expected_src, src_addr);
        Ok(())
    }

    #[test]
    fn test_discover_unknown_interface() -> anyhow::Result<()> {
        let _m = MTX.lock();

        let ctx = MockPlatform::lookup_interface_addr_context();
        ctx.expect()
            .times(1)
            .returning(|name| Err(Error::UnknownInterface(name.to_string())));

        let err = SourceAddr::discover::<MockPlatform>(
            Ipv4Addr::from_str("1.2.3.4")?,
            Port(33434),
            Some("nope0"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownInterface(name) if name == "nope0"));
        Ok(())
    }

    #[test]
    fn test_validate() -> anyhow::Result<()> {
        let _m = MTX.lock();

        let addr = Ipv4Addr::from_str("192.168.0.1")?;
        let expected_bind_addr = SocketAddr::new(IpAddr::V4(addr), 0);

        let ctx = MockSocket::new_udp_dgram_socket_ipv4_context();
        ctx.expect().times(1).returning(move || {
            let mut mocket = MockSocket::new();
            mocket
                .expect_bind()
                .with(predicate::eq(expected_bind_addr))
                .times(1)
                .returning(|_| Ok(()));
            Ok(mocket)
        });

        let src_addr = SourceAddr::validate::<MockSocket>(addr)?;
        assert_eq!(addr, src_addr);
        Ok(())
    }

    #[test]
    fn test_validate_invalid() -> anyhow::Result<()> {
        let _m = MTX.lock();

        let addr = Ipv4Addr::from_str("1.2.3.4")?;
        let expected_bind_addr = SocketAddr::new(IpAddr::V4(addr), 0);

        let ctx = MockSocket::new_udp_dgram_socket_ipv4_context();
        ctx.expect().times(1).returning(move || {
            let mut mocket = MockSocket::new();
            mocket
                .expect_bind()
                .with(predicate::eq(expected_bind_addr))
                .times(1)
                .returning(|addr| Err(IoError::Bind(std::io::Error::last_os_error(), addr)));
            Ok(mocket)
        });

        let err = SourceAddr::validate::<MockSocket>(addr).unwrap_err();
        assert!(matches!(err, InvalidSourceAddr(_)));
        Ok(())
    }
}
