use crate::config::{ChannelConfig, SessionConfig};
use crate::error::Result;
use crate::net::channel::Channel;
use crate::net::platform::Platform;
use crate::net::socket::Socket;
use crate::net::source::SourceAddr;
use crate::net::{PlatformImpl, SocketImpl};
use crate::probe::{CompletionReason, HopResult};
use crate::session::ProbeSession;
use std::net::Ipv4Addr;
use syntrace_dns::Resolver;
use tracing::instrument;

/// A TCP SYN traceroute implementation.
///
/// See the [`crate`] documentation for more information.
#[derive(Debug, Clone)]
pub struct Tracer {
    config: SessionConfig,
    interface: Option<String>,
    source_addr: Option<Ipv4Addr>,
}

impl Tracer {
    /// Create a `Tracer`.
    ///
    /// Use the [`crate::Builder`] type to create a [`Tracer`].
    #[must_use]
    pub(crate) const fn new(
        config: SessionConfig,
        interface: Option<String>,
        source_addr: Option<Ipv4Addr>,
    ) -> Self {
        Self {
            config,
            interface,
            source_addr,
        }
    }

    /// Run the [`Tracer`] on the current thread, calling `func` with the result of each hop.
    ///
    /// This method blocks until the trace completes, returning the reason it completed, or until
    /// the trace fails.
    ///
    /// The source address is validated if one was given, otherwise it is discovered from the
    /// interface or the route to the target.
    ///
    /// Raw socket privileges are required for the whole trace, not just at startup, as a fresh
    /// raw `ICMP` socket is opened for every hop.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// # use std::net::IpAddr;
    /// # use std::str::FromStr;
    /// use syntrace_core::Builder;
    /// use syntrace_dns::{Config, DnsResolver};
    ///
    /// let resolver = DnsResolver::start(Config::default())?;
    /// let addr = IpAddr::from_str("1.1.1.1")?;
    /// let reason = Builder::new(addr)
    ///     .build()?
    ///     .run_with(&resolver, |hop| println!("{hop:?}"))?;
    /// println!("{reason:?}");
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all, level = "trace")]
    pub fn run_with<R: Resolver, F: Fn(&HopResult)>(
        &self,
        resolver: &R,
        func: F,
    ) -> Result<CompletionReason> {
        self.run_on::<SocketImpl, PlatformImpl, R, F>(resolver, func)
    }

    fn run_on<S: Socket, P: Platform, R: Resolver, F: Fn(&HopResult)>(
        &self,
        resolver: &R,
        func: F,
    ) -> Result<CompletionReason> {
        let source_addr = match self.source_addr {
            None => SourceAddr::discover::<P>(
                self.config.target_addr,
                self.config.dest_port,
                self.interface.as_deref(),
            )?,
            Some(addr) => SourceAddr::validate::<S>(addr)?,
        };
        tracing::debug!(%source_addr);
        let channel = Channel::<S>::connect(&ChannelConfig {
            source_addr,
            target_addr: self.config.target_addr,
        })?;
        ProbeSession::new(&self.config, func).run(channel, resolver)
    }

    /// The session configuration of the tracer.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The target address of the tracer.
    #[must_use]
    pub const fn target_addr(&self) -> Ipv4Addr {
        self.config.target_addr
    }

    /// The source address of the tracer, if one was given.
    #[must_use]
    pub const fn source_addr(&self) -> Option<Ipv4Addr> {
        self.source_addr
    }

    /// The interface to trace from, if one was given.
    #[must_use]
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }
}
