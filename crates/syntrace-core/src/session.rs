use self::state::SessionState;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::net::{Network, Recv};
use crate::probe::{
    Classification, CompletionReason, HopResponse, HopResult, HopState, Probe, ReceivedDatagram,
};
use std::ops::{Deref, DerefMut};
use std::time::SystemTime;
use syntrace_dns::Resolver;
use tracing::instrument;

/// Probe the path to a target one hop at a time.
#[derive(Debug, Clone)]
pub struct ProbeSession<F> {
    config: SessionConfig,
    publish: F,
}

impl<F: Fn(&HopResult)> ProbeSession<F> {
    #[instrument(skip_all, level = "trace")]
    pub fn new(config: &SessionConfig, publish: F) -> Self {
        tracing::debug!(?config);
        Self {
            config: *config,
            publish,
        }
    }

    /// Run the trace to completion, publishing the result of each hop as it completes.
    ///
    /// Returns the reason the trace completed, or the first fatal error encountered.
    #[instrument(skip(self, network, resolver), level = "trace")]
    pub fn run<N: Network, R: Resolver>(
        self,
        mut network: N,
        resolver: &R,
    ) -> Result<CompletionReason> {
        let mut state = SessionState::new(self.config);
        loop {
            tracing::trace!(state = ?state.hop_state());
            let hop = self.probe_hop(&mut network, resolver, &state)?;
            (self.publish)(&hop);
            if let HopState::Finished(reason) = hop.state {
                return Ok(reason);
            }
            state.advance();
            if state.finished() {
                return Ok(CompletionReason::MaxHopsReached);
            }
        }
    }

    /// Send the probes for a single hop and wait for a response.
    ///
    /// A receive timeout and a malformed response both leave the hop unanswered, any other error
    /// is fatal.
    #[instrument(skip(self, network, resolver), level = "trace")]
    fn probe_hop<N: Network, R: Resolver>(
        &self,
        network: &mut N,
        resolver: &R,
        state: &SessionState,
    ) -> Result<HopResult> {
        let probe = state.next_probe();
        let mut listener = HopListener::open(network, &probe)?;
        for _ in 0..self.config.probes_per_hop.0 {
            listener.send_probe(&probe)?;
        }
        let probe = Probe {
            sent: SystemTime::now(),
            ..probe
        };
        match listener.recv_probe(self.config.read_timeout) {
            Ok(Recv::Answered(datagram)) => Ok(self.answered(probe, &datagram, resolver)),
            Ok(Recv::TimedOut) => Ok(unanswered(probe)),
            Err(Error::MalformedHeader(err)) => {
                tracing::debug!(%err, ttl = probe.ttl.0, "discarding malformed response");
                Ok(unanswered(probe))
            }
            Err(err) => Err(err),
        }
    }

    /// Classify a response and decide whether it ends the trace.
    fn answered<R: Resolver>(
        &self,
        probe: Probe,
        datagram: &ReceivedDatagram,
        resolver: &R,
    ) -> HopResult {
        let rtt = datagram
            .received
            .duration_since(probe.sent)
            .unwrap_or_default();
        let classification = datagram.classification();
        let state = if classification == Classification::PortUnreachable {
            HopState::Finished(CompletionReason::PortUnreachable)
        } else if datagram.addr == self.config.target_addr {
            HopState::Finished(CompletionReason::AddressMatch)
        } else if rtt > self.config.hop_timeout {
            HopState::Finished(CompletionReason::Timeout)
        } else {
            HopState::HopAnswered
        };
        let hostname = if self.config.reverse_dns {
            resolver
                .reverse_lookup(datagram.addr)
                .hostnames()
                .next()
                .map_or_else(|| datagram.addr.to_string(), String::from)
        } else {
            datagram.addr.to_string()
        };
        HopResult {
            probe,
            response: Some(HopResponse {
                addr: datagram.addr,
                hostname,
                rtt,
                classification,
            }),
            state,
        }
    }
}

const fn unanswered(probe: Probe) -> HopResult {
    HopResult {
        probe,
        response: None,
        state: HopState::HopTimedOut,
    }
}

/// The listener for a single hop.
///
/// The listener is closed when dropped, however the hop ends.
struct HopListener<'a, N: Network> {
    network: &'a mut N,
}

impl<'a, N: Network> HopListener<'a, N> {
    fn open(network: &'a mut N, probe: &Probe) -> Result<Self> {
        network.open_listener(probe)?;
        Ok(Self { network })
    }
}

impl<N: Network> Deref for HopListener<'_, N> {
    type Target = N;

    fn deref(&self) -> &Self::Target {
        self.network
    }
}

impl<N: Network> DerefMut for HopListener<'_, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.network
    }
}

impl<N: Network> Drop for HopListener<'_, N> {
    fn drop(&mut self) {
        self.network.close_listener();
    }
}

/// Mutable state needed for the hop state machine.
mod state {
    use crate::config::SessionConfig;
    use crate::probe::{HopState, Probe};
    use crate::types::{Port, Sequence, TimeToLive};
    use std::time::SystemTime;

    /// The identity of the next probe to send.
    #[derive(Debug)]
    pub struct SessionState {
        /// Session configuration.
        config: SessionConfig,
        /// The time-to-live of the current hop.
        ttl: TimeToLive,
        sequence: Sequence,
        src_port: Port,
        dest_port: Port,
    }

    impl SessionState {
        pub const fn new(config: SessionConfig) -> Self {
            Self {
                config,
                ttl: TimeToLive(1),
                sequence: config.initial_sequence,
                src_port: config.source_port,
                dest_port: config.dest_port,
            }
        }

        /// Build the probe for the current hop with a random `IPv4` identification.
        pub fn next_probe(&self) -> Probe {
            Probe::new(
                self.ttl,
                self.sequence,
                self.src_port,
                self.dest_port,
                rand::random(),
                SystemTime::now(),
            )
        }

        /// Move on to the next hop.
        pub fn advance(&mut self) {
            self.ttl = self.ttl.next();
            self.sequence = self.sequence.next();
            self.src_port = self.src_port.next();
            self.dest_port = self.dest_port.next();
        }

        /// Have all hops up to `max_hops` been probed?
        pub fn finished(&self) -> bool {
            self.ttl > self.config.max_hops
        }

        pub const fn hop_state(&self) -> HopState {
            HopState::Probing(self.ttl)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::types::ProbesPerHop;
        use std::net::Ipv4Addr;

        fn cfg() -> SessionConfig {
            SessionConfig {
                target_addr: Ipv4Addr::new(5, 6, 7, 8),
                max_hops: TimeToLive(3),
                probes_per_hop: ProbesPerHop(1),
                initial_sequence: Sequence(100),
                source_port: Port(55000),
                dest_port: Port(33434),
                ..Default::default()
            }
        }

        #[test]
        fn test_state() {
            let mut state = SessionState::new(cfg());
            assert_eq!(HopState::Probing(TimeToLive(1)), state.hop_state());
            assert!(!state.finished());

            let probe_1 = state.next_probe();
            assert_eq!(TimeToLive(1), probe_1.ttl);
            assert_eq!(Sequence(100), probe_1.sequence);
            assert_eq!(Port(55000), probe_1.src_port);
            assert_eq!(Port(33434), probe_1.dest_port);

            state.advance();
            let probe_2 = state.next_probe();
            assert_eq!(TimeToLive(2), probe_2.ttl);
            assert_eq!(Sequence(101), probe_2.sequence);
            assert_eq!(Port(55001), probe_2.src_port);
            assert_eq!(Port(33435), probe_2.dest_port);
            assert_eq!(HopState::Probing(TimeToLive(2)), state.hop_state());

            state.advance();
            assert!(!state.finished());
            state.advance();
            assert!(state.finished());
            assert_eq!(HopState::Probing(TimeToLive(4)), state.hop_state());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoError;
    use crate::net::MockNetwork;
    use crate::probe::{IcmpPacketCode, IcmpPacketType};
    use crate::types::{Port, ProbesPerHop, Sequence, TimeToLive};
    use std::cell::RefCell;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::time::Duration;
    use syntrace_dns::{DnsEntry, Resolved, ResolvedIpAddrs, Unresolved};
    use syntrace_packet::IpProtocol;

    const TARGET: Ipv4Addr = Ipv4Addr::new(5, 6, 7, 8);
    const ROUTER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    /// Resolves `10.0.0.1` only.
    struct TestResolver;

    impl Resolver for TestResolver {
        fn lookup(&self, _hostname: impl AsRef<str>) -> syntrace_dns::Result<ResolvedIpAddrs> {
            Err(syntrace_dns::Error::LookupFailed(Box::from("not supported")))
        }

        fn reverse_lookup(&self, addr: impl Into<IpAddr>) -> DnsEntry {
            let addr = addr.into();
            if addr == IpAddr::V4(ROUTER) {
                DnsEntry::Resolved(Resolved(addr, vec![String::from("router.lan")]))
            } else {
                DnsEntry::NotFound(Unresolved(addr))
            }
        }
    }

    fn cfg() -> SessionConfig {
        SessionConfig {
            target_addr: TARGET,
            max_hops: TimeToLive(5),
            hop_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(1),
            probes_per_hop: ProbesPerHop(3),
            initial_sequence: Sequence(100),
            source_port: Port(55000),
            dest_port: Port(33434),
            reverse_dns: true,
        }
    }

    fn datagram(addr: Ipv4Addr, icmp_type: u8, icmp_code: u8, received: SystemTime) -> Recv {
        Recv::Answered(ReceivedDatagram::new(
            addr,
            IpProtocol::Icmp,
            IcmpPacketType(icmp_type),
            IcmpPacketCode(icmp_code),
            received,
        ))
    }

    fn time_exceeded(addr: Ipv4Addr) -> Recv {
        datagram(addr, 11, 0, SystemTime::now())
    }

    fn port_unreachable(addr: Ipv4Addr) -> Recv {
        datagram(addr, 3, 3, SystemTime::now())
    }

    /// A network which answers the nth hop with the nth response.
    fn network(hops: usize, responses: Vec<Result<Recv>>) -> MockNetwork {
        let mut network = MockNetwork::new();
        network
            .expect_open_listener()
            .times(hops)
            .returning(|_| Ok(()));
        network.expect_close_listener().times(hops).return_const(());
        network
            .expect_send_probe()
            .times(hops * 3)
            .returning(|_| Ok(()));
        let mut responses = responses.into_iter();
        network
            .expect_recv_probe()
            .with(mockall::predicate::eq(Duration::from_secs(1)))
            .times(hops)
            .returning(move |_| responses.next().unwrap_or(Ok(Recv::TimedOut)));
        network
    }

    fn run(
        config: &SessionConfig,
        network: MockNetwork,
    ) -> Result<(CompletionReason, Vec<HopResult>)> {
        let hops = RefCell::new(vec![]);
        let session = ProbeSession::new(config, |hop: &HopResult| {
            hops.borrow_mut().push(hop.clone());
        });
        let reason = session.run(network, &TestResolver)?;
        Ok((reason, hops.into_inner()))
    }

    #[test]
    fn test_max_hops_reached_when_never_answered() -> anyhow::Result<()> {
        let (reason, hops) = run(&cfg(), network(5, vec![]))?;
        assert_eq!(CompletionReason::MaxHopsReached, reason);
        assert_eq!(5, hops.len());
        for (i, hop) in (0_u8..).zip(hops.iter()) {
            assert_eq!(TimeToLive(i + 1), hop.ttl());
            assert_eq!(Sequence(100 + u32::from(i)), hop.probe.sequence);
            assert_eq!(Port(55000 + u16::from(i)), hop.probe.src_port);
            assert_eq!(Port(33434 + u16::from(i)), hop.probe.dest_port);
            assert_eq!(HopState::HopTimedOut, hop.state);
            assert!(hop.response.is_none());
        }
        Ok(())
    }

    #[test]
    fn test_port_unreachable_terminates_hop() -> anyhow::Result<()> {
        let responses = vec![
            Ok(time_exceeded(ROUTER)),
            Ok(Recv::TimedOut),
            Ok(port_unreachable(Ipv4Addr::new(9, 9, 9, 9))),
        ];
        let (reason, hops) = run(&cfg(), network(3, responses))?;
        assert_eq!(CompletionReason::PortUnreachable, reason);
        assert_eq!(3, hops.len());
        assert_eq!(HopState::HopAnswered, hops[0].state);
        let response = hops[0].response.as_ref().unwrap();
        assert_eq!(ROUTER, response.addr);
        assert_eq!("router.lan", response.hostname);
        assert_eq!(Classification::IntermediateHop, response.classification);
        assert_eq!(HopState::HopTimedOut, hops[1].state);
        assert_eq!(TimeToLive(3), hops[2].ttl());
        assert_eq!(
            HopState::Finished(CompletionReason::PortUnreachable),
            hops[2].state
        );
        let response = hops[2].response.as_ref().unwrap();
        assert_eq!("9.9.9.9", response.hostname);
        assert_eq!(Classification::PortUnreachable, response.classification);
        Ok(())
    }

    #[test]
    fn test_port_unreachable_takes_precedence() -> anyhow::Result<()> {
        let late = SystemTime::now() + Duration::from_secs(60);
        let responses = vec![Ok(datagram(TARGET, 3, 3, late))];
        let (reason, hops) = run(&cfg(), network(1, responses))?;
        assert_eq!(CompletionReason::PortUnreachable, reason);
        assert_eq!(1, hops.len());
        Ok(())
    }

    #[test]
    fn test_address_match_takes_precedence_over_timeout() -> anyhow::Result<()> {
        let late = SystemTime::now() + Duration::from_secs(60);
        let responses = vec![Ok(time_exceeded(ROUTER)), Ok(datagram(TARGET, 11, 0, late))];
        let (reason, hops) = run(&cfg(), network(2, responses))?;
        assert_eq!(CompletionReason::AddressMatch, reason);
        assert_eq!(
            HopState::Finished(CompletionReason::AddressMatch),
            hops[1].state
        );
        Ok(())
    }

    #[test]
    fn test_late_response_times_out() -> anyhow::Result<()> {
        let late = SystemTime::now() + Duration::from_secs(60);
        let responses = vec![Ok(datagram(ROUTER, 11, 0, late))];
        let (reason, hops) = run(&cfg(), network(1, responses))?;
        assert_eq!(CompletionReason::Timeout, reason);
        let response = hops[0].response.as_ref().unwrap();
        assert!(response.rtt > Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn test_malformed_response_is_unanswered() -> anyhow::Result<()> {
        let malformed = syntrace_packet::error::Error::InsufficientPacketBuffer(
            String::from("IcmpPacket"),
            8,
            4,
        );
        let responses = vec![
            Err(Error::MalformedHeader(malformed)),
            Ok(port_unreachable(TARGET)),
        ];
        let (reason, hops) = run(&cfg(), network(2, responses))?;
        assert_eq!(CompletionReason::PortUnreachable, reason);
        assert_eq!(HopState::HopTimedOut, hops[0].state);
        assert!(hops[0].response.is_none());
        Ok(())
    }

    #[test]
    fn test_reverse_dns_disabled() -> anyhow::Result<()> {
        let config = SessionConfig {
            reverse_dns: false,
            ..cfg()
        };
        let responses = vec![Ok(port_unreachable(ROUTER))];
        let (_, hops) = run(&config, network(1, responses))?;
        assert_eq!("10.0.0.1", hops[0].response.as_ref().unwrap().hostname);
        Ok(())
    }

    #[test]
    fn test_probes_per_hop() -> anyhow::Result<()> {
        let config = SessionConfig {
            max_hops: TimeToLive(2),
            probes_per_hop: ProbesPerHop(7),
            ..cfg()
        };
        let mut network = MockNetwork::new();
        network.expect_open_listener().times(2).returning(|_| Ok(()));
        network.expect_close_listener().times(2).return_const(());
        network
            .expect_send_probe()
            .times(14)
            .returning(|_| Ok(()));
        network
            .expect_recv_probe()
            .times(2)
            .returning(|_| Ok(Recv::TimedOut));
        let (reason, _) = run(&config, network)?;
        assert_eq!(CompletionReason::MaxHopsReached, reason);
        Ok(())
    }

    #[test]
    fn test_listener_opened_for_probe_dest_port() -> anyhow::Result<()> {
        let mut network = MockNetwork::new();
        network
            .expect_open_listener()
            .withf(|probe| probe.dest_port == Port(33434) && probe.ttl == TimeToLive(1))
            .times(1)
            .returning(|_| Ok(()));
        network.expect_close_listener().times(1).return_const(());
        network.expect_send_probe().times(3).returning(|_| Ok(()));
        network
            .expect_recv_probe()
            .times(1)
            .returning(|_| Ok(port_unreachable(TARGET)));
        run(&cfg(), network)?;
        Ok(())
    }

    #[test]
    fn test_listener_closed_on_send_error() {
        let mut network = MockNetwork::new();
        network.expect_open_listener().times(1).returning(|_| Ok(()));
        network.expect_close_listener().times(1).return_const(());
        network.expect_send_probe().times(1).returning(|_| {
            Err(Error::TransportError(IoError::SendTo(
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                SocketAddr::new(IpAddr::V4(TARGET), 0),
            )))
        });
        network.expect_recv_probe().never();
        let err = run(&cfg(), network).unwrap_err();
        assert!(matches!(err, Error::TransportError(IoError::SendTo(_, _))));
    }

    #[test]
    fn test_open_listener_error_is_fatal() {
        let mut network = MockNetwork::new();
        network.expect_open_listener().times(1).returning(|probe| {
            Err(Error::TransportError(IoError::Bind(
                std::io::Error::from(std::io::ErrorKind::AddrInUse),
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), probe.dest_port.0),
            )))
        });
        network.expect_close_listener().never();
        network.expect_send_probe().never();
        let err = run(&cfg(), network).unwrap_err();
        assert!(matches!(err, Error::TransportError(IoError::Bind(_, _))));
    }

    #[test]
    fn test_recv_error_is_fatal() {
        let responses = vec![Err(Error::NoListener)];
        let err = run(&cfg(), network(1, responses)).unwrap_err();
        assert!(matches!(err, Error::NoListener));
    }
}
