use crate::config::{LogFormat, LogSpanEvents, SyntraceConfig};
use crate::report;
use anyhow::anyhow;
use std::net::IpAddr;
use syntrace_core::{Builder, Tracer};
use syntrace_dns::{DnsResolver, Resolver};
use tracing_subscriber::fmt::format::FmtSpan;

/// Run the syntrace application.
pub fn run_syntrace(cfg: &SyntraceConfig) -> anyhow::Result<()> {
    configure_logging(cfg);
    let resolver = start_dns_resolver(cfg)?;
    let addr = resolve_target(cfg, &resolver)?;
    let tracer = make_tracer(cfg, addr)?;
    report::report(&tracer, &cfg.target, &resolver)
}

/// Build the tracer for the resolved target.
///
/// Raw socket privileges stay in effect for the whole trace as every hop opens a new listener.
fn make_tracer(cfg: &SyntraceConfig, target_addr: IpAddr) -> anyhow::Result<Tracer> {
    Ok(Builder::new(target_addr)
        .interface(cfg.interface.clone())
        .source_addr(cfg.source_addr)
        .max_hops(cfg.max_hops)
        .hop_timeout(cfg.hop_timeout)
        .read_timeout(cfg.read_timeout)
        .probes_per_hop(cfg.probes_per_hop)
        .initial_sequence(cfg.initial_sequence)
        .source_port(cfg.source_port)
        .dest_port(cfg.dest_port)
        .reverse_dns(cfg.dns_lookup)
        .build()?)
}

/// Resolve the target to the first `IPv4` address found.
fn resolve_target(cfg: &SyntraceConfig, resolver: &DnsResolver) -> anyhow::Result<IpAddr> {
    resolver
        .lookup(&cfg.target)
        .map_err(|err| anyhow!("failed to resolve target: {} ({})", cfg.target, err))?
        .first()
        .ok_or_else(|| anyhow!("failed to find any valid IPv4 address for {}", cfg.target))
}

/// Start the DNS resolver.
fn start_dns_resolver(cfg: &SyntraceConfig) -> anyhow::Result<DnsResolver> {
    Ok(DnsResolver::start(syntrace_dns::Config::new(
        cfg.dns_resolve_method,
        cfg.dns_timeout,
        cfg.dns_ttl,
    ))?)
}

/// Logs are written to stderr so they never interleave with the report on stdout.
fn configure_logging(cfg: &SyntraceConfig) {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .json()
                    .init();
            }
        }
    }
}
