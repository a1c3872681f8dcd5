use anyhow::anyhow;
use clap::ValueEnum;
use file::ConfigFile;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use syntrace_core::{defaults, MAX_PROBES_PER_HOP, MAX_TTL};
use syntrace_dns::ResolveMethod;
use syntrace_privilege::Privilege;

mod cmd;
mod constants;
mod file;

pub use cmd::Args;

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DnsResolveMethodConfig {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct SyntraceConfig {
    pub target: String,
    pub max_hops: u8,
    pub hop_timeout: Duration,
    pub read_timeout: Option<Duration>,
    pub probes_per_hop: u8,
    pub source_port: u16,
    pub dest_port: Option<u16>,
    pub initial_sequence: Option<u32>,
    pub source_addr: Option<IpAddr>,
    pub interface: Option<String>,
    pub dns_resolve_method: ResolveMethod,
    pub dns_lookup: bool,
    pub dns_timeout: Duration,
    pub dns_ttl: Duration,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl SyntraceConfig {
    pub fn from(args: Args, privilege: &Privilege) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        Self::build_config(args, cfg_file, privilege)
    }

    fn build_config(
        args: Args,
        cfg_file: ConfigFile,
        privilege: &Privilege,
    ) -> anyhow::Result<Self> {
        let cfg_file_trace = cfg_file.trace.unwrap_or_default();
        let cfg_file_dns = cfg_file.dns.unwrap_or_default();
        let cfg_file_log = cfg_file.log.unwrap_or_default();
        let target = args.targets.join(" ");
        let max_hops = cfg_layer(
            args.max_hops,
            cfg_file_trace.max_hops,
            defaults::DEFAULT_MAX_HOPS,
        );
        let hop_timeout = cfg_layer(
            args.hop_timeout,
            cfg_file_trace.hop_timeout,
            defaults::DEFAULT_HOP_TIMEOUT,
        );
        let read_timeout = cfg_layer_opt(args.read_timeout, cfg_file_trace.read_timeout);
        let probes_per_hop = cfg_layer(
            args.probes_per_hop,
            cfg_file_trace.probes_per_hop,
            defaults::DEFAULT_PROBES_PER_HOP,
        );
        let source_port = cfg_layer(
            args.source_port,
            cfg_file_trace.source_port,
            defaults::DEFAULT_SOURCE_PORT,
        );
        let dest_port = cfg_layer_opt(args.dest_port, cfg_file_trace.dest_port);
        let initial_sequence =
            cfg_layer_opt(args.initial_sequence, cfg_file_trace.initial_sequence);
        let source_addr = cfg_layer_opt(args.source_address, cfg_file_trace.source_address);
        let interface = cfg_layer_opt(args.interface, cfg_file_trace.interface);
        let dns_resolve_method = cfg_layer(
            args.dns_resolve_method,
            cfg_file_dns.dns_resolve_method,
            constants::DEFAULT_DNS_RESOLVE_METHOD,
        );
        let dns_lookup = if args.no_dns {
            false
        } else {
            cfg_layer(
                args.dns_lookup,
                cfg_file_dns.dns_lookup,
                defaults::DEFAULT_REVERSE_DNS,
            )
        };
        let dns_timeout = cfg_layer(
            args.dns_timeout,
            cfg_file_dns.dns_timeout,
            constants::DEFAULT_DNS_TIMEOUT,
        );
        let dns_ttl = cfg_layer(
            args.dns_ttl,
            cfg_file_dns.dns_ttl,
            constants::DEFAULT_DNS_TTL,
        );
        let verbose = args.verbose;
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_log.log_format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_log.log_filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_log.log_span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        privilege.require()?;
        validate_max_hops(max_hops)?;
        validate_probes_per_hop(probes_per_hop)?;
        validate_timeout("hop-timeout", hop_timeout)?;
        if let Some(read_timeout) = read_timeout {
            validate_timeout("read-timeout", read_timeout)?;
        }
        validate_timeout("dns-timeout", dns_timeout)?;
        validate_source(source_addr, interface.as_deref())?;
        Ok(Self {
            target,
            max_hops,
            hop_timeout,
            read_timeout,
            probes_per_hop,
            source_port,
            dest_port,
            initial_sequence,
            source_addr,
            interface,
            dns_resolve_method: dns_resolve_method.into(),
            dns_lookup,
            dns_timeout,
            dns_ttl,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for SyntraceConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            max_hops: defaults::DEFAULT_MAX_HOPS,
            hop_timeout: defaults::DEFAULT_HOP_TIMEOUT,
            read_timeout: None,
            probes_per_hop: defaults::DEFAULT_PROBES_PER_HOP,
            source_port: defaults::DEFAULT_SOURCE_PORT,
            dest_port: None,
            initial_sequence: None,
            source_addr: None,
            interface: None,
            dns_resolve_method: constants::DEFAULT_DNS_RESOLVE_METHOD.into(),
            dns_lookup: defaults::DEFAULT_REVERSE_DNS,
            dns_timeout: constants::DEFAULT_DNS_TIMEOUT,
            dns_ttl: constants::DEFAULT_DNS_TTL,
            verbose: false,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

impl From<DnsResolveMethodConfig> for ResolveMethod {
    fn from(value: DnsResolveMethodConfig) -> Self {
        match value {
            DnsResolveMethodConfig::System => Self::System,
            DnsResolveMethodConfig::Resolv => Self::Resolv,
            DnsResolveMethodConfig::Google => Self::Google,
            DnsResolveMethodConfig::Cloudflare => Self::Cloudflare,
        }
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

fn validate_max_hops(max_hops: u8) -> anyhow::Result<()> {
    if (1..=MAX_TTL).contains(&max_hops) {
        Ok(())
    } else {
        Err(anyhow!(
            "max-hops ({max_hops}) must be between 1 and {MAX_TTL} inclusive"
        ))
    }
}

fn validate_probes_per_hop(probes_per_hop: u8) -> anyhow::Result<()> {
    if (1..=MAX_PROBES_PER_HOP).contains(&probes_per_hop) {
        Ok(())
    } else {
        Err(anyhow!(
            "probes-per-hop ({probes_per_hop}) must be between 1 and {MAX_PROBES_PER_HOP} inclusive"
        ))
    }
}

fn validate_timeout(name: &str, timeout: Duration) -> anyhow::Result<()> {
    if timeout.is_zero() {
        Err(anyhow!("{name} ({timeout:?}) must be greater than zero"))
    } else {
        Ok(())
    }
}

/// Validate the source address.
///
/// The `interface` option conflicts with `source-address` on the command line but both may be
/// given by mixing the command line and the config file.
fn validate_source(source_addr: Option<IpAddr>, interface: Option<&str>) -> anyhow::Result<()> {
    match (source_addr, interface) {
        (Some(_), Some(_)) => Err(anyhow!(
            "source-address and interface cannot be given together"
        )),
        (Some(IpAddr::V6(addr)), None) => Err(anyhow!(
            "source-address ({addr}) must be an IPv4 address"
        )),
        _ => Ok(()),
    }
}
