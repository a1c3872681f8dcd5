use crate::config::{DnsResolveMethodConfig, LogFormat, LogSpanEvents};
use clap::builder::Styles;
use clap::{ArgAction, Parser};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Trace the route to a host with TCP SYN probes
#[derive(Parser, Debug)]
#[command(name = "syntrace", author, version, about, long_about = None, arg_required_else_help(true), styles=Styles::styled())]
pub struct Args {
    /// The hostname or IP to trace, multiple words are joined with a space
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// The maximum number of hops to probe [default: 30]
    #[arg(short = 'm', long)]
    pub max_hops: Option<u8>,

    /// Responses arriving later than this end the trace [default: 5s]
    #[arg(short = 'w', long, value_parser = parse_duration)]
    pub hop_timeout: Option<Duration>,

    /// How long to wait for a response to each hop [default: hop-timeout]
    #[arg(long, value_parser = parse_duration)]
    pub read_timeout: Option<Duration>,

    /// The number of probes to send for each hop [default: 3]
    #[arg(short = 'q', long)]
    pub probes_per_hop: Option<u8>,

    /// The TCP source port of the first hop [default: 55000]
    #[arg(short = 'S', long)]
    pub source_port: Option<u16>,

    /// The TCP destination port of the first hop [default: random from 33434]
    #[arg(short = 'p', long)]
    pub dest_port: Option<u16>,

    /// The TCP sequence number of the first hop [default: random]
    #[arg(long)]
    pub initial_sequence: Option<u32>,

    /// The source IP address [default: auto]
    #[arg(short = 'A', long, value_parser = parse_addr, conflicts_with = "interface")]
    pub source_address: Option<IpAddr>,

    /// The network interface [default: auto]
    #[arg(short = 'I', long)]
    pub interface: Option<String>,

    /// How to perform DNS queries [default: system]
    #[arg(value_enum, short = 'r', long)]
    pub dns_resolve_method: Option<DnsResolveMethodConfig>,

    /// The maximum time to wait to perform DNS queries [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub dns_timeout: Option<Duration>,

    /// The time-to-live (TTL) of reverse DNS cache entries [default: 300s]
    #[arg(long, value_parser = parse_duration)]
    pub dns_ttl: Option<Duration>,

    /// Reverse resolve the address of each responding host [default: true]
    #[arg(long, action = ArgAction::Set, conflicts_with = "no_dns")]
    pub dns_lookup: Option<bool>,

    /// Do not reverse resolve responding hosts
    #[arg(short = 'n', long)]
    pub no_dns: bool,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// The debug log format [default: pretty]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: syntrace=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log format [default: off]
    #[arg(long)]
    pub log_span_events: Option<LogSpanEvents>,
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    Ok(humantime::parse_duration(value)?)
}

fn parse_addr(value: &str) -> anyhow::Result<IpAddr> {
    Ok(IpAddr::from_str(value)?)
}
