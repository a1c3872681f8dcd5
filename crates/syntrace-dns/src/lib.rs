//! This crate provides a cheaply cloneable, blocking, caching, forward and reverse DNS resolver
//! for the syntrace TCP SYN traceroute.
//!
//! A reverse DNS lookup of an address is performed at most once per configured time-to-live
//! (TTL) unless the previous lookup failed or timed out, in which case it is retried.
//!
//! Forward lookups only ever return `IPv4` addresses.
//!
//! # Example
//!
//! The following example resolves a hostname and then performs a reverse DNS lookup of the
//! first address using the Cloudflare 1.1.1.1 public DNS service.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::time::Duration;
//! use syntrace_dns::{Config, DnsEntry, DnsResolver, ResolveMethod, Resolved, Resolver};
//!
//! let config = Config::new(
//!     ResolveMethod::Cloudflare,
//!     Duration::from_secs(5),
//!     Duration::from_secs(300),
//! );
//! let resolver = DnsResolver::start(config)?;
//! let addrs = resolver.lookup("example.com")?;
//! if let Some(addr) = addrs.first() {
//!     match resolver.reverse_lookup(addr) {
//!         DnsEntry::Resolved(Resolved(ip, hosts)) => println!("{ip} resolved to {hosts:?}"),
//!         entry => println!("lookup of {} did not resolve: {entry}", entry.addr()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod caching_resolver;
mod config;
mod resolver;

pub use caching_resolver::{DnsResolver, ResolveMethod};
pub use config::{Builder, Config};
pub use resolver::{
    DnsEntry, Error, Resolved, ResolvedHostnames, ResolvedIpAddrs, Resolver, Result, Unresolved,
};
