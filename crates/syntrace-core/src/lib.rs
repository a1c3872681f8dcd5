//! Syntrace - A TCP SYN traceroute library.
//!
//! This crate provides the probing engine used by the standalone `syntrace` application.
//!
//! A trace sends crafted `TCP` SYN probes with an increasing time-to-live (TTL), one hop at a
//! time, and observes the `ICMP` errors the probes provoke at each router along the path. The
//! trace completes when the target responds, when a response arrives too late, or when the
//! maximum number of hops has been probed.
//!
//! # Example
//!
//! The following example builds and runs a tracer with default configuration and prints out
//! each hop as it completes:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::str::FromStr;
//! use syntrace_core::Builder;
//! use syntrace_dns::{Config, DnsResolver};
//!
//! let resolver = DnsResolver::start(Config::default())?;
//! let addr = IpAddr::from_str("1.1.1.1")?;
//! let reason = Builder::new(addr)
//!     .build()?
//!     .run_with(&resolver, |hop| println!("{:?}", hop))?;
//! println!("{:?}", reason);
//! # Ok(())
//! # }
//! ```
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Tracer`].
//! - [`Tracer::run_with`] - Run the tracer with a custom hop handler.
//! - [`ProbeSession`] - The hop state machine, over any [`Network`].
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc
)]
#![deny(unsafe_code)]

mod builder;
mod config;
mod constants;
mod error;
mod net;
mod probe;
mod session;
mod tracer;
mod types;

pub use builder::Builder;
pub use config::{defaults, ChannelConfig, SessionConfig};
pub use constants::{MAX_PROBES_PER_HOP, MAX_TTL};
pub use error::{Error, IoError, IoOperation, IoResult, Result};
pub use net::{extract_datagram, Network, Recv};
pub use probe::{
    Classification, CompletionReason, HopResponse, HopResult, HopState, IcmpPacketCode,
    IcmpPacketType, Probe, ReceivedDatagram,
};
pub use session::ProbeSession;
pub use tracer::Tracer;
pub use types::{Port, ProbesPerHop, Sequence, TimeToLive};
