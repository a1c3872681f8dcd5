#![allow(clippy::struct_excessive_bools, clippy::redundant_pub_crate)]
#![forbid(unsafe_code)]

use crate::config::SyntraceConfig;
use clap::Parser;
use config::Args;
use syntrace_privilege::Privilege;

mod app;
mod config;
mod report;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let privilege = Privilege::acquire_privileges()?;
    let cfg = SyntraceConfig::from(args, &privilege)?;
    app::run_syntrace(&cfg)
}
