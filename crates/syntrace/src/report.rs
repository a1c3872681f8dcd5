use std::net::Ipv4Addr;
use std::time::Duration;
use syntrace_core::{CompletionReason, HopResult, Tracer};
use syntrace_dns::Resolver;
use tracing::instrument;

/// Run the trace, printing each hop as it completes followed by the reason the trace finished.
#[instrument(skip_all, level = "trace")]
pub fn report<R: Resolver>(tracer: &Tracer, target: &str, resolver: &R) -> anyhow::Result<()> {
    let config = tracer.config();
    println!(
        "{}",
        format_header(
            target,
            tracer.target_addr(),
            config.max_hops.0,
            config.hop_timeout
        )
    );
    let reason = tracer.run_with(resolver, |hop| println!("{}", format_hop(hop)))?;
    println!("{}", format_completion(reason));
    Ok(())
}

fn format_header(target: &str, addr: Ipv4Addr, max_hops: u8, hop_timeout: Duration) -> String {
    format!(
        "traceroute to {target} ({addr}), {max_hops} hops max, {}ms timeout",
        hop_timeout.as_millis()
    )
}

fn format_hop(hop: &HopResult) -> String {
    let ttl = hop.ttl().0;
    match &hop.response {
        Some(response) => {
            let rtt = response.rtt.as_secs_f64() * 1000_f64;
            format!(
                "{ttl:<3} {} ({}) {rtt:.2} ms",
                response.hostname, response.addr
            )
        }
        None => format!("{ttl:<4} *"),
    }
}

const fn format_completion(reason: CompletionReason) -> &'static str {
    match reason {
        CompletionReason::PortUnreachable => "Finished traceroute, ICMP",
        CompletionReason::AddressMatch => "Finished traceroute, Addr",
        CompletionReason::Timeout => "Timeout",
        CompletionReason::MaxHopsReached => "Finished traceroute, maxhops reached",
    }
}
