//! Best-effort hostname enrichment.
//!
//! Reverse DNS is the primary source; on Windows `ping -a` name echo is the
//! fallback because home routers often answer NetBIOS-style names there that
//! the resolver misses. Lookups are capped per call and a record without a
//! resolvable name simply keeps `name: None`.

use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::{is_private_unicast, NeighborRecord};

/// Per-lookup cutoff. `lookup_addr` itself has no timeout hook, so the
/// lookup runs on a watchdog thread and is abandoned past this bound.
const REVERSE_DNS_TIMEOUT: Duration = Duration::from_millis(500);

#[cfg(windows)]
const PING_TIMEOUT_MS: u32 = 300;

/// Reverse-resolve `ip`, abandoning the attempt after the timeout.
fn reverse_dns(ip: &str) -> Option<String> {
    let addr: IpAddr = ip.parse().ok()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(dns_lookup::lookup_addr(&addr).ok());
    });
    match rx.recv_timeout(REVERSE_DNS_TIMEOUT) {
        Ok(Some(name)) if !name.is_empty() && name != ip => Some(name),
        _ => None,
    }
}

/// Extract the resolved name from `ping -a` output:
/// `Pinging NAME [ip] with 32 bytes of data:`.
#[cfg(any(windows, test))]
fn parse_ping_name(output: &str, ip: &str) -> Option<String> {
    let marker = format!("[{}]", ip);
    for line in output.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("Pinging ") else {
            continue;
        };
        let Some(bracket) = rest.find(&marker) else {
            continue;
        };
        let name = rest[..bracket].trim();
        if !name.is_empty() && name != ip {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(windows)]
fn ping_name(ip: &str) -> Option<String> {
    let output = crate::system::run_command(
        "ping",
        &["-a", "-n", "1", "-w", &PING_TIMEOUT_MS.to_string(), ip],
    );
    parse_ping_name(&output, ip)
}

#[cfg(not(windows))]
fn ping_name(_ip: &str) -> Option<String> {
    None
}

/// Attach resolved names to up to `max_lookups` private-unicast records.
/// Never fails: records that don't resolve are passed through unchanged.
pub fn enrich_with_names(
    records: Vec<NeighborRecord>,
    max_lookups: usize,
) -> Vec<NeighborRecord> {
    let mut attempted = 0;
    records
        .into_iter()
        .map(|mut record| {
            if attempted < max_lookups && is_private_unicast(&record.ip) {
                attempted += 1;
                if let Some(name) = reverse_dns(&record.ip).or_else(|| ping_name(&record.ip)) {
                    record.name = Some(name);
                }
            }
            record
        })
        .collect()
}
