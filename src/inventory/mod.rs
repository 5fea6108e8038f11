//! LAN device inventory.
//!
//! Discovery shells out to whatever tools the platform offers and merges
//! their partial views into one device list. Methods are tried in priority
//! order per target subnet — dedicated ARP scanner, then nmap ping sweep,
//! then a passive neighbor-table read — and the first one that yields any
//! record wins. Every external failure degrades to an empty result so the
//! next method gets its turn.

pub mod enrich;
pub mod parsers;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::config::{ensure_parent, Paths};
use crate::error::{LanshieldError, Result};
use crate::system::{detect_subnets, has_command, run_command};

/// One discovered LAN device association with provenance.
///
/// `ip` is always a dotted-quad where the parser could validate it; `mac`
/// is normalized or empty; `state` and `iface` are free-text tokens from
/// the source tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRecord {
    pub ip: String,
    pub mac: String,
    pub state: String,
    pub iface: String,
    pub source: String,
    pub name: Option<String>,
    pub vendor: Option<String>,
}

impl NeighborRecord {
    pub fn new(ip: &str, mac: &str, state: &str, iface: &str, source: &str) -> Self {
        Self {
            ip: ip.to_string(),
            mac: mac.to_string(),
            state: state.to_string(),
            iface: iface.to_string(),
            source: source.to_string(),
            name: None,
            vendor: None,
        }
    }

    /// Identity for deduplication.
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.ip, &self.mac, &self.iface)
    }
}

/// RFC1918 unicast check; anything unparseable is not private.
pub fn is_private_unicast(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>().map(|v4| v4.is_private()).unwrap_or(false)
}

fn is_multicast_or_broadcast(ip: &str, mac: &str) -> bool {
    let Ok(v4) = ip.parse::<Ipv4Addr>() else {
        return true;
    };
    let octets = v4.octets();
    if v4.is_multicast() || v4.is_broadcast() || v4.is_unspecified() || octets[3] == 255 {
        return true;
    }
    let mac = mac.to_ascii_uppercase();
    mac.starts_with("FF:FF:FF:FF:FF:FF") || mac.starts_with("01:00:5E:")
}

/// Drop multicast/broadcast noise and everything outside the private ranges.
pub fn filter_noise(records: Vec<NeighborRecord>) -> Vec<NeighborRecord> {
    records
        .into_iter()
        .filter(|r| !is_multicast_or_broadcast(&r.ip, &r.mac))
        .filter(|r| is_private_unicast(&r.ip))
        .collect()
}

/// Append `incoming` records whose dedup key isn't already present.
/// Order-preserving; the first source to report a key wins.
pub fn merge(mut existing: Vec<NeighborRecord>, incoming: Vec<NeighborRecord>) -> Vec<NeighborRecord> {
    fn owned_key(record: &NeighborRecord) -> (String, String, String) {
        let (ip, mac, iface) = record.dedup_key();
        (ip.to_string(), mac.to_string(), iface.to_string())
    }

    let mut seen: std::collections::HashSet<(String, String, String)> =
        existing.iter().map(owned_key).collect();
    for record in incoming {
        if seen.insert(owned_key(&record)) {
            existing.push(record);
        }
    }
    existing
}

fn ipv4_sort_key(ip: &str) -> u32 {
    ip.parse::<Ipv4Addr>().map(u32::from).unwrap_or(0)
}

/// Sort ascending by IP interpreted as a 32-bit big-endian integer.
/// Invalid IPs sort first, as 0.0.0.0.
pub fn sort_by_ip(records: &mut [NeighborRecord]) {
    records.sort_by_key(|r| ipv4_sort_key(&r.ip));
}

/// A neighbor-table source: the command to run and the parser for its
/// output. Listed in priority order per platform.
struct NeighborSource {
    program: &'static str,
    args: &'static [&'static str],
    parse: parsers::ParseFn,
}

impl NeighborSource {
    fn read(&self) -> Vec<NeighborRecord> {
        (self.parse)(&run_command(self.program, self.args))
    }
}

#[cfg(windows)]
const NEIGHBOR_SOURCES: &[NeighborSource] = &[
    NeighborSource {
        program: "powershell",
        args: &[
            "-NoProfile",
            "-Command",
            "Get-NetNeighbor -AddressFamily IPv4 | ConvertTo-Json -Compress",
        ],
        parse: parsers::parse_net_neighbor_json,
    },
    NeighborSource {
        program: "arp",
        args: &["-a"],
        parse: parsers::parse_arp_table_windows,
    },
];

#[cfg(not(windows))]
const NEIGHBOR_SOURCES: &[NeighborSource] = &[
    NeighborSource {
        program: "ip",
        args: &["neigh"],
        parse: parsers::parse_ip_neigh,
    },
    NeighborSource {
        program: "arp",
        args: &["-a"],
        parse: parsers::parse_arp_table_unix,
    },
];

/// Passive neighbor-table read: the platform's table sources in priority
/// order, merged on Windows (both views are partial there), first-hit
/// elsewhere; deduplicated, noise-filtered and sorted.
pub fn scan_neighbors() -> Vec<NeighborRecord> {
    let mut records = Vec::new();
    for source in NEIGHBOR_SOURCES {
        if cfg!(windows) {
            records = merge(records, source.read());
        } else if records.is_empty() {
            records = source.read();
        }
    }
    let mut records = filter_noise(records);
    sort_by_ip(&mut records);
    records
}

/// Active scan with `arp-scan`, when installed. Not available on Windows.
pub fn scan_with_arpscan(subnet: Option<&str>) -> Vec<NeighborRecord> {
    if cfg!(windows) || !has_command("arp-scan") {
        return Vec::new();
    }
    let output = match subnet {
        Some(subnet) => run_command("arp-scan", &["--numeric", subnet]),
        None => run_command("arp-scan", &["--numeric", "-l"]),
    };
    filter_noise(parsers::parse_arpscan(&output))
}

/// Ping-scan a subnet with nmap, parsing its XML output.
pub fn scan_with_nmap(subnet: &str) -> Vec<NeighborRecord> {
    if !has_command("nmap") {
        return Vec::new();
    }
    let output = run_command("nmap", &["-sn", subnet, "-oX", "-"]);
    filter_noise(parsers::parse_nmap_xml(&output))
}

/// Run nmap across every detected subnet and merge the results.
pub fn force_nmap_scan() -> Vec<NeighborRecord> {
    let mut all = Vec::new();
    for subnet in detect_subnets() {
        let part = scan_with_nmap(&subnet);
        if !part.is_empty() {
            all = merge(all, part);
        }
    }
    sort_by_ip(&mut all);
    all
}

/// Best-effort scan: for each target subnet (explicit, or auto-detected)
/// try arp-scan, then nmap (only with a concrete subnet), then the passive
/// neighbor table; merge across targets.
pub fn smart_scan(subnet: Option<&str>) -> Vec<NeighborRecord> {
    let targets: Vec<Option<String>> = match subnet {
        Some(subnet) => vec![Some(subnet.to_string())],
        None => {
            let detected = detect_subnets();
            if detected.is_empty() {
                vec![None]
            } else {
                detected.into_iter().map(Some).collect()
            }
        }
    };

    let mut records = Vec::new();
    for target in targets {
        let mut part = scan_with_arpscan(target.as_deref());
        if part.is_empty() {
            if let Some(ref subnet) = target {
                part = scan_with_nmap(subnet);
            }
        }
        if part.is_empty() {
            part = scan_neighbors();
        }
        records = merge(records, part);
    }
    sort_by_ip(&mut records);
    records
}

/// Smart-scan, enrich with names, and write the CSV snapshot.
pub fn export_csv(paths: &Paths) -> Result<PathBuf> {
    let records = smart_scan(None);
    let records = enrich::enrich_with_names(records, 100);
    let out = paths.devices_csv();
    ensure_parent(&out)?;

    let mut writer = csv::Writer::from_path(&out).map_err(|e| {
        LanshieldError::Storage {
            path: out.clone(),
            source: std::io::Error::other(e),
        }
    })?;
    write_records(&mut writer, &records).map_err(|e| LanshieldError::Storage {
        path: out.clone(),
        source: std::io::Error::other(e),
    })?;
    Ok(out)
}

fn write_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    records: &[NeighborRecord],
) -> std::result::Result<(), csv::Error> {
    writer.write_record(["ip", "name", "mac", "state", "iface", "src"])?;
    for r in records {
        writer.write_record([
            r.ip.as_str(),
            r.name.as_deref().unwrap_or(""),
            r.mac.as_str(),
            r.state.as_str(),
            r.iface.as_str(),
            r.source.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ip: &str, mac: &str, iface: &str) -> NeighborRecord {
        NeighborRecord::new(ip, mac, "reachable", iface, "test")
    }

    #[test]
    fn test_filter_noise() {
        let records = vec![
            record("224.0.0.1", "01:00:5E:00:00:01", "eth0"),
            record("192.168.1.255", "", "eth0"),
            record("0.0.0.0", "", "eth0"),
            record("255.255.255.255", "", "eth0"),
            record("192.168.1.20", "FF:FF:FF:FF:FF:FF", "eth0"),
            record("8.8.8.8", "D8:BB:C1:12:34:56", "eth0"),
            record("192.168.1.10", "D8:BB:C1:12:34:56", "eth0"),
        ];
        let kept = filter_noise(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ip, "192.168.1.10");
    }

    #[test]
    fn test_is_private_unicast() {
        assert!(is_private_unicast("10.1.2.3"));
        assert!(is_private_unicast("172.16.0.1"));
        assert!(is_private_unicast("172.31.255.254"));
        assert!(is_private_unicast("192.168.0.1"));
        assert!(!is_private_unicast("172.32.0.1"));
        assert!(!is_private_unicast("8.8.8.8"));
        assert!(!is_private_unicast("not-an-ip"));
    }

    #[test]
    fn test_merge_first_source_wins() {
        let existing = vec![record("192.168.1.2", "", "eth0")];
        let incoming = vec![
            record("192.168.1.2", "", "eth0"),
            record("192.168.1.3", "", "eth0"),
        ];
        let merged = merge(existing, incoming);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].ip, "192.168.1.2");
        assert_eq!(merged[1].ip, "192.168.1.3");
    }

    #[test]
    fn test_merge_distinguishes_iface() {
        let existing = vec![record("192.168.1.2", "", "eth0")];
        let incoming = vec![record("192.168.1.2", "", "wlan0")];
        assert_eq!(merge(existing, incoming).len(), 2);
    }

    #[test]
    fn test_sort_by_ip_numeric() {
        let mut records = vec![
            record("192.168.1.10", "", "eth0"),
            record("192.168.1.2", "", "eth0"),
        ];
        sort_by_ip(&mut records);
        assert_eq!(records[0].ip, "192.168.1.2");
        assert_eq!(records[1].ip, "192.168.1.10");
    }

    #[test]
    fn test_sort_invalid_ip_first() {
        let mut records = vec![
            record("192.168.1.2", "", "eth0"),
            record("garbage", "", "eth0"),
        ];
        sort_by_ip(&mut records);
        assert_eq!(records[0].ip, "garbage");
    }

    #[test]
    fn test_csv_shape() {
        let mut named = record("192.168.1.2", "D8:BB:C1:12:34:56", "eth0");
        named.name = Some("printer.lan".to_string());
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_records(&mut writer, &[named]).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "ip,name,mac,state,iface,src\n192.168.1.2,printer.lan,D8:BB:C1:12:34:56,reachable,eth0,test\n"
        );
    }
}
