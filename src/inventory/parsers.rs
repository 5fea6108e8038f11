//! Parsers for discovery-tool output.
//!
//! One parser per tool grammar, all with the same shape: take the raw
//! stdout, return the records that could be extracted. Lines or documents
//! that don't match are skipped, never an error — the caller decides
//! whether an empty result means "try the next tool".

use std::net::Ipv4Addr;

use serde::Deserialize;

use super::NeighborRecord;
use crate::license::normalize_mac;

/// Parser signature shared by every tool grammar, so scan paths can hold
/// them in priority-ordered lists.
pub type ParseFn = fn(&str) -> Vec<NeighborRecord>;

fn is_ipv4(token: &str) -> bool {
    token.parse::<Ipv4Addr>().is_ok()
}

/// Windows `arp -a`: `Interface:` headers group rows of
/// `<ip> <mac> <type>`.
pub fn parse_arp_table_windows(raw: &str) -> Vec<NeighborRecord> {
    let mut records = Vec::new();
    let mut current_iface = String::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Interface: 192.168.1.42 --- 0x9
        if let Some(rest) = line.strip_prefix("Interface:") {
            current_iface = rest.split("---").next().unwrap_or("").trim().to_string();
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() >= 3 && is_ipv4(tokens[0]) {
            records.push(NeighborRecord::new(
                tokens[0],
                &normalize_mac(tokens[1]),
                &tokens[2].to_ascii_lowercase(),
                &current_iface,
                "arp-a",
            ));
        }
    }
    records
}

/// Unix `arp -a`: `? (192.168.1.1) at d8:bb:c1:12:34:56 [ether] on eth0`.
/// Unresolved entries report `<incomplete>` in place of the MAC.
pub fn parse_arp_table_unix(raw: &str) -> Vec<NeighborRecord> {
    let mut records = Vec::new();
    for line in raw.lines() {
        let Some(open) = line.find('(') else { continue };
        let Some(close) = line[open..].find(')') else {
            continue;
        };
        let ip = &line[open + 1..open + close];
        if !is_ipv4(ip) {
            continue;
        }
        let rest = &line[open + close + 1..];
        let Some(at_pos) = rest.find(" at ") else {
            continue;
        };
        let after_at = &rest[at_pos + 4..];
        let Some(mac_token) = after_at.split_whitespace().next() else {
            continue;
        };
        let Some(on_pos) = rest.find(" on ") else {
            continue;
        };
        let Some(iface) = rest[on_pos + 4..].split_whitespace().next() else {
            continue;
        };

        let (mac, state) = if mac_token == "<incomplete>" {
            (String::new(), "incomplete")
        } else {
            let normalized = normalize_mac(mac_token);
            if normalized.is_empty() {
                continue;
            }
            (normalized, "reachable")
        };
        records.push(NeighborRecord::new(ip, &mac, state, iface, "arp-a"));
    }
    records
}

/// `ip neigh`: `<ip> dev <iface> [lladdr <mac>] <STATE>`.
pub fn parse_ip_neigh(raw: &str) -> Vec<NeighborRecord> {
    let mut records = Vec::new();
    for line in raw.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 || !is_ipv4(tokens[0]) || tokens[1] != "dev" {
            continue;
        }
        let ip = tokens[0];
        let iface = tokens[2];
        let mac = if tokens[3] == "lladdr" {
            tokens.get(4).map(|t| normalize_mac(t)).unwrap_or_default()
        } else {
            String::new()
        };
        let state = tokens.last().unwrap_or(&"").to_string();
        records.push(NeighborRecord::new(ip, &mac, &state, iface, "ip-neigh"));
    }
    records
}

/// `arp-scan --numeric`: `<ip>\t<mac>\t<vendor...>` rows between the
/// Interface/Starting header and the Ending footer.
pub fn parse_arpscan(raw: &str) -> Vec<NeighborRecord> {
    let mut records = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with("Interface:")
            || line.starts_with("Starting")
            || line.starts_with("Ending")
        {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 || !is_ipv4(tokens[0]) {
            continue;
        }
        let mut record = NeighborRecord::new(
            tokens[0],
            &normalize_mac(tokens[1]),
            "up",
            "",
            "arp-scan",
        );
        if tokens.len() > 2 {
            record.vendor = Some(tokens[2..].join(" "));
        }
        records.push(record);
    }
    records
}

/// `nmap -sn <subnet> -oX -` XML: one record per up host, with MAC/vendor
/// when nmap ran privileged and the first reported hostname when present.
pub fn parse_nmap_xml(raw: &str) -> Vec<NeighborRecord> {
    let Ok(doc) = roxmltree::Document::parse(raw) else {
        return Vec::new();
    };
    let mut records = Vec::new();

    for host in doc.descendants().filter(|n| n.has_tag_name("host")) {
        if let Some(status) = host.children().find(|n| n.has_tag_name("status")) {
            if status.attribute("state") != Some("up") {
                continue;
            }
        }

        let mut ip: Option<&str> = None;
        let mut mac = String::new();
        let mut vendor: Option<String> = None;
        for address in host.children().filter(|n| n.has_tag_name("address")) {
            match address.attribute("addrtype") {
                Some("ipv4") => ip = address.attribute("addr"),
                Some("mac") => {
                    mac = normalize_mac(address.attribute("addr").unwrap_or(""));
                    vendor = address
                        .attribute("vendor")
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                }
                _ => {}
            }
        }

        let name = host
            .children()
            .find(|n| n.has_tag_name("hostnames"))
            .and_then(|hostnames| {
                hostnames
                    .children()
                    .find(|n| n.has_tag_name("hostname"))
            })
            .and_then(|hostname| hostname.attribute("name"))
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if let Some(ip) = ip {
            let mut record = NeighborRecord::new(ip, &mac, "up", "", "nmap");
            record.name = name;
            record.vendor = vendor;
            records.push(record);
        }
    }
    records
}

/// One entry of `Get-NetNeighbor | ConvertTo-Json`. PowerShell emits a bare
/// object for a single neighbor and an array otherwise, and serializes the
/// `State` enum as a number.
#[derive(Debug, Deserialize)]
struct NetNeighborEntry {
    #[serde(rename = "IPAddress")]
    ip: Option<String>,
    #[serde(rename = "LinkLayerAddress")]
    mac: Option<String>,
    #[serde(rename = "State")]
    state: Option<serde_json::Value>,
    #[serde(rename = "InterfaceAlias")]
    iface: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NetNeighborDoc {
    One(NetNeighborEntry),
    Many(Vec<NetNeighborEntry>),
}

fn neighbor_state_name(state: Option<&serde_json::Value>) -> String {
    match state {
        Some(serde_json::Value::String(s)) => s.to_ascii_lowercase(),
        Some(serde_json::Value::Number(n)) => match n.as_u64() {
            Some(0) => "unreachable",
            Some(1) => "incomplete",
            Some(2) => "probe",
            Some(3) => "delay",
            Some(4) => "stale",
            Some(5) => "reachable",
            Some(6) => "permanent",
            _ => "",
        }
        .to_string(),
        _ => String::new(),
    }
}

/// PowerShell `Get-NetNeighbor -AddressFamily IPv4 | ConvertTo-Json`.
pub fn parse_net_neighbor_json(raw: &str) -> Vec<NeighborRecord> {
    let entries = match serde_json::from_str::<NetNeighborDoc>(raw.trim()) {
        Ok(NetNeighborDoc::One(entry)) => vec![entry],
        Ok(NetNeighborDoc::Many(entries)) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let ip = entry.ip.filter(|ip| is_ipv4(ip))?;
            let mac = normalize_mac(entry.mac.as_deref().unwrap_or(""));
            let state = neighbor_state_name(entry.state.as_ref());
            let iface = entry.iface.unwrap_or_default();
            Some(NeighborRecord::new(
                &ip,
                &mac,
                &state,
                &iface,
                "net-neighbor",
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arp_table_windows() {
        let raw = "\
Interface: 192.168.1.42 --- 0x9
  Internet Address      Physical Address      Type
  192.168.1.1           d8-bb-c1-12-34-56     dynamic
  192.168.1.255         ff-ff-ff-ff-ff-ff     static
  224.0.0.22            01-00-5e-00-00-16     static
";
        let records = parse_arp_table_windows(raw);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ip, "192.168.1.1");
        assert_eq!(records[0].mac, "D8:BB:C1:12:34:56");
        assert_eq!(records[0].state, "dynamic");
        assert_eq!(records[0].iface, "192.168.1.42");
        assert_eq!(records[0].source, "arp-a");
    }

    #[test]
    fn test_parse_arp_table_unix() {
        let raw = "\
gateway (192.168.1.1) at d8:bb:c1:12:34:56 [ether] on eth0
? (192.168.1.77) at <incomplete> on eth0
garbage line without the expected shape
";
        let records = parse_arp_table_unix(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mac, "D8:BB:C1:12:34:56");
        assert_eq!(records[0].state, "reachable");
        assert_eq!(records[0].iface, "eth0");
        assert_eq!(records[1].mac, "");
        assert_eq!(records[1].state, "incomplete");
    }

    #[test]
    fn test_parse_ip_neigh() {
        let raw = "\
192.168.1.1 dev eth0 lladdr d8:bb:c1:12:34:56 REACHABLE
192.168.1.77 dev eth0  FAILED
fe80::1 dev eth0 lladdr d8:bb:c1:12:34:56 router STALE
";
        let records = parse_ip_neigh(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip, "192.168.1.1");
        assert_eq!(records[0].mac, "D8:BB:C1:12:34:56");
        assert_eq!(records[0].state, "REACHABLE");
        assert_eq!(records[1].mac, "");
        assert_eq!(records[1].state, "FAILED");
    }

    #[test]
    fn test_parse_arpscan() {
        let raw = "\
Interface: eth0, type: EN10MB, MAC: d8:bb:c1:12:34:56, IPv4: 192.168.1.42
Starting arp-scan 1.10.0 with 256 hosts
192.168.1.1\td8:bb:c1:12:34:56\tAcme Networks Inc
192.168.1.13\t00:11:22:33:44:55\t(Unknown)
3 packets received by filter, 0 packets dropped by kernel
Ending arp-scan 1.10.0: 256 hosts scanned
";
        let records = parse_arpscan(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].vendor.as_deref(), Some("Acme Networks Inc"));
        assert_eq!(records[0].state, "up");
        assert_eq!(records[1].mac, "00:11:22:33:44:55");
    }

    #[test]
    fn test_parse_nmap_xml() {
        let raw = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="nmap -sn 192.168.1.0/24 -oX -">
<host><status state="up" reason="arp-response"/>
<address addr="192.168.1.1" addrtype="ipv4"/>
<address addr="D8:BB:C1:12:34:56" addrtype="mac" vendor="Acme"/>
<hostnames><hostname name="router.lan" type="PTR"/></hostnames>
</host>
<host><status state="down" reason="no-response"/>
<address addr="192.168.1.2" addrtype="ipv4"/>
</host>
<host><status state="up" reason="syn-ack"/>
<address addr="192.168.1.30" addrtype="ipv4"/>
<hostnames/>
</host>
</nmaprun>
"#;
        let records = parse_nmap_xml(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip, "192.168.1.1");
        assert_eq!(records[0].mac, "D8:BB:C1:12:34:56");
        assert_eq!(records[0].name.as_deref(), Some("router.lan"));
        assert_eq!(records[0].vendor.as_deref(), Some("Acme"));
        assert_eq!(records[1].ip, "192.168.1.30");
        assert_eq!(records[1].mac, "");
        assert_eq!(records[1].name, None);
    }

    #[test]
    fn test_parse_nmap_xml_garbage() {
        assert!(parse_nmap_xml("not xml at all").is_empty());
        assert!(parse_nmap_xml("").is_empty());
    }

    #[test]
    fn test_parse_net_neighbor_json_array() {
        let raw = r#"[
          {"IPAddress":"192.168.1.1","LinkLayerAddress":"d8-bb-c1-12-34-56","State":5,"InterfaceAlias":"Ethernet"},
          {"IPAddress":"192.168.1.20","LinkLayerAddress":"","State":4,"InterfaceAlias":"Wi-Fi"}
        ]"#;
        let records = parse_net_neighbor_json(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mac, "D8:BB:C1:12:34:56");
        assert_eq!(records[0].state, "reachable");
        assert_eq!(records[0].iface, "Ethernet");
        assert_eq!(records[1].state, "stale");
        assert_eq!(records[1].mac, "");
    }

    #[test]
    fn test_parse_net_neighbor_json_single_object() {
        let raw = r#"{"IPAddress":"192.168.1.1","LinkLayerAddress":"d8-bb-c1-12-34-56","State":"Reachable","InterfaceAlias":"Ethernet"}"#;
        let records = parse_net_neighbor_json(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, "reachable");
    }

    #[test]
    fn test_parse_net_neighbor_json_garbage() {
        assert!(parse_net_neighbor_json("").is_empty());
        assert!(parse_net_neighbor_json("<html>error</html>").is_empty());
    }
}
