//! External tool invocation and local interface probing.
//!
//! Every discovery path in the toolkit funnels through [`run_command`]: the
//! invoked binary is a black box, and a missing binary, non-zero exit, or
//! undecodable output all degrade to an empty string so callers can fall
//! through to the next method.

use std::collections::BTreeSet;
use std::process::Command;
use std::str::FromStr;

use ipnetwork::Ipv4Network;

/// Run a command and return its stdout, or an empty string on any failure.
pub fn run_command(program: &str, args: &[&str]) -> String {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
        Ok(output) => {
            tracing::debug!(
                program,
                code = output.status.code(),
                "command exited non-zero"
            );
            String::new()
        }
        Err(e) => {
            tracing::debug!(program, error = %e, "command failed to start");
            String::new()
        }
    }
}

/// Check whether a binary is resolvable on PATH.
#[cfg(windows)]
pub fn has_command(program: &str) -> bool {
    Command::new("where")
        .arg(program)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check whether a binary is resolvable on PATH.
#[cfg(not(windows))]
pub fn has_command(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Auto-detect the private IPv4 subnets of the local interfaces, as
/// `a.b.c.d/len` strings. Loopback and public ranges are excluded.
#[cfg(windows)]
pub fn detect_subnets() -> Vec<String> {
    parse_ipconfig_subnets(&run_command("ipconfig", &[]))
}

/// Auto-detect the private IPv4 subnets of the local interfaces, as
/// `a.b.c.d/len` strings. Loopback and public ranges are excluded.
#[cfg(not(windows))]
pub fn detect_subnets() -> Vec<String> {
    parse_ip_addr_subnets(&run_command("ip", &["-o", "-f", "inet", "addr", "show"]))
}

/// Parse `ip -o -f inet addr show` one-line-per-address output.
///
/// Each line carries `inet <ip>/<prefix>` somewhere in its token stream.
pub fn parse_ip_addr_subnets(output: &str) -> Vec<String> {
    let mut subnets = Vec::new();
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(idx) = tokens.iter().position(|t| *t == "inet") else {
            continue;
        };
        let Some(cidr) = tokens.get(idx + 1) else {
            continue;
        };
        if let Ok(net) = Ipv4Network::from_str(cidr) {
            push_private_subnet(&mut subnets, net);
        }
    }
    subnets
}

/// Parse `ipconfig` output, pairing each IPv4 address with the subnet mask
/// that follows it. Localized label variants for the mask line are accepted.
pub fn parse_ipconfig_subnets(output: &str) -> Vec<String> {
    let mut subnets = Vec::new();
    let mut pending_ip: Option<std::net::Ipv4Addr> = None;

    for line in output.lines() {
        let line = line.trim();
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if label.contains("IPv4") {
            pending_ip = value.parse().ok();
        } else if label.contains("Subnet Mask") || label.contains("Masque de sous-r") {
            if let (Some(ip), Ok(mask)) = (pending_ip.take(), value.parse()) {
                if let Ok(net) = Ipv4Network::with_netmask(ip, mask) {
                    push_private_subnet(&mut subnets, net);
                }
            }
        }
    }
    subnets
}

fn push_private_subnet(subnets: &mut Vec<String>, net: Ipv4Network) {
    let network = net.network();
    if !network.is_private() || network.is_loopback() {
        return;
    }
    let cidr = format!("{}/{}", network, net.prefix());
    if !subnets.contains(&cidr) {
        subnets.push(cidr);
    }
}

/// Collect every MAC address the platform tools report for local interfaces.
#[cfg(windows)]
pub fn find_system_macs() -> BTreeSet<String> {
    let mut macs = BTreeSet::new();
    if has_command("getmac") {
        collect_macs(&mut macs, &run_command("getmac", &["/v", "/fo", "csv"]));
        collect_macs(&mut macs, &run_command("getmac", &[]));
    }
    collect_macs(&mut macs, &run_command("ipconfig", &["/all"]));
    macs
}

/// Collect every MAC address the platform tools report for local interfaces.
#[cfg(not(windows))]
pub fn find_system_macs() -> BTreeSet<String> {
    let mut macs = BTreeSet::new();
    if has_command("ip") {
        collect_macs(&mut macs, &run_command("ip", &["link"]));
    }
    if has_command("ifconfig") {
        collect_macs(&mut macs, &run_command("ifconfig", &["-a"]));
    }
    macs
}

fn collect_macs(macs: &mut BTreeSet<String>, output: &str) {
    for token in output.split(|c: char| c.is_whitespace() || c == '"' || c == ',') {
        if looks_like_mac(token) {
            let normalized = crate::license::normalize_mac(token);
            if !normalized.is_empty() {
                macs.insert(normalized);
            }
        }
    }
}

/// Six hex pairs separated by `:` or `-`.
fn looks_like_mac(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.len() != 17 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        if i % 3 == 2 {
            if *b != b':' && *b != b'-' {
                return false;
            }
        } else if !b.is_ascii_hexdigit() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_addr_subnets() {
        let output = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever
2: eth0    inet 192.168.1.42/24 brd 192.168.1.255 scope global dynamic eth0\\       valid_lft 85676sec preferred_lft 85676sec
3: wg0    inet 203.0.113.9/32 scope global wg0\\       valid_lft forever preferred_lft forever
";
        assert_eq!(parse_ip_addr_subnets(output), vec!["192.168.1.0/24"]);
    }

    #[test]
    fn test_parse_ipconfig_subnets() {
        let output = "\
Ethernet adapter Ethernet:

   IPv4 Address. . . . . . . . . . . : 192.168.1.42
   Subnet Mask . . . . . . . . . . . : 255.255.255.0
   Default Gateway . . . . . . . . . : 192.168.1.1

Wireless LAN adapter Wi-Fi:

   IPv4 Address. . . . . . . . . . . : 10.0.0.7
   Subnet Mask . . . . . . . . . . . : 255.0.0.0
";
        assert_eq!(
            parse_ipconfig_subnets(output),
            vec!["192.168.1.0/24", "10.0.0.0/8"]
        );
    }

    #[test]
    fn test_parse_ipconfig_skips_public_addresses() {
        let output = "\
   IPv4 Address. . . . . . . . . . . : 8.8.4.4
   Subnet Mask . . . . . . . . . . . : 255.255.255.0
";
        assert!(parse_ipconfig_subnets(output).is_empty());
    }

    #[test]
    fn test_collect_macs_from_ip_link() {
        let output = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN mode DEFAULT group default qlen 1000
    link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc mq state UP mode DEFAULT group default qlen 1000
    link/ether d8:bb:c1:12:34:56 brd ff:ff:ff:ff:ff:ff
";
        let mut macs = BTreeSet::new();
        collect_macs(&mut macs, output);
        assert!(macs.contains("D8:BB:C1:12:34:56"));
        assert!(macs.contains("FF:FF:FF:FF:FF:FF"));
    }

    #[test]
    fn test_collect_macs_from_getmac_csv() {
        let output = "\"Ethernet\",\"00-11-22-33-44-55\",\"\\Device\\Tcpip_{...}\"\n";
        let mut macs = BTreeSet::new();
        collect_macs(&mut macs, output);
        assert_eq!(
            macs.into_iter().collect::<Vec<_>>(),
            vec!["00:11:22:33:44:55"]
        );
    }

    #[test]
    fn test_looks_like_mac_rejects_near_misses() {
        assert!(looks_like_mac("d8:bb:c1:12:34:56"));
        assert!(looks_like_mac("00-11-22-33-44-55"));
        assert!(!looks_like_mac("d8:bb:c1:12:34"));
        assert!(!looks_like_mac("zz:bb:c1:12:34:56"));
        assert!(!looks_like_mac("192.168.1.1"));
    }
}
