//! Firewall rule store and platform script generation.
//!
//! Rules live in a JSON array and are rendered to native firewall commands:
//! a PowerShell script of `netsh advfirewall` invocations for Windows and a
//! bash script of `iptables` appends for Linux. Applying the scripts is left
//! to the platform firewall; the toolkit only emits them (and, on Windows,
//! can hand the script to PowerShell).

use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{read_file, write_file, Paths};
use crate::error::{Outcome, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProtocol {
    Tcp,
    Udp,
    Any,
}

impl FromStr for RuleAction {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(RuleAction::Allow),
            "block" => Ok(RuleAction::Block),
            _ => Err(()),
        }
    }
}

impl FromStr for RuleDirection {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(RuleDirection::In),
            "out" => Ok(RuleDirection::Out),
            _ => Err(()),
        }
    }
}

impl FromStr for RuleProtocol {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(RuleProtocol::Tcp),
            "udp" => Ok(RuleProtocol::Udp),
            "any" => Ok(RuleProtocol::Any),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RuleProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleProtocol::Tcp => write!(f, "tcp"),
            RuleProtocol::Udp => write!(f, "udp"),
            RuleProtocol::Any => write!(f, "any"),
        }
    }
}

/// One stored firewall rule. `remote` and the port fields keep the literal
/// `"any"` wildcard the interactive prompt fills in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    pub action: RuleAction,
    pub direction: RuleDirection,
    pub protocol: RuleProtocol,
    pub remote: String,
    pub localport: String,
    pub remoteport: String,
}

impl FirewallRule {
    /// One-line summary for list displays.
    pub fn summary(&self) -> String {
        format!(
            "{} [{}/{}] proto={} remote={} lport={} rport={}",
            self.name,
            match self.action {
                RuleAction::Allow => "allow",
                RuleAction::Block => "block",
            },
            match self.direction {
                RuleDirection::In => "in",
                RuleDirection::Out => "out",
            },
            self.protocol,
            self.remote,
            self.localport,
            self.remoteport
        )
    }
}

/// Load the rule store; a missing or unreadable file yields no rules.
pub fn load_rules(paths: &Paths) -> Vec<FirewallRule> {
    read_file(&paths.firewall_rules())
        .ok()
        .flatten()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

fn save_rules(paths: &Paths, rules: &[FirewallRule]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(rules).unwrap_or_else(|_| "[]".into());
    json.push('\n');
    write_file(&paths.firewall_rules(), &json)
}

/// Validate raw field strings and append the rule to the store.
#[allow(clippy::too_many_arguments)]
pub fn add_rule(
    paths: &Paths,
    name: &str,
    action: &str,
    direction: &str,
    protocol: &str,
    remote: &str,
    localport: &str,
    remoteport: &str,
) -> Result<Outcome> {
    let Ok(action) = action.parse::<RuleAction>() else {
        return Ok(Outcome::failure("Invalid action (allow/block)"));
    };
    let Ok(direction) = direction.parse::<RuleDirection>() else {
        return Ok(Outcome::failure("Invalid direction (in/out)"));
    };
    let Ok(protocol) = protocol.parse::<RuleProtocol>() else {
        return Ok(Outcome::failure("Invalid protocol (tcp/udp/any)"));
    };

    let rule = FirewallRule {
        name: name.trim().to_string(),
        action,
        direction,
        protocol,
        remote: wildcard_or(remote),
        localport: wildcard_or(localport),
        remoteport: wildcard_or(remoteport),
    };

    let mut rules = load_rules(paths);
    let message = format!("Rule added: {}", rule.name);
    rules.push(rule);
    save_rules(paths, &rules)?;
    Ok(Outcome::success(message))
}

fn wildcard_or(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "any".to_string()
    } else {
        value.to_string()
    }
}

/// Remove the rule at `index`; out-of-bounds is a failure, not a panic.
pub fn remove_rule(paths: &Paths, index: usize) -> Result<Outcome> {
    let mut rules = load_rules(paths);
    if index >= rules.len() {
        return Ok(Outcome::failure(format!(
            "Index {} out of bounds (0..{})",
            index,
            rules.len()
        )));
    }
    let removed = rules.remove(index);
    save_rules(paths, &rules)?;
    Ok(Outcome::success(format!("Rule removed: {}", removed.name)))
}

/// Render the Windows netsh script: one `add rule` invocation per rule,
/// omitting every `any` field.
pub fn render_netsh(rules: &[FirewallRule]) -> String {
    let mut lines = vec!["rem lanshield firewall rules (Windows netsh)".to_string()];
    for rule in rules {
        let mut parts = vec![
            "netsh".to_string(),
            "advfirewall".to_string(),
            "firewall".to_string(),
            "add".to_string(),
            "rule".to_string(),
            format!("name=\"{}\"", rule.name),
            format!(
                "dir={}",
                match rule.direction {
                    RuleDirection::In => "in",
                    RuleDirection::Out => "out",
                }
            ),
            format!(
                "action={}",
                match rule.action {
                    RuleAction::Allow => "allow",
                    RuleAction::Block => "block",
                }
            ),
        ];
        if rule.protocol != RuleProtocol::Any {
            parts.push(format!("protocol={}", rule.protocol));
        }
        if rule.remote != "any" {
            parts.push(format!("remoteip={}", rule.remote));
        }
        if rule.localport != "any" {
            parts.push(format!("localport={}", rule.localport));
        }
        if rule.remoteport != "any" {
            parts.push(format!("remoteport={}", rule.remoteport));
        }
        lines.push(parts.join(" "));
    }
    lines.join("\n") + "\n"
}

/// Render the Linux iptables script. Direction maps in->INPUT with source
/// matching, out->OUTPUT with destination matching; port flags only apply
/// to tcp/udp.
pub fn render_iptables(rules: &[FirewallRule]) -> String {
    let mut lines = vec![
        "#!/usr/bin/env bash".to_string(),
        "set -e".to_string(),
        "# lanshield firewall rules (iptables)".to_string(),
    ];
    for rule in rules {
        let chain = match rule.direction {
            RuleDirection::In => "INPUT",
            RuleDirection::Out => "OUTPUT",
        };
        let target = match rule.action {
            RuleAction::Allow => "ACCEPT",
            RuleAction::Block => "DROP",
        };
        let mut cmd = vec!["iptables".to_string(), "-A".to_string(), chain.to_string()];
        if rule.protocol != RuleProtocol::Any {
            cmd.push("-p".to_string());
            cmd.push(rule.protocol.to_string());
        }
        if rule.remote != "any" {
            cmd.push(if chain == "OUTPUT" { "-d" } else { "-s" }.to_string());
            cmd.push(rule.remote.clone());
        }
        let filters_ports = rule.protocol != RuleProtocol::Any;
        if rule.localport != "any" && filters_ports {
            cmd.push("--sport".to_string());
            cmd.push(rule.localport.clone());
        }
        if rule.remoteport != "any" && filters_ports {
            cmd.push("--dport".to_string());
            cmd.push(rule.remoteport.clone());
        }
        cmd.push("-j".to_string());
        cmd.push(target.to_string());
        lines.push(cmd.join(" "));
    }
    lines.join("\n") + "\n"
}

/// Write the netsh script for the current store.
pub fn generate_windows_netsh(paths: &Paths) -> Result<PathBuf> {
    let rules = load_rules(paths);
    let out = paths.netsh_script();
    write_file(&out, &render_netsh(&rules))?;
    Ok(out)
}

/// Write the iptables script for the current store.
pub fn generate_linux_iptables(paths: &Paths) -> Result<PathBuf> {
    let rules = load_rules(paths);
    let out = paths.iptables_script();
    write_file(&out, &render_iptables(&rules))?;
    Ok(out)
}

/// Generate the netsh script and run it through PowerShell.
///
/// Returns the script path and the exit code; a PowerShell that won't start
/// reports as exit code 1 rather than an error.
pub fn apply_windows_netsh(paths: &Paths) -> Result<(PathBuf, i32)> {
    let script = generate_windows_netsh(paths)?;
    let code = Command::new("powershell")
        .args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"])
        .arg(&script)
        .status()
        .map(|status| status.code().unwrap_or(1))
        .unwrap_or(1);
    Ok((script, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_rule() -> FirewallRule {
        FirewallRule {
            name: "Block telnet".into(),
            action: RuleAction::Block,
            direction: RuleDirection::In,
            protocol: RuleProtocol::Tcp,
            remote: "any".into(),
            localport: "23".into(),
            remoteport: "any".into(),
        }
    }

    #[test]
    fn test_rule_json_shape() {
        let json = serde_json::to_value(block_rule()).unwrap();
        assert_eq!(json["action"], "block");
        assert_eq!(json["direction"], "in");
        assert_eq!(json["protocol"], "tcp");
    }

    #[test]
    fn test_add_and_remove_rule() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());

        let added = add_rule(
            &paths,
            "Block telnet",
            "block",
            "in",
            "tcp",
            "",
            "23",
            "",
        )
        .unwrap();
        assert!(added.ok);

        let rules = load_rules(&paths);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].remote, "any");
        assert_eq!(rules[0].localport, "23");

        let missing = remove_rule(&paths, 5).unwrap();
        assert!(!missing.ok);
        assert_eq!(load_rules(&paths).len(), 1);

        let removed = remove_rule(&paths, 0).unwrap();
        assert!(removed.ok);
        assert!(load_rules(&paths).is_empty());
    }

    #[test]
    fn test_add_rejects_bad_fields() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        let outcome =
            add_rule(&paths, "x", "deny", "in", "tcp", "any", "any", "any").unwrap();
        assert!(!outcome.ok);
        assert!(load_rules(&paths).is_empty());
    }

    #[test]
    fn test_render_netsh() {
        let text = render_netsh(&[block_rule()]);
        let line = text.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "netsh advfirewall firewall add rule name=\"Block telnet\" dir=in action=block protocol=tcp localport=23"
        );
    }

    #[test]
    fn test_render_netsh_omits_any_fields() {
        let rule = FirewallRule {
            name: "Allow all out".into(),
            action: RuleAction::Allow,
            direction: RuleDirection::Out,
            protocol: RuleProtocol::Any,
            remote: "any".into(),
            localport: "any".into(),
            remoteport: "any".into(),
        };
        let text = render_netsh(&[rule]);
        let line = text.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "netsh advfirewall firewall add rule name=\"Allow all out\" dir=out action=allow"
        );
    }

    #[test]
    fn test_render_iptables() {
        let outbound = FirewallRule {
            name: "Block tracker".into(),
            action: RuleAction::Block,
            direction: RuleDirection::Out,
            protocol: RuleProtocol::Udp,
            remote: "198.51.100.7".into(),
            localport: "any".into(),
            remoteport: "53".into(),
        };
        let text = render_iptables(&[block_rule(), outbound]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#!/usr/bin/env bash");
        assert_eq!(lines[1], "set -e");
        assert_eq!(lines[3], "iptables -A INPUT -p tcp --sport 23 -j DROP");
        assert_eq!(
            lines[4],
            "iptables -A OUTPUT -p udp -d 198.51.100.7 --dport 53 -j DROP"
        );
    }

    #[test]
    fn test_iptables_any_protocol_skips_ports() {
        let rule = FirewallRule {
            name: "Block host".into(),
            action: RuleAction::Block,
            direction: RuleDirection::Out,
            protocol: RuleProtocol::Any,
            remote: "203.0.113.5".into(),
            localport: "80".into(),
            remoteport: "443".into(),
        };
        let text = render_iptables(&[rule]);
        assert!(text.contains("iptables -A OUTPUT -d 203.0.113.5 -j DROP"));
        assert!(!text.contains("--dport"));
    }
}
