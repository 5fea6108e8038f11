//! DNS blocklist management and domain suffix matching.
//!
//! Blocklist and allowlist are plain text files, one normalized domain per
//! line, kept sorted. The effective set (blocklist minus allowlist) renders
//! to dnsmasq zero-route syntax; dnsmasq itself handles subdomain matching
//! at resolve time, the in-process matcher mirrors that semantics for the
//! "test a domain" path.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{read_file, write_file, Paths};
use crate::error::{Outcome, Result};

/// Timeout for blocklist downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(25);

const USER_AGENT: &str = concat!("lanshield/", env!("CARGO_PKG_VERSION"));

/// A curated blocklist source selectable from the import menu.
#[derive(Debug, Clone)]
pub struct BlocklistProfile {
    pub name: &'static str,
    pub url: &'static str,
}

/// Hagezi domain-format profiles, smallest first.
pub const BLOCKLIST_PROFILES: &[BlocklistProfile] = &[
    BlocklistProfile {
        name: "Hagezi Light",
        url: "https://raw.githubusercontent.com/hagezi/dns-blocklists/main/domains/light.txt",
    },
    BlocklistProfile {
        name: "Hagezi Normal",
        url: "https://raw.githubusercontent.com/hagezi/dns-blocklists/main/domains/normal.txt",
    },
    BlocklistProfile {
        name: "Hagezi Pro",
        url: "https://raw.githubusercontent.com/hagezi/dns-blocklists/main/domains/pro.txt",
    },
    BlocklistProfile {
        name: "Hagezi Ultimate",
        url: "https://raw.githubusercontent.com/hagezi/dns-blocklists/main/domains/ultimate.txt",
    },
];

/// Lowercase and strip surrounding whitespace and dots.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().trim_matches('.').to_string()
}

/// Validate an already-normalized domain: 2+ labels of `[a-z0-9-]`,
/// 1-63 chars each, no leading/trailing hyphen, 253 chars total.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    if domain.contains('/') || domain.contains(' ') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    if bytes[0] == b'-' || bytes[bytes.len() - 1] == b'-' {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

/// Load a domain list file into a set; invalid lines are dropped.
fn read_list(path: &std::path::Path) -> Result<BTreeSet<String>> {
    let mut items = BTreeSet::new();
    if let Some(text) = read_file(path)? {
        for line in text.lines() {
            let d = normalize_domain(line);
            if !d.is_empty() && is_valid_domain(&d) {
                items.insert(d);
            }
        }
    }
    Ok(items)
}

/// Persist a domain list, sorted, one per line.
fn write_list(path: &std::path::Path, items: &BTreeSet<String>) -> Result<()> {
    let mut text = items.iter().cloned().collect::<Vec<_>>().join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    write_file(path, &text)
}

pub fn load_blocklist(paths: &Paths) -> Result<BTreeSet<String>> {
    read_list(&paths.blocklist())
}

pub fn load_allowlist(paths: &Paths) -> Result<BTreeSet<String>> {
    read_list(&paths.allowlist())
}

/// Add a domain to the blocklist. Idempotent: re-adding succeeds without
/// touching the file.
pub fn add_to_blocklist(paths: &Paths, domain: &str) -> Result<Outcome> {
    let d = normalize_domain(domain);
    if !is_valid_domain(&d) {
        return Ok(Outcome::failure(format!("Invalid domain: {:?}", domain)));
    }
    let mut blocklist = load_blocklist(paths)?;
    if !blocklist.insert(d.clone()) {
        return Ok(Outcome::success(format!("Already in blocklist: {}", d)));
    }
    write_list(&paths.blocklist(), &blocklist)?;
    Ok(Outcome::success(format!("Added to blocklist: {}", d)))
}

/// Remove a domain from the blocklist; absent domains are a failure.
pub fn remove_from_blocklist(paths: &Paths, domain: &str) -> Result<Outcome> {
    let d = normalize_domain(domain);
    let mut blocklist = load_blocklist(paths)?;
    if !blocklist.remove(&d) {
        return Ok(Outcome::failure(format!("Not in blocklist: {}", d)));
    }
    write_list(&paths.blocklist(), &blocklist)?;
    Ok(Outcome::success(format!("Removed from blocklist: {}", d)))
}

/// Decide whether a domain would be blocked by the effective rule set.
///
/// The allowlist wins on exact match. Otherwise the domain's label suffixes
/// are walked from most specific to least specific (down to two labels); the
/// first suffix present in the blocklist and not simultaneously in the
/// allowlist blocks the request.
pub fn is_blocked(domain: &str, blocklist: &BTreeSet<String>, allowlist: &BTreeSet<String>) -> bool {
    let d = normalize_domain(domain);
    if !is_valid_domain(&d) {
        return false;
    }
    if allowlist.contains(&d) {
        return false;
    }
    let labels: Vec<&str> = d.split('.').collect();
    for start in 0..labels.len().saturating_sub(1) {
        let candidate = labels[start..].join(".");
        if blocklist.contains(&candidate) && !allowlist.contains(&candidate) {
            return true;
        }
    }
    blocklist.contains(&d) && !allowlist.contains(&d)
}

/// Convenience wrapper that loads both lists from disk.
pub fn is_domain_blocked(paths: &Paths, domain: &str) -> Result<bool> {
    let blocklist = load_blocklist(paths)?;
    let allowlist = load_allowlist(paths)?;
    Ok(is_blocked(domain, &blocklist, &allowlist))
}

/// Render a dnsmasq config that zero-routes every domain in `effective`.
///
/// Two lines per domain: an IPv4 sink and an IPv6 sink. dnsmasq applies
/// `address=/d/...` to the domain and all its subdomains.
pub fn render_dnsmasq(effective: &BTreeSet<String>) -> String {
    let mut lines = Vec::with_capacity(effective.len() * 2);
    for d in effective {
        lines.push(format!("address=/{}/0.0.0.0", d));
        lines.push(format!("address=/{}/::", d));
    }
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Write the dnsmasq config for blocklist minus allowlist.
pub fn generate_dnsmasq_blocklist(paths: &Paths) -> Result<PathBuf> {
    let blocklist = load_blocklist(paths)?;
    let allowlist = load_allowlist(paths)?;
    let effective: BTreeSet<String> = blocklist.difference(&allowlist).cloned().collect();
    let out = paths.dnsmasq_conf();
    write_file(&out, &render_dnsmasq(&effective))?;
    Ok(out)
}

/// Extract domains from heterogeneous list text.
///
/// Recognized line shapes: dnsmasq `address=/d/...` directives, hosts-file
/// entries (`0.0.0.0 d`, `127.0.0.1 d`, `:: d`), and bare domains. Comment
/// lines (`#`, `//`) and anything else are skipped without error.
pub fn parse_domains_from_text(text: &str) -> BTreeSet<String> {
    let mut domains = BTreeSet::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        if let Some(rest) = line.strip_prefix("address=/") {
            if let Some((host, _)) = rest.split_once('/') {
                let d = normalize_domain(host);
                if is_valid_domain(&d) {
                    domains.insert(d);
                    continue;
                }
            }
        }

        let mut tokens = line.split_whitespace();
        if let (Some(first), Some(second)) = (tokens.next(), tokens.next()) {
            if matches!(first, "0.0.0.0" | "127.0.0.1" | "::") {
                let d = normalize_domain(second);
                if is_valid_domain(&d) {
                    domains.insert(d);
                    continue;
                }
            }
        }

        let d = normalize_domain(line);
        if is_valid_domain(&d) {
            domains.insert(d);
        }
    }
    domains
}

/// Merge domains parsed from `text` into the blocklist.
/// Returns `(added, total)` counts.
pub fn import_domains_from_text(paths: &Paths, text: &str) -> Result<(usize, usize)> {
    let mut blocklist = load_blocklist(paths)?;
    let before = blocklist.len();
    blocklist.extend(parse_domains_from_text(text));
    write_list(&paths.blocklist(), &blocklist)?;
    Ok((blocklist.len() - before, blocklist.len()))
}

/// Download a blocklist and merge it.
///
/// Network failures (unreachable host, HTTP >= 400, timeout) come back as a
/// failed [`Outcome`] and leave the blocklist untouched.
pub fn import_from_url(paths: &Paths, url: &str) -> Result<Outcome> {
    let client = match reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(client) => client,
        Err(e) => return Ok(Outcome::failure(format!("HTTP client error: {}", e))),
    };

    let response = match client.get(url).send() {
        Ok(response) => response,
        Err(e) => return Ok(Outcome::failure(format!("Download failed: {}", e))),
    };
    if !response.status().is_success() {
        return Ok(Outcome::failure(format!(
            "HTTP {} from {}",
            response.status().as_u16(),
            url
        )));
    }
    let text = match response.text() {
        Ok(text) => text,
        Err(e) => return Ok(Outcome::failure(format!("Download failed: {}", e))),
    };

    let (added, total) = import_domains_from_text(paths, &text)?;
    Ok(Outcome::success(format!(
        "Imported from {} (added: {}, total: {})",
        url, added, total
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(domains: &[&str]) -> BTreeSet<String> {
        domains.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("  Example.COM.  "), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("..."), "");
    }

    #[test]
    fn test_is_valid_domain() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("a.b.c.example.com"));
        assert!(is_valid_domain("xn--bcher-kva.example"));
        assert!(!is_valid_domain("example"));
        assert!(!is_valid_domain("exa mple.com"));
        assert!(!is_valid_domain("example.com/path"));
        assert!(!is_valid_domain("-bad.example.com"));
        assert!(!is_valid_domain("bad-.example.com"));
        assert!(!is_valid_domain(""));
        let long_label = format!("{}.com", "a".repeat(64));
        assert!(!is_valid_domain(&long_label));
    }

    #[test]
    fn test_is_blocked_exact_and_suffix() {
        let blocklist = set(&["evil.com"]);
        let allowlist = set(&[]);
        assert!(is_blocked("evil.com", &blocklist, &allowlist));
        assert!(is_blocked("sub.evil.com", &blocklist, &allowlist));
        assert!(is_blocked("a.b.evil.com", &blocklist, &allowlist));
        assert!(!is_blocked("evil.com.example", &blocklist, &allowlist));
        assert!(!is_blocked("notevil.com", &blocklist, &allowlist));
    }

    #[test]
    fn test_allowlist_wins() {
        let blocklist = set(&["evil.com", "ads.example"]);
        let allowlist = set(&["evil.com", "good.ads.example"]);
        // Allowlisted exact name is never blocked, even while blocklisted.
        assert!(!is_blocked("evil.com", &blocklist, &allowlist));
        // The allowlisted subdomain escapes its blocklisted parent...
        assert!(!is_blocked("good.ads.example", &blocklist, &allowlist));
        // ...while siblings stay blocked.
        assert!(is_blocked("other.ads.example", &blocklist, &allowlist));
    }

    #[test]
    fn test_is_blocked_invalid_input() {
        let blocklist = set(&["evil.com"]);
        assert!(!is_blocked("not a domain", &blocklist, &set(&[])));
        assert!(!is_blocked("", &blocklist, &set(&[])));
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());

        let first = add_to_blocklist(&paths, "Ads.Example.").unwrap();
        assert!(first.ok);
        let second = add_to_blocklist(&paths, "ads.example").unwrap();
        assert!(second.ok);
        assert!(second.message.contains("Already"));

        assert_eq!(load_blocklist(&paths).unwrap(), set(&["ads.example"]));
    }

    #[test]
    fn test_add_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        let outcome = add_to_blocklist(&paths, "not valid").unwrap();
        assert!(!outcome.ok);
        assert!(load_blocklist(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_fails_and_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        add_to_blocklist(&paths, "ads.example").unwrap();

        let outcome = remove_from_blocklist(&paths, "other.example").unwrap();
        assert!(!outcome.ok);
        assert_eq!(load_blocklist(&paths).unwrap(), set(&["ads.example"]));

        let outcome = remove_from_blocklist(&paths, "ads.example").unwrap();
        assert!(outcome.ok);
        assert!(load_blocklist(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_render_dnsmasq() {
        let effective = set(&["a.com"]);
        assert_eq!(
            render_dnsmasq(&effective),
            "address=/a.com/0.0.0.0\naddress=/a.com/::\n"
        );
        assert_eq!(render_dnsmasq(&set(&[])), "");
    }

    #[test]
    fn test_generate_excludes_allowlisted() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        add_to_blocklist(&paths, "a.com").unwrap();
        add_to_blocklist(&paths, "b.com").unwrap();
        write_file(&paths.allowlist(), "b.com\n").unwrap();

        let out = generate_dnsmasq_blocklist(&paths).unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert_eq!(text, "address=/a.com/0.0.0.0\naddress=/a.com/::\n");
    }

    #[test]
    fn test_parse_domains_from_text() {
        let text = "# comment\n\
                    address=/x.com/0.0.0.0\n\
                    0.0.0.0 y.com\n\
                    plain.com\n\
                    not a domain line\n";
        assert_eq!(
            parse_domains_from_text(text),
            set(&["x.com", "y.com", "plain.com"])
        );
    }

    #[test]
    fn test_parse_domains_more_shapes() {
        let text = "// also a comment\n\
                    address=/v6.example/::\n\
                    127.0.0.1 localhost.example\n\
                    :: v6host.example\n\
                    UPPER.Case.Example.\n";
        assert_eq!(
            parse_domains_from_text(text),
            set(&[
                "v6.example",
                "localhost.example",
                "v6host.example",
                "upper.case.example",
            ])
        );
    }

    #[test]
    fn test_import_counts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        add_to_blocklist(&paths, "x.com").unwrap();

        let (added, total) = import_domains_from_text(&paths, "x.com\ny.com\n").unwrap();
        assert_eq!((added, total), (1, 2));
    }
}
