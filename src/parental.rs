//! Parental control: domain categories on a daily schedule.
//!
//! Categories are a JSON map of name -> domain list; the settings file picks
//! which categories are active and an optional quiet-hours window. Applying
//! writes the merged dnsmasq config (base blocklist plus active categories,
//! minus allowlist) through the DNS module's renderer.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::config::{read_file, write_file, Paths};
use crate::dns;
use crate::error::{Outcome, Result};

pub type Categories = BTreeMap<String, Vec<String>>;

const DEFAULT_RANGE: &str = "22:00-06:00";

/// Quiet-hours window during which active categories are enforced.
///
/// Every field has a serde default so old settings files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_range() -> String {
    DEFAULT_RANGE.to_string()
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            enabled: false,
            range: default_range(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParentalSettings {
    #[serde(default)]
    pub active_categories: Vec<String>,
    #[serde(default)]
    pub schedule: Schedule,
}

fn default_categories() -> Categories {
    ["adult", "social", "gaming"]
        .into_iter()
        .map(|name| (name.to_string(), Vec::new()))
        .collect()
}

/// Load the category store; a missing or unreadable file yields the
/// built-in empty categories.
pub fn load_categories(paths: &Paths) -> Categories {
    read_file(&paths.parental_categories())
        .ok()
        .flatten()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(default_categories)
}

fn save_categories(paths: &Paths, categories: &Categories) -> Result<()> {
    let mut json = serde_json::to_string_pretty(categories).unwrap_or_else(|_| "{}".into());
    json.push('\n');
    write_file(&paths.parental_categories(), &json)
}

pub fn load_settings(paths: &Paths) -> ParentalSettings {
    read_file(&paths.parental_settings())
        .ok()
        .flatten()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

pub fn save_settings(paths: &Paths, settings: &ParentalSettings) -> Result<()> {
    let mut json = serde_json::to_string_pretty(settings).unwrap_or_else(|_| "{}".into());
    json.push('\n');
    write_file(&paths.parental_settings(), &json)
}

/// Add a domain to a category, creating the category if needed.
pub fn add_domain_to_category(paths: &Paths, category: &str, domain: &str) -> Result<Outcome> {
    let d = dns::normalize_domain(domain);
    if !dns::is_valid_domain(&d) {
        return Ok(Outcome::failure(format!("Invalid domain: {:?}", domain)));
    }
    let mut categories = load_categories(paths);
    let entry = categories.entry(category.to_string()).or_default();
    if entry.contains(&d) {
        return Ok(Outcome::success(format!("Already present: {}", d)));
    }
    entry.push(d.clone());
    save_categories(paths, &categories)?;
    Ok(Outcome::success(format!("Added to {}: {}", category, d)))
}

/// Remove a domain from a category.
pub fn remove_domain_from_category(paths: &Paths, category: &str, domain: &str) -> Result<Outcome> {
    let d = dns::normalize_domain(domain);
    let mut categories = load_categories(paths);
    let Some(entry) = categories.get_mut(category) else {
        return Ok(Outcome::failure(format!("No such category: {}", category)));
    };
    let before = entry.len();
    entry.retain(|existing| existing != &d);
    if entry.len() == before {
        return Ok(Outcome::failure(format!("Not in {}: {}", category, d)));
    }
    save_categories(paths, &categories)?;
    Ok(Outcome::success(format!("Removed from {}: {}", category, d)))
}

/// Replace the active category set; names without a store entry are dropped.
pub fn set_active_categories(paths: &Paths, requested: &[String]) -> Result<Outcome> {
    let categories = load_categories(paths);
    let mut settings = load_settings(paths);
    settings.active_categories = requested
        .iter()
        .filter(|name| categories.contains_key(*name))
        .cloned()
        .collect();
    save_settings(paths, &settings)?;
    let listing = if settings.active_categories.is_empty() {
        "(none)".to_string()
    } else {
        settings.active_categories.join(", ")
    };
    Ok(Outcome::success(format!("Active categories: {}", listing)))
}

pub fn set_schedule_enabled(paths: &Paths, enabled: bool) -> Result<()> {
    let mut settings = load_settings(paths);
    settings.schedule.enabled = enabled;
    save_settings(paths, &settings)
}

/// Set the quiet-hours range after validating its `HH:MM-HH:MM` shape.
pub fn set_schedule_range(paths: &Paths, range: &str) -> Result<Outcome> {
    if parse_range(range).is_none() {
        return Ok(Outcome::failure(format!(
            "Invalid range {:?}, expected HH:MM-HH:MM",
            range
        )));
    }
    let mut settings = load_settings(paths);
    settings.schedule.range = range.trim().to_string();
    save_settings(paths, &settings)?;
    Ok(Outcome::success(format!("Schedule range set: {}", range.trim())))
}

/// Parse `HH:MM-HH:MM` into a pair of times.
pub fn parse_range(range: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = range.trim().split_once('-')?;
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
    Some((start, end))
}

/// Whether category blocking is in force at `now`.
///
/// A disabled schedule means the categories are enforced around the clock.
/// Enabled windows may wrap midnight (`22:00-06:00`).
pub fn blocking_active_at(schedule: &Schedule, now: NaiveTime) -> bool {
    if !schedule.enabled {
        return true;
    }
    let Some((start, end)) = parse_range(&schedule.range) else {
        return true;
    };
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

/// Regenerate the dnsmasq config with the active category domains folded in.
///
/// Outside the enforcement window only the base blocklist is written, so the
/// generated file always reflects the current moment.
pub fn apply_to_dns(paths: &Paths) -> Result<PathBuf> {
    apply_to_dns_at(paths, chrono::Local::now().time())
}

fn apply_to_dns_at(paths: &Paths, now: NaiveTime) -> Result<PathBuf> {
    let settings = load_settings(paths);
    let mut extra: Vec<String> = Vec::new();
    if blocking_active_at(&settings.schedule, now) {
        let categories = load_categories(paths);
        for name in &settings.active_categories {
            if let Some(domains) = categories.get(name) {
                extra.extend(domains.iter().cloned());
            }
        }
    }

    let base = dns::load_blocklist(paths)?;
    let allow = dns::load_allowlist(paths)?;
    let effective: BTreeSet<String> = base
        .into_iter()
        .chain(extra)
        .filter(|d| !allow.contains(d))
        .collect();

    let out = paths.dnsmasq_conf();
    write_file(&out, &dns::render_dnsmasq(&effective))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_range() {
        assert!(parse_range("22:00-06:00").is_some());
        assert!(parse_range(" 08:30 - 17:45 ").is_some());
        assert!(parse_range("25:00-06:00").is_none());
        assert!(parse_range("22:00").is_none());
        assert!(parse_range("soon-later").is_none());
    }

    #[test]
    fn test_blocking_window_same_day() {
        let schedule = Schedule {
            enabled: true,
            range: "08:00-17:00".into(),
        };
        assert!(blocking_active_at(&schedule, time(12, 0)));
        assert!(blocking_active_at(&schedule, time(8, 0)));
        assert!(blocking_active_at(&schedule, time(17, 0)));
        assert!(!blocking_active_at(&schedule, time(7, 59)));
        assert!(!blocking_active_at(&schedule, time(20, 0)));
    }

    #[test]
    fn test_blocking_window_wraps_midnight() {
        let schedule = Schedule {
            enabled: true,
            range: "22:00-06:00".into(),
        };
        assert!(blocking_active_at(&schedule, time(23, 30)));
        assert!(blocking_active_at(&schedule, time(2, 0)));
        assert!(!blocking_active_at(&schedule, time(12, 0)));
    }

    #[test]
    fn test_disabled_schedule_blocks_always() {
        let schedule = Schedule::default();
        assert!(blocking_active_at(&schedule, time(12, 0)));
    }

    #[test]
    fn test_category_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());

        let outcome = add_domain_to_category(&paths, "social", "Chat.Example").unwrap();
        assert!(outcome.ok);
        let again = add_domain_to_category(&paths, "social", "chat.example").unwrap();
        assert!(again.ok);
        assert!(again.message.contains("Already"));

        let categories = load_categories(&paths);
        assert_eq!(categories["social"], vec!["chat.example"]);

        let removed = remove_domain_from_category(&paths, "social", "chat.example").unwrap();
        assert!(removed.ok);
        let missing = remove_domain_from_category(&paths, "social", "chat.example").unwrap();
        assert!(!missing.ok);
    }

    #[test]
    fn test_set_active_filters_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        add_domain_to_category(&paths, "gaming", "game.example").unwrap();

        let outcome = set_active_categories(
            &paths,
            &["gaming".to_string(), "imaginary".to_string()],
        )
        .unwrap();
        assert!(outcome.ok);
        assert_eq!(load_settings(&paths).active_categories, vec!["gaming"]);
    }

    #[test]
    fn test_apply_inside_and_outside_window() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        dns::add_to_blocklist(&paths, "base.example").unwrap();
        add_domain_to_category(&paths, "social", "chat.example").unwrap();
        set_active_categories(&paths, &["social".to_string()]).unwrap();
        set_schedule_range(&paths, "22:00-06:00").unwrap();
        set_schedule_enabled(&paths, true).unwrap();

        let out = apply_to_dns_at(&paths, time(23, 0)).unwrap();
        let inside = std::fs::read_to_string(&out).unwrap();
        assert!(inside.contains("address=/chat.example/0.0.0.0"));
        assert!(inside.contains("address=/base.example/0.0.0.0"));

        apply_to_dns_at(&paths, time(12, 0)).unwrap();
        let outside = std::fs::read_to_string(&out).unwrap();
        assert!(!outside.contains("chat.example"));
        assert!(outside.contains("address=/base.example/0.0.0.0"));
    }

    #[test]
    fn test_apply_respects_allowlist() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        add_domain_to_category(&paths, "social", "chat.example").unwrap();
        set_active_categories(&paths, &["social".to_string()]).unwrap();
        crate::config::write_file(&paths.allowlist(), "chat.example\n").unwrap();

        let out = apply_to_dns_at(&paths, time(12, 0)).unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert!(!text.contains("chat.example"));
    }
}
