//! MAC allow-list license gate.
//!
//! The toolkit refuses to start unless one of the machine's MAC addresses
//! appears in `licenses/authorized_macs.txt`. Each failure cause carries its
//! own process exit code so installers can tell them apart.

use std::collections::BTreeSet;

use crate::config::{read_file, write_file, Paths};
use crate::error::Result;
use crate::system::find_system_macs;

/// Why startup validation refused to continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseFailure {
    /// The allow-list is missing or empty.
    NoAllowList,
    /// No local MAC address could be detected at all.
    NoLocalMac,
    /// Local MACs were detected but none is authorized.
    NotAuthorized(Vec<String>),
}

impl LicenseFailure {
    pub fn exit_code(&self) -> i32 {
        match self {
            LicenseFailure::NoAllowList => 2,
            LicenseFailure::NoLocalMac => 3,
            LicenseFailure::NotAuthorized(_) => 4,
        }
    }

    /// Human-readable explanation with remediation advice.
    pub fn describe(&self) -> String {
        match self {
            LicenseFailure::NoAllowList => {
                "No license found.\n\
                 Add your MAC address to licenses/authorized_macs.txt"
                    .to_string()
            }
            LicenseFailure::NoLocalMac => {
                "Could not detect a local MAC address.\n\
                 Add your MAC address to licenses/authorized_macs.txt manually"
                    .to_string()
            }
            LicenseFailure::NotAuthorized(detected) => {
                format!(
                    "License not valid for this device.\n\
                     - Detected MAC(s): {}\n\
                     - Copy one of them into licenses/authorized_macs.txt",
                    detected.join(", ")
                )
            }
        }
    }
}

/// Normalize a MAC address to `AA:BB:CC:DD:EE:FF`.
///
/// Keeps only hex digits and regroups the first six pairs; anything with
/// fewer than 12 hex digits normalizes to the empty string.
pub fn normalize_mac(raw: &str) -> String {
    let hex: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() < 12 {
        return String::new();
    }
    hex[..12]
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|b| (*b as char).to_ascii_uppercase())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// Read the allow-list; missing file yields an empty set.
pub fn read_authorized_macs(paths: &Paths) -> Result<BTreeSet<String>> {
    let mut macs = BTreeSet::new();
    if let Some(text) = read_file(&paths.authorized_macs())? {
        for line in text.lines() {
            let normalized = normalize_mac(line.trim());
            if !normalized.is_empty() {
                macs.insert(normalized);
            }
        }
    }
    Ok(macs)
}

/// Persist the allow-list, sorted, one MAC per line.
pub fn write_authorized_macs(paths: &Paths, macs: &BTreeSet<String>) -> Result<()> {
    let mut text = macs.iter().cloned().collect::<Vec<_>>().join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    write_file(&paths.authorized_macs(), &text)
}

/// Fold a one-shot installer seed file into the allow-list, then delete it.
fn merge_seed_mac(paths: &Paths, allowed: &mut BTreeSet<String>) -> Result<()> {
    let Some(seed) = read_file(&paths.seed_mac())? else {
        return Ok(());
    };
    let normalized = normalize_mac(seed.trim());
    if !normalized.is_empty() && allowed.insert(normalized) {
        write_authorized_macs(paths, allowed)?;
    }
    let _ = std::fs::remove_file(paths.seed_mac());
    Ok(())
}

/// Detected MAC candidates for this machine.
pub fn local_mac_candidates() -> BTreeSet<String> {
    find_system_macs()
}

/// Startup gate. `Ok(())` means at least one detected MAC is authorized.
pub fn validate(paths: &Paths) -> Result<std::result::Result<(), LicenseFailure>> {
    let mut allowed = read_authorized_macs(paths)?;
    merge_seed_mac(paths, &mut allowed)?;

    if allowed.is_empty() {
        return Ok(Err(LicenseFailure::NoAllowList));
    }

    let local = local_mac_candidates();
    if local.is_empty() {
        return Ok(Err(LicenseFailure::NoLocalMac));
    }

    if allowed.intersection(&local).next().is_none() {
        return Ok(Err(LicenseFailure::NotAuthorized(
            local.into_iter().collect(),
        )));
    }

    Ok(Ok(()))
}
