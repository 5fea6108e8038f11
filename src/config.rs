//! Data-root layout.
//!
//! Everything the toolkit reads or writes lives under one directory:
//! `config/` for user-edited stores, `generated/` for rendered artifacts,
//! `licenses/` for the MAC allow-list. The root defaults to the platform
//! data directory and can be overridden with `LANSHIELD_ROOT`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LanshieldError, Result};

/// Environment variable overriding the data root.
pub const ROOT_ENV: &str = "LANSHIELD_ROOT";

/// Resolves every file path the toolkit touches, relative to one root.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default root: `$LANSHIELD_ROOT`, else `<data dir>/lanshield`,
    /// else the current directory.
    pub fn default_root() -> PathBuf {
        if let Some(root) = std::env::var_os(ROOT_ENV) {
            return PathBuf::from(root);
        }
        dirs::data_dir()
            .map(|d| d.join("lanshield"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // config/ — user-edited stores

    pub fn blocklist(&self) -> PathBuf {
        self.root.join("config").join("dns").join("blocklist.txt")
    }

    pub fn allowlist(&self) -> PathBuf {
        self.root.join("config").join("dns").join("allowlist.txt")
    }

    pub fn firewall_rules(&self) -> PathBuf {
        self.root.join("config").join("firewall").join("rules.json")
    }

    pub fn parental_categories(&self) -> PathBuf {
        self.root
            .join("config")
            .join("parental")
            .join("categories.json")
    }

    pub fn parental_settings(&self) -> PathBuf {
        self.root
            .join("config")
            .join("parental")
            .join("settings.json")
    }

    // generated/ — rendered artifacts

    pub fn dnsmasq_conf(&self) -> PathBuf {
        self.root
            .join("generated")
            .join("dns")
            .join("dnsmasq_blocklist.conf")
    }

    pub fn netsh_script(&self) -> PathBuf {
        self.root
            .join("generated")
            .join("firewall")
            .join("windows_apply.ps1")
    }

    pub fn iptables_script(&self) -> PathBuf {
        self.root
            .join("generated")
            .join("firewall")
            .join("linux_iptables.sh")
    }

    pub fn devices_csv(&self) -> PathBuf {
        self.root
            .join("generated")
            .join("inventory")
            .join("devices.csv")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("generated").join("lanshield.log")
    }

    // licenses/

    pub fn authorized_macs(&self) -> PathBuf {
        self.root.join("licenses").join("authorized_macs.txt")
    }

    pub fn seed_mac(&self) -> PathBuf {
        self.root.join("licenses").join("seed_mac.txt")
    }
}

/// Create the parent directory of `path` if it doesn't exist yet.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| LanshieldError::Storage {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Write `contents` to `path`, creating parent directories as needed.
///
/// Persistence is always a whole-file rewrite; there is no staged state.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|source| LanshieldError::Storage {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `path` as UTF-8, returning `None` if it doesn't exist.
pub fn read_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LanshieldError::Storage {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_layout() {
        let paths = Paths::new("/tmp/shield");
        assert_eq!(
            paths.blocklist(),
            PathBuf::from("/tmp/shield/config/dns/blocklist.txt")
        );
        assert_eq!(
            paths.dnsmasq_conf(),
            PathBuf::from("/tmp/shield/generated/dns/dnsmasq_blocklist.conf")
        );
        assert_eq!(
            paths.authorized_macs(),
            PathBuf::from("/tmp/shield/licenses/authorized_macs.txt")
        );
    }

    #[test]
    fn test_write_creates_parents_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        write_file(&paths.blocklist(), "ads.example\n").unwrap();
        assert_eq!(
            read_file(&paths.blocklist()).unwrap().as_deref(),
            Some("ads.example\n")
        );
        assert_eq!(read_file(&paths.allowlist()).unwrap(), None);
    }
}
