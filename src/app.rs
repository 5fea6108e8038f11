//! Application state and key handling.
//!
//! One synchronous state machine: module menu -> action menu -> optional
//! prompt or list overlay -> back. Operations run inline on Enter and block
//! the draw loop until they return; their outcomes land in the activity log.

use std::collections::VecDeque;

use crossterm::event::KeyCode;

use crate::config::Paths;
use crate::dns::{self, BLOCKLIST_PROFILES};
use crate::error::{Outcome, Result};
use crate::firewall;
use crate::inventory::{self, enrich, NeighborRecord};
use crate::parental;
use crate::ui::status::LogLevel;

/// Maximum number of log entries kept in memory.
const MAX_LOG_ENTRIES: usize = 500;

/// How many records a scan shown in the TUI will try to name-resolve.
const SCAN_NAME_LOOKUPS: usize = 50;

/// Log entry for the activity panel.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    pub level: LogLevel,
}

/// Current UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Top-level module menu.
    ModuleMenu,
    /// Action menu of the open module.
    ActionMenu,
    /// Single-line text prompt overlay.
    Prompt,
    /// Blocklist profile picker overlay.
    ImportSelect,
    /// Scrollable results view.
    Results,
}

/// The toolkit's modules, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Dns,
    Firewall,
    Parental,
    Inventory,
}

pub const MODULES: &[Module] = &[
    Module::Dns,
    Module::Firewall,
    Module::Parental,
    Module::Inventory,
];

impl Module {
    pub fn title(&self) -> &'static str {
        match self {
            Module::Dns => "DNS Filter",
            Module::Firewall => "Firewall",
            Module::Parental => "Parental Control",
            Module::Inventory => "Device Inventory",
        }
    }

    /// Actions shown in this module's menu, ending with Back.
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Module::Dns => &[
                Action::DnsStatus,
                Action::DnsAdd,
                Action::DnsRemove,
                Action::DnsTest,
                Action::DnsGenerate,
                Action::DnsImport,
                Action::Back,
            ],
            Module::Firewall => &[
                Action::FwList,
                Action::FwAdd,
                Action::FwRemove,
                Action::FwGenerateNetsh,
                Action::FwGenerateIptables,
                Action::FwApply,
                Action::Back,
            ],
            Module::Parental => &[
                Action::ParStatus,
                Action::ParAdd,
                Action::ParRemove,
                Action::ParSetActive,
                Action::ParToggleSchedule,
                Action::ParSetRange,
                Action::ParApply,
                Action::Back,
            ],
            Module::Inventory => &[
                Action::InvSmartScan,
                Action::InvNeighbors,
                Action::InvNmapScan,
                Action::InvExportCsv,
                Action::Back,
            ],
        }
    }
}

/// Every action reachable from a module menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DnsStatus,
    DnsAdd,
    DnsRemove,
    DnsTest,
    DnsGenerate,
    DnsImport,
    FwList,
    FwAdd,
    FwRemove,
    FwGenerateNetsh,
    FwGenerateIptables,
    FwApply,
    ParStatus,
    ParAdd,
    ParRemove,
    ParSetActive,
    ParToggleSchedule,
    ParSetRange,
    ParApply,
    InvSmartScan,
    InvNeighbors,
    InvNmapScan,
    InvExportCsv,
    Back,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::DnsStatus => "Show status",
            Action::DnsAdd => "Add domain to blocklist",
            Action::DnsRemove => "Remove domain from blocklist",
            Action::DnsTest => "Test a domain",
            Action::DnsGenerate => "Generate dnsmasq config",
            Action::DnsImport => "Import blocklist",
            Action::FwList => "List rules",
            Action::FwAdd => "Add rule",
            Action::FwRemove => "Remove rule",
            Action::FwGenerateNetsh => "Generate netsh script",
            Action::FwGenerateIptables => "Generate iptables script",
            Action::FwApply => "Apply rules (Windows)",
            Action::ParStatus => "Show status",
            Action::ParAdd => "Add domain to category",
            Action::ParRemove => "Remove domain from category",
            Action::ParSetActive => "Set active categories",
            Action::ParToggleSchedule => "Toggle schedule",
            Action::ParSetRange => "Set schedule range",
            Action::ParApply => "Apply to DNS config",
            Action::InvSmartScan => "Scan network",
            Action::InvNeighbors => "Read neighbor table",
            Action::InvNmapScan => "Nmap scan (all subnets)",
            Action::InvExportCsv => "Export devices to CSV",
            Action::Back => "Back",
        }
    }
}

/// Which parental mutation a two-step category+domain prompt feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentalOp {
    Add,
    Remove,
}

/// What the open text prompt is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    DnsAdd,
    DnsRemove,
    DnsTest,
    ImportUrl,
    FwField(usize),
    FwRemoveIndex,
    ParCategory(ParentalOp),
    ParDomain(ParentalOp, String),
    ParActive,
    ParRange,
    InvSubnet,
}

/// An open single-line text prompt.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub label: String,
    pub hint: String,
    pub buffer: String,
}

/// Labels and defaults for the sequential firewall-rule prompts.
pub const RULE_FIELDS: &[(&str, &str)] = &[
    ("Rule name", "lanshield rule"),
    ("Action (allow/block)", "block"),
    ("Direction (in/out)", "out"),
    ("Protocol (tcp/udp/any)", "any"),
    ("Remote IP/CIDR", "any"),
    ("Local port", "any"),
    ("Remote port", "any"),
];

/// Application state.
pub struct App {
    pub paths: Paths,
    pub state: AppState,
    /// Module whose action menu is (or was last) open.
    pub module: Module,
    pub selected_module: usize,
    pub selected_action: usize,
    /// Log entries for display (bounded ring buffer).
    pub logs: VecDeque<LogEntry>,
    pub prompt: Option<Prompt>,
    /// Selected row in the import profile picker.
    pub import_selected: usize,
    /// Collected firewall-rule field values while the prompt chain runs.
    rule_draft: Vec<String>,
    /// Preformatted lines for the results view.
    pub results: Vec<String>,
    pub results_title: String,
    pub results_offset: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(paths: Paths) -> Self {
        let mut app = Self {
            paths,
            state: AppState::ModuleMenu,
            module: Module::Dns,
            selected_module: 0,
            selected_action: 0,
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            prompt: None,
            import_selected: 0,
            rule_draft: Vec::new(),
            results: Vec::new(),
            results_title: String::new(),
            results_offset: 0,
            should_quit: false,
        };
        app.log_info("Ready. Pick a module.");
        app
    }

    /// Rows in the module menu: the modules plus a Quit row.
    pub fn module_row_count(&self) -> usize {
        MODULES.len() + 1
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyCode) {
        match self.state {
            AppState::ModuleMenu => self.handle_module_key(key),
            AppState::ActionMenu => self.handle_action_key(key),
            AppState::Prompt => self.handle_prompt_key(key),
            AppState::ImportSelect => self.handle_import_key(key),
            AppState::Results => self.handle_results_key(key),
        }
    }

    /// Help bar text for the current state.
    pub fn help_text(&self) -> &'static str {
        match self.state {
            AppState::ModuleMenu => "↑/↓: Navigate  Enter: Open  q: Quit",
            AppState::ActionMenu => "↑/↓: Navigate  Enter: Run  Esc: Back  q: Quit",
            AppState::Prompt => "Enter: Submit  Esc: Cancel",
            AppState::ImportSelect => "↑/↓: Navigate  Enter: Import  Esc: Cancel",
            AppState::Results => "↑/↓: Scroll  Esc: Back",
        }
    }

    fn handle_module_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_module = self.selected_module.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_module + 1 < self.module_row_count() {
                    self.selected_module += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(module) = MODULES.get(self.selected_module) {
                    self.module = *module;
                    self.selected_action = 0;
                    self.state = AppState::ActionMenu;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_action_key(&mut self, key: KeyCode) {
        let actions = self.module.actions();
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_action = self.selected_action.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_action + 1 < actions.len() {
                    self.selected_action += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(action) = actions.get(self.selected_action).copied() {
                    self.run_action(action);
                }
            }
            KeyCode::Esc => self.state = AppState::ModuleMenu,
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.buffer.pop();
                }
            }
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.state = AppState::ActionMenu;
                    self.submit_prompt(prompt);
                }
            }
            KeyCode::Esc => {
                self.prompt = None;
                self.rule_draft.clear();
                self.state = AppState::ActionMenu;
            }
            _ => {}
        }
    }

    fn handle_import_key(&mut self, key: KeyCode) {
        // Rows: one per profile, plus "Custom URL..." last.
        let count = BLOCKLIST_PROFILES.len() + 1;
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.import_selected = self.import_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.import_selected + 1 < count {
                    self.import_selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(profile) = BLOCKLIST_PROFILES.get(self.import_selected) {
                    self.state = AppState::ActionMenu;
                    self.log_info(format!("Downloading {}...", profile.name));
                    let result = dns::import_from_url(&self.paths, profile.url);
                    self.log_result(result);
                } else {
                    self.open_prompt(
                        PromptKind::ImportUrl,
                        "Blocklist URL",
                        "hosts, dnsmasq or plain domain list",
                    );
                }
            }
            KeyCode::Esc => self.state = AppState::ActionMenu,
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.results_offset = self.results_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.results_offset + 1 < self.results.len() {
                    self.results_offset += 1;
                }
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                self.state = AppState::ActionMenu;
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind, label: impl Into<String>, hint: impl Into<String>) {
        self.prompt = Some(Prompt {
            kind,
            label: label.into(),
            hint: hint.into(),
            buffer: String::new(),
        });
        self.state = AppState::Prompt;
    }

    fn show_results(&mut self, title: impl Into<String>, lines: Vec<String>) {
        self.results_title = title.into();
        self.results = lines;
        self.results_offset = 0;
        self.state = AppState::Results;
    }

    fn run_action(&mut self, action: Action) {
        match action {
            Action::Back => self.state = AppState::ModuleMenu,

            Action::DnsStatus => self.dns_status(),
            Action::DnsAdd => {
                self.open_prompt(PromptKind::DnsAdd, "Domain to block", "e.g. ads.example.com")
            }
            Action::DnsRemove => {
                self.open_prompt(PromptKind::DnsRemove, "Domain to unblock", "")
            }
            Action::DnsTest => {
                self.open_prompt(PromptKind::DnsTest, "Domain to test", "")
            }
            Action::DnsGenerate => {
                let result = dns::generate_dnsmasq_blocklist(&self.paths);
                self.log_path_result("dnsmasq config written", result);
            }
            Action::DnsImport => {
                self.import_selected = 0;
                self.state = AppState::ImportSelect;
            }

            Action::FwList => self.fw_list(),
            Action::FwAdd => {
                self.rule_draft.clear();
                let (label, default) = RULE_FIELDS[0];
                self.open_prompt(PromptKind::FwField(0), label, format!("default: {}", default));
            }
            Action::FwRemove => {
                self.open_prompt(PromptKind::FwRemoveIndex, "Rule index to remove", "see List rules")
            }
            Action::FwGenerateNetsh => {
                let result = firewall::generate_windows_netsh(&self.paths);
                self.log_path_result("netsh script written", result);
            }
            Action::FwGenerateIptables => {
                let result = firewall::generate_linux_iptables(&self.paths);
                self.log_path_result("iptables script written", result);
            }
            Action::FwApply => {
                if !cfg!(windows) {
                    self.log_warning("Apply is only available on Windows");
                    return;
                }
                match firewall::apply_windows_netsh(&self.paths) {
                    Ok((script, 0)) => {
                        self.log_success(format!("Applied {}", script.display()))
                    }
                    Ok((script, code)) => self.log_warning(format!(
                        "PowerShell exited with {} for {}",
                        code,
                        script.display()
                    )),
                    Err(e) => self.log_error(e.to_string()),
                }
            }

            Action::ParStatus => self.parental_status(),
            Action::ParAdd => self.open_prompt(
                PromptKind::ParCategory(ParentalOp::Add),
                "Category",
                "e.g. adult, social, gaming",
            ),
            Action::ParRemove => self.open_prompt(
                PromptKind::ParCategory(ParentalOp::Remove),
                "Category",
                "",
            ),
            Action::ParSetActive => self.open_prompt(
                PromptKind::ParActive,
                "Active categories",
                "comma-separated, empty for none",
            ),
            Action::ParToggleSchedule => {
                let settings = parental::load_settings(&self.paths);
                let enabled = !settings.schedule.enabled;
                match parental::set_schedule_enabled(&self.paths, enabled) {
                    Ok(()) if enabled => self.log_success("Schedule enabled"),
                    Ok(()) => self.log_info("Schedule disabled (categories always enforced)"),
                    Err(e) => self.log_error(e.to_string()),
                }
            }
            Action::ParSetRange => self.open_prompt(
                PromptKind::ParRange,
                "Quiet hours (HH:MM-HH:MM)",
                "may wrap midnight, e.g. 22:00-06:00",
            ),
            Action::ParApply => {
                let result = parental::apply_to_dns(&self.paths);
                self.log_path_result("dnsmasq config written", result);
            }

            Action::InvSmartScan => self.open_prompt(
                PromptKind::InvSubnet,
                "Subnet to scan",
                "empty = auto-detect, e.g. 192.168.1.0/24",
            ),
            Action::InvNeighbors => {
                self.log_info("Reading neighbor table...");
                let records = inventory::scan_neighbors();
                self.show_scan_results("Neighbor table", records);
            }
            Action::InvNmapScan => {
                self.log_info("Running nmap across detected subnets...");
                let records = inventory::force_nmap_scan();
                self.show_scan_results("Nmap scan", records);
            }
            Action::InvExportCsv => {
                self.log_info("Scanning and resolving names...");
                let result = inventory::export_csv(&self.paths);
                self.log_path_result("CSV written", result);
            }
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let input = prompt.buffer.trim().to_string();
        match prompt.kind {
            PromptKind::DnsAdd => {
                let result = dns::add_to_blocklist(&self.paths, &input);
                self.log_result(result);
            }
            PromptKind::DnsRemove => {
                let result = dns::remove_from_blocklist(&self.paths, &input);
                self.log_result(result);
            }
            PromptKind::DnsTest => match dns::is_domain_blocked(&self.paths, &input) {
                Ok(true) => self.log_warning(format!("{} is BLOCKED", input)),
                Ok(false) => self.log_success(format!("{} is not blocked", input)),
                Err(e) => self.log_error(e.to_string()),
            },
            PromptKind::ImportUrl => {
                if input.is_empty() {
                    self.log_warning("No URL given");
                    return;
                }
                self.log_info(format!("Downloading {}...", input));
                let result = dns::import_from_url(&self.paths, &input);
                self.log_result(result);
            }
            PromptKind::FwField(index) => {
                let value = if input.is_empty() {
                    RULE_FIELDS[index].1.to_string()
                } else {
                    input
                };
                self.rule_draft.push(value);
                if let Some((label, default)) = RULE_FIELDS.get(index + 1) {
                    self.open_prompt(
                        PromptKind::FwField(index + 1),
                        *label,
                        format!("default: {}", default),
                    );
                } else {
                    self.finish_rule_draft();
                }
            }
            PromptKind::FwRemoveIndex => match input.parse::<usize>() {
                Ok(index) => {
                    let result = firewall::remove_rule(&self.paths, index);
                    self.log_result(result);
                }
                Err(_) => self.log_warning(format!("Not an index: {:?}", input)),
            },
            PromptKind::ParCategory(op) => {
                if input.is_empty() {
                    self.log_warning("No category given");
                    return;
                }
                self.open_prompt(PromptKind::ParDomain(op, input), "Domain", "");
            }
            PromptKind::ParDomain(op, category) => {
                let result = match op {
                    ParentalOp::Add => {
                        parental::add_domain_to_category(&self.paths, &category, &input)
                    }
                    ParentalOp::Remove => {
                        parental::remove_domain_from_category(&self.paths, &category, &input)
                    }
                };
                self.log_result(result);
            }
            PromptKind::ParActive => {
                let requested: Vec<String> = input
                    .split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect();
                let result = parental::set_active_categories(&self.paths, &requested);
                self.log_result(result);
            }
            PromptKind::ParRange => {
                let result = parental::set_schedule_range(&self.paths, &input);
                self.log_result(result);
            }
            PromptKind::InvSubnet => {
                let subnet = if input.is_empty() { None } else { Some(input.as_str()) };
                match subnet {
                    Some(s) => self.log_info(format!("Scanning {}...", s)),
                    None => self.log_info("Scanning auto-detected subnets..."),
                }
                let records = inventory::smart_scan(subnet);
                let records = enrich::enrich_with_names(records, SCAN_NAME_LOOKUPS);
                self.show_scan_results("Network scan", records);
            }
        }
    }

    fn finish_rule_draft(&mut self) {
        let draft: Vec<String> = std::mem::take(&mut self.rule_draft);
        if draft.len() != RULE_FIELDS.len() {
            self.log_warning("Rule entry cancelled");
            return;
        }
        let result = firewall::add_rule(
            &self.paths,
            &draft[0],
            &draft[1],
            &draft[2],
            &draft[3],
            &draft[4],
            &draft[5],
            &draft[6],
        );
        self.log_result(result);
    }

    fn dns_status(&mut self) {
        let blocklist = dns::load_blocklist(&self.paths).unwrap_or_default();
        let allowlist = dns::load_allowlist(&self.paths).unwrap_or_default();
        self.log_info(format!(
            "Blocklist: {} domains, allowlist: {}",
            blocklist.len(),
            allowlist.len()
        ));
        let examples: Vec<&String> = blocklist.iter().take(5).collect();
        if !examples.is_empty() {
            let listing = examples
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            self.log_info(format!("Examples: {}", listing));
        }
    }

    fn fw_list(&mut self) {
        let rules = firewall::load_rules(&self.paths);
        if rules.is_empty() {
            self.log_info("No firewall rules stored");
            return;
        }
        let mut lines = vec![format!("{:>3}  {}", "IDX", "RULE")];
        lines.extend(
            rules
                .iter()
                .enumerate()
                .map(|(i, rule)| format!("{:>3}  {}", i, rule.summary())),
        );
        self.show_results(format!("Firewall rules ({})", rules.len()), lines);
    }

    fn parental_status(&mut self) {
        let categories = parental::load_categories(&self.paths);
        let settings = parental::load_settings(&self.paths);
        let sizes = categories
            .iter()
            .map(|(name, domains)| format!("{} ({})", name, domains.len()))
            .collect::<Vec<_>>()
            .join(", ");
        self.log_info(format!("Categories: {}", sizes));
        let active = if settings.active_categories.is_empty() {
            "(none)".to_string()
        } else {
            settings.active_categories.join(", ")
        };
        self.log_info(format!("Active: {}", active));
        if settings.schedule.enabled {
            self.log_info(format!("Schedule: enforced {}", settings.schedule.range));
        } else {
            self.log_info("Schedule: disabled (always enforced)");
        }
    }

    fn show_scan_results(&mut self, title: &str, records: Vec<NeighborRecord>) {
        if records.is_empty() {
            self.log_warning("No devices found");
            return;
        }
        self.log_success(format!("Found {} device(s)", records.len()));
        let mut lines = vec![format!(
            "{:<16} {:<18} {:<11} {:<14} {:<24} {}",
            "IP", "MAC", "STATE", "IFACE", "NAME", "SRC"
        )];
        for r in &records {
            // Vendor stands in for a name when nothing resolved.
            let name = r.name.as_deref().or(r.vendor.as_deref()).unwrap_or("");
            lines.push(format!(
                "{:<16} {:<18} {:<11} {:<14} {:<24} {}",
                r.ip,
                if r.mac.is_empty() { "--" } else { &r.mac },
                r.state,
                r.iface,
                name,
                r.source
            ));
        }
        self.show_results(format!("{} ({})", title, records.len()), lines);
    }

    fn log_result(&mut self, result: Result<Outcome>) {
        match result {
            Ok(outcome) if outcome.ok => self.log_success(outcome.message),
            Ok(outcome) => self.log_warning(outcome.message),
            Err(e) => self.log_error(e.to_string()),
        }
    }

    fn log_path_result(&mut self, what: &str, result: Result<std::path::PathBuf>) {
        match result {
            Ok(path) => self.log_success(format!("{}: {}", what, path.display())),
            Err(e) => self.log_error(e.to_string()),
        }
    }

    // Logging helpers

    /// Append a log entry, evicting the oldest if at capacity.
    fn push_log(&mut self, entry: LogEntry) {
        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.logs.push_back(entry);
    }

    fn log_info(&mut self, msg: impl Into<String>) {
        self.push_log(LogEntry::info(msg));
    }

    fn log_success(&mut self, msg: impl Into<String>) {
        self.push_log(LogEntry::success(msg));
    }

    fn log_warning(&mut self, msg: impl Into<String>) {
        self.push_log(LogEntry::warning(msg));
    }

    fn log_error(&mut self, msg: impl Into<String>) {
        self.push_log(LogEntry::error(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(Paths::new(dir.path()));
        (dir, app)
    }

    #[test]
    fn test_module_navigation() {
        let (_dir, mut app) = app();
        assert_eq!(app.state, AppState::ModuleMenu);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.state, AppState::ActionMenu);
        assert_eq!(app.module, Module::Firewall);
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.state, AppState::ModuleMenu);
    }

    #[test]
    fn test_quit_row() {
        let (_dir, mut app) = app();
        for _ in 0..app.module_row_count() {
            app.handle_key(KeyCode::Down);
        }
        app.handle_key(KeyCode::Enter);
        assert!(app.should_quit);
    }

    #[test]
    fn test_dns_add_prompt_flow() {
        let (_dir, mut app) = app();
        app.handle_key(KeyCode::Enter); // open DNS module
        app.handle_key(KeyCode::Down); // "Add domain"
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.state, AppState::Prompt);
        for c in "ads.example".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.state, AppState::ActionMenu);
        let last = app.logs.back().unwrap();
        assert!(last.message.contains("Added to blocklist"), "{}", last.message);
    }

    #[test]
    fn test_prompt_escape_clears_rule_draft() {
        let (_dir, mut app) = app();
        app.handle_key(KeyCode::Down); // Firewall
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Down); // "Add rule"
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.state, AppState::Prompt);
        app.handle_key(KeyCode::Char('x'));
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.state, AppState::ActionMenu);
        assert!(app.rule_draft.is_empty());
    }

    #[test]
    fn test_rule_prompt_chain_uses_defaults() {
        let (_dir, mut app) = app();
        app.handle_key(KeyCode::Down); // Firewall
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Down); // "Add rule"
        app.handle_key(KeyCode::Enter);
        // Accept the default for every field.
        for _ in RULE_FIELDS {
            app.handle_key(KeyCode::Enter);
        }
        assert_eq!(app.state, AppState::ActionMenu);
        let rules = firewall::load_rules(&app.paths);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "lanshield rule");
    }
}
