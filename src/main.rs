//! lanshield - home network security toolkit
//!
//! DNS blocklisting, firewall rule generation, parental-control scheduling
//! and LAN device inventory behind one menu TUI. Everything is a thin
//! wrapper over local config files and OS-native network tools.

mod app;
mod config;
mod dns;
mod error;
mod firewall;
mod inventory;
mod license;
mod parental;
mod system;
mod ui;

use std::io;
use std::panic;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use app::{App, AppState};
use config::Paths;
use ui::{
    menu::{render_action_menu, render_header, render_module_menu, render_separator},
    prompt::{render_import_select, render_prompt},
    status::{render_help, render_status_panel},
    table::render_results,
};

fn main() -> Result<()> {
    let paths = Paths::new(Paths::default_root());

    // The license gate runs before any terminal setup so its message prints
    // plainly and the exit code survives.
    match license::validate(&paths) {
        Ok(Ok(())) => {}
        Ok(Err(failure)) => {
            eprintln!("{}", failure.describe());
            std::process::exit(failure.exit_code());
        }
        Err(e) => {
            eprintln!("License check failed: {}", e);
            std::process::exit(1);
        }
    }

    init_tracing(&paths);
    tracing::info!(root = %paths.root().display(), "starting");

    if !is_root() {
        tracing::warn!("not running as root; arp-scan and nmap results may be degraded");
    }

    // Restore the terminal if a draw or handler panics
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_app(paths);

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

/// Send tracing diagnostics to a log file under the data root; the terminal
/// belongs to the TUI.
fn init_tracing(paths: &Paths) {
    let log_path = paths.log_file();
    if config::ensure_parent(&log_path).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    true
}

fn run_app(paths: Paths) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(paths);

    loop {
        terminal.draw(|frame| {
            let size = frame.area();

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1), // Header
                    Constraint::Length(1), // Separator
                    Constraint::Min(12),   // Main content
                    Constraint::Length(8), // Activity log
                    Constraint::Length(1), // Help
                ])
                .split(size);

            render_header(frame, chunks[0], &app);
            render_separator(frame, chunks[1]);

            match app.state {
                AppState::ModuleMenu => render_module_menu(frame, chunks[2], &app),
                AppState::ActionMenu => render_action_menu(frame, chunks[2], &app),
                AppState::Prompt => {
                    render_action_menu(frame, chunks[2], &app);
                    if let Some(prompt) = &app.prompt {
                        render_prompt(frame, chunks[2], prompt);
                    }
                }
                AppState::ImportSelect => {
                    render_action_menu(frame, chunks[2], &app);
                    render_import_select(frame, chunks[2], &app);
                }
                AppState::Results => render_results(frame, chunks[2], &app),
            }

            let log_lines = chunks[3].height.saturating_sub(1) as usize;
            render_status_panel(frame, chunks[3], &app.logs, log_lines);

            render_help(frame, chunks[4], app.help_text());
        })?;

        // Operations run inline in handle_key and may block for a while
        // (scans, downloads); the next draw happens when they're done.
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(event::KeyModifiers::CONTROL)
                    {
                        break;
                    }
                    app.handle_key(key.code);
                    if app.should_quit {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
