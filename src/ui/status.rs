//! Activity log panel and help bar.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use std::collections::VecDeque;

use crate::app::LogEntry;
use crate::ui::theme::{colors, styles, symbols};

/// Log level for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, LogLevel::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, LogLevel::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, LogLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, LogLevel::Error)
    }

    fn new(message: impl Into<String>, level: LogLevel) -> Self {
        let now = chrono::Local::now();
        Self {
            timestamp: now.format("%H:%M").to_string(),
            message: message.into(),
            level,
        }
    }
}

/// Render the activity/log panel.
pub fn render_status_panel(
    frame: &mut Frame,
    area: Rect,
    logs: &VecDeque<LogEntry>,
    max_lines: usize,
) {
    let visible_logs: Vec<Line> = logs
        .iter()
        .rev()
        .take(max_lines)
        .rev()
        .map(format_log_entry)
        .collect();

    let log_panel = Paragraph::new(visible_logs)
        .block(
            Block::default()
                .title(Span::styled(" Activity ", styles::card_title()))
                .borders(Borders::TOP)
                .border_style(styles::border_unfocused()),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(log_panel, area);

    // Entry count on the right side of the title line
    let count_text = format!(" {} items ", logs.len());
    let count_width = count_text.len() as u16;
    let count_x = area.x + area.width.saturating_sub(count_width + 1);
    if count_x > area.x + 12 {
        let count_para = Paragraph::new(Line::from(Span::styled(
            count_text,
            Style::default().fg(colors::TEXT_SECONDARY),
        )));
        frame.render_widget(count_para, Rect::new(count_x, area.y, count_width, 1));
    }
}

/// Format a single log entry with icon.
fn format_log_entry(entry: &LogEntry) -> Line<'static> {
    let (icon, msg_style) = match entry.level {
        LogLevel::Success => (symbols::STATUS_ACTIVE, Style::default().fg(colors::SUCCESS)),
        LogLevel::Info => ("i", Style::default().fg(colors::TEXT_PRIMARY)),
        LogLevel::Warning => (symbols::WARNING, Style::default().fg(colors::WARNING)),
        LogLevel::Error => (symbols::ERROR, Style::default().fg(colors::ERROR)),
    };

    Line::from(vec![
        Span::styled(
            format!("  {}  ", entry.timestamp),
            Style::default().fg(colors::TEXT_SECONDARY),
        ),
        Span::styled(format!("{}  ", icon), msg_style),
        Span::styled(entry.message.clone(), msg_style),
    ])
}

/// Render help text at the bottom with styled keys.
pub fn render_help(frame: &mut Frame, area: Rect, context_help: &str) {
    let help_line = Line::from(parse_help_text(context_help));
    frame.render_widget(Paragraph::new(help_line), area);
}

/// Split `key: action` groups (separated by double spaces) and style the
/// key part distinctly.
fn parse_help_text(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    spans.push(Span::raw("  "));

    for (i, part) in text.split("  ").enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        if let Some(colon_idx) = part.find(':') {
            let key = &part[..colon_idx];
            let action = part[colon_idx + 1..].trim_start();
            spans.push(Span::styled(key.to_string(), styles::help_key()));
            spans.push(Span::styled(format!(" {}", action), styles::help_text()));
        } else {
            spans.push(Span::styled(part.to_string(), styles::help_text()));
        }
    }

    spans
}
