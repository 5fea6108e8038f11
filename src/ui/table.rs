//! Scrollable results view for scans and rule listings.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::ui::theme::{colors, styles};
use crate::ui::widgets::Card;

/// Render the results card over the full content area, with the rows
/// scrolled to `results_offset`. The first row is treated as a header.
pub fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(" {} ", app.results_title);
    let card = Card::new(Span::styled(title, styles::card_title()))
        .focused(true)
        .item_count(app.results.len().saturating_sub(1));
    frame.render_widget(card, area);

    let inner = Rect::new(
        area.x + 2,
        area.y + 1,
        area.width.saturating_sub(4),
        area.height.saturating_sub(2),
    );
    if inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    if let Some(header) = app.results.first() {
        lines.push(Line::from(Span::styled(
            header.clone(),
            styles::card_title(),
        )));
    }

    let body_rows = inner.height.saturating_sub(1) as usize;
    let offset = app
        .results_offset
        .min(app.results.len().saturating_sub(1));
    for row in app.results.iter().skip(1).skip(offset).take(body_rows) {
        lines.push(Line::from(Span::styled(
            row.clone(),
            Style::default().fg(colors::TEXT_PRIMARY),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
