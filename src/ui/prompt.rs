//! Text input overlay and the blocklist profile picker.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::app::{App, Prompt};
use crate::dns::BLOCKLIST_PROFILES;
use crate::ui::theme::{colors, styles, symbols};
use crate::ui::widgets::Card;

/// Render the single-line text prompt as a centered overlay card.
pub fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let card_width = 52u16.min(area.width.saturating_sub(4));
    let card_height = 5u16;
    let card_x = area.x + (area.width.saturating_sub(card_width)) / 2;
    let card_y = area.y + (area.height.saturating_sub(card_height)) / 2;
    let card_area = Rect::new(card_x, card_y, card_width, card_height);

    frame.render_widget(Clear, area);
    let title = format!(" {} ", prompt.label);
    let card = Card::new(Span::styled(title, styles::card_title())).focused(true);
    frame.render_widget(card, card_area);

    let inner = Rect::new(
        card_area.x + 2,
        card_area.y + 1,
        card_area.width.saturating_sub(4),
        card_area.height.saturating_sub(2),
    );

    if !prompt.hint.is_empty() {
        let hint = Line::from(Span::styled(
            prompt.hint.clone(),
            Style::default().fg(colors::TEXT_SECONDARY),
        ));
        frame.render_widget(
            Paragraph::new(hint),
            Rect::new(inner.x, inner.y, inner.width, 1),
        );
    }

    let input_display = format!("{}█", prompt.buffer);
    let input_line = Line::from(vec![
        Span::styled("> ", Style::default().fg(colors::TEXT_SECONDARY)),
        Span::styled(
            input_display,
            Style::default()
                .fg(colors::TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(input_line),
        Rect::new(inner.x, inner.y + 2, inner.width, 1),
    );
}

/// Render the blocklist profile picker: curated profiles plus a custom-URL
/// entry point.
pub fn render_import_select(frame: &mut Frame, area: Rect, app: &App) {
    let item_count = BLOCKLIST_PROFILES.len() + 1;
    let card_width = 48u16.min(area.width.saturating_sub(4));
    let card_height = (item_count as u16 + 3).min(area.height.saturating_sub(2));
    let card_x = area.x + (area.width.saturating_sub(card_width)) / 2;
    let card_y = area.y + (area.height.saturating_sub(card_height)) / 2;
    let card_area = Rect::new(card_x, card_y, card_width, card_height);

    frame.render_widget(Clear, area);
    let card = Card::new(Span::styled(" Import Blocklist ", styles::card_title())).focused(true);
    frame.render_widget(card, card_area);

    let inner = Rect::new(
        card_area.x + 2,
        card_area.y + 1,
        card_area.width.saturating_sub(4),
        card_area.height.saturating_sub(2),
    );

    let name_col_width = 18usize;
    for i in 0..item_count {
        let y = inner.y + 1 + i as u16;
        if y >= inner.y + inner.height {
            break;
        }

        let is_selected = i == app.import_selected;
        let prefix = if is_selected {
            format!("  {}  ", symbols::SELECTED)
        } else {
            "     ".to_string()
        };
        let style = if is_selected {
            styles::selected()
        } else {
            styles::unselected()
        };

        let line = if let Some(profile) = BLOCKLIST_PROFILES.get(i) {
            let name = format!("{:<width$}", profile.name, width = name_col_width);
            Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(name, style),
                Span::styled(
                    short_url(profile.url),
                    if is_selected {
                        style
                    } else {
                        Style::default().fg(colors::TEXT_SECONDARY)
                    },
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(prefix, style),
                Span::styled("Custom URL...", style),
            ])
        };

        frame.render_widget(
            Paragraph::new(line),
            Rect::new(inner.x, y, inner.width, 1),
        );
    }
}

/// Last path segment of a profile URL, enough to tell the lists apart.
fn short_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}
