//! Header, separator, and the module/action menus.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, AppState, MODULES};
use crate::ui::theme::{borders, styles, symbols};
use crate::ui::widgets::Card;

/// Render the single-line header with app title and the open module.
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = Span::styled(format!("{} lanshield", symbols::APP_ICON), styles::title());

    let (badge_icon, badge_text, badge_style) = match app.state {
        AppState::ModuleMenu => (symbols::STATUS_INACTIVE, "Menu", styles::hint()),
        _ => (
            symbols::STATUS_ACTIVE,
            app.module.title(),
            styles::module_badge(),
        ),
    };
    let badge = Span::styled(format!("{} {}", badge_icon, badge_text), badge_style);

    let title_width = title.content.chars().count();
    let badge_width = badge.content.chars().count();
    let spacing = (area.width as usize)
        .saturating_sub(title_width + badge_width)
        .max(1);

    let header_line = Line::from(vec![title, Span::raw(" ".repeat(spacing)), badge]);
    frame.render_widget(Paragraph::new(header_line), area);
}

/// Render the separator line below the header.
pub fn render_separator(frame: &mut Frame, area: Rect) {
    let line = borders::HORIZONTAL.repeat(area.width as usize);
    let sep = Paragraph::new(Line::from(Span::styled(line, styles::border_unfocused())));
    frame.render_widget(sep, area);
}

/// Render the top-level module menu as a centered card.
pub fn render_module_menu(frame: &mut Frame, area: Rect, app: &App) {
    let mut rows: Vec<Option<&str>> = Vec::new();
    rows.push(None);
    for module in MODULES {
        rows.push(Some(module.title()));
    }
    rows.push(None);
    rows.push(Some("Quit"));
    rows.push(None);

    // Selectable row index -> menu index mapping: modules first, Quit last.
    let selectable: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.map(|_| i))
        .collect();

    let card_area = centered_card(frame, area, " Modules ", rows.len() as u16);
    let inner = inner_area(card_area);

    for (menu_idx, row_idx) in selectable.iter().enumerate() {
        let y = inner.y + *row_idx as u16;
        if y >= inner.y + inner.height {
            break;
        }
        let label = rows[*row_idx].unwrap_or_default();
        render_row(frame, inner, y, label, menu_idx == app.selected_module);
    }

    let hint_y = card_area.y + card_area.height + 1;
    if hint_y < area.y + area.height {
        let hint = Paragraph::new(Line::from(Span::styled(
            "Press Enter to open a module",
            styles::hint(),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(hint, Rect::new(area.x, hint_y, area.width, 1));
    }
}

/// Render the open module's action menu as a centered card.
pub fn render_action_menu(frame: &mut Frame, area: Rect, app: &App) {
    let actions = app.module.actions();
    let card_title = format!(" {} ", app.module.title());
    let card_area = centered_card(frame, area, &card_title, actions.len() as u16 + 2);
    let inner = inner_area(card_area);

    for (i, action) in actions.iter().enumerate() {
        let y = inner.y + 1 + i as u16;
        if y >= inner.y + inner.height {
            break;
        }
        render_row(frame, inner, y, action.label(), i == app.selected_action);
    }
}

/// Draw a centered card sized for `content_rows` rows and return its area.
fn centered_card(frame: &mut Frame, area: Rect, title: &str, content_rows: u16) -> Rect {
    let card_content_width = 42u16.max(area.width / 3);
    let card_width = (card_content_width + 2).min(area.width);
    let card_height = (content_rows + 2).min(area.height.saturating_sub(2));

    let card_x = area.x + (area.width.saturating_sub(card_width)) / 2;
    let card_y = area.y + (area.height.saturating_sub(card_height)) / 2;
    let card_area = Rect::new(card_x, card_y, card_width, card_height);

    let card = Card::new(Span::styled(title.to_string(), styles::title())).focused(true);
    frame.render_widget(card, card_area);
    card_area
}

fn inner_area(card_area: Rect) -> Rect {
    Rect::new(
        card_area.x + 1,
        card_area.y + 1,
        card_area.width.saturating_sub(2),
        card_area.height.saturating_sub(2),
    )
}

/// One selectable menu row with the ▶ selection marker.
fn render_row(frame: &mut Frame, inner: Rect, y: u16, label: &str, is_selected: bool) {
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
    let line = Line::from(vec![
        Span::styled(prefix, style),
        Span::styled(label.to_string(), style),
    ]);
    frame.render_widget(Paragraph::new(line), Rect::new(inner.x, y, inner.width, 1));
}
