//! Card widget: a rounded-corner box with an optional title and item count.

use ratatui::{buffer::Buffer, layout::Rect, style::Style, text::Span, widgets::Widget};

use crate::ui::theme::{borders, colors, styles};

/// A card with rounded corners (╭╮╰╯), drawn over the full given area.
pub struct Card<'a> {
    /// Title displayed in the top border.
    title: Option<Span<'a>>,
    /// Border style.
    border_style: Style,
    /// Optional item count displayed on the right side of the top border.
    item_count: Option<usize>,
}

impl<'a> Card<'a> {
    pub fn new(title: impl Into<Span<'a>>) -> Self {
        Self {
            title: Some(title.into()),
            border_style: styles::border_unfocused(),
            item_count: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.border_style = if focused {
            styles::border_focused()
        } else {
            styles::border_unfocused()
        };
        self
    }

    pub fn item_count(mut self, count: usize) -> Self {
        self.item_count = Some(count);
        self
    }
}

impl Widget for Card<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 2 || area.height < 2 {
            return;
        }

        let right = area.x + area.width - 1;
        let bottom = area.y + area.height - 1;

        buf.set_string(area.x, area.y, borders::TOP_LEFT, self.border_style);
        buf.set_string(right, area.y, borders::TOP_RIGHT, self.border_style);
        buf.set_string(area.x, bottom, borders::BOTTOM_LEFT, self.border_style);
        buf.set_string(right, bottom, borders::BOTTOM_RIGHT, self.border_style);

        for x in (area.x + 1)..right {
            buf.set_string(x, area.y, borders::HORIZONTAL, self.border_style);
            buf.set_string(x, bottom, borders::HORIZONTAL, self.border_style);
        }
        for y in (area.y + 1)..bottom {
            buf.set_string(area.x, y, borders::VERTICAL, self.border_style);
            buf.set_string(right, y, borders::VERTICAL, self.border_style);
        }

        if let Some(title) = self.title {
            let text = format!(" {} ", title.content);
            if (text.chars().count() as u16) <= area.width.saturating_sub(4) {
                buf.set_string(area.x + 1, area.y, &text, title.style);
            }
        }

        if let Some(count) = self.item_count {
            let text = format!(" {} items ", count);
            let width = text.len() as u16;
            if width + 2 < area.width {
                buf.set_string(
                    right.saturating_sub(width),
                    area.y,
                    &text,
                    Style::default().fg(colors::TEXT_SECONDARY),
                );
            }
        }
    }
}
