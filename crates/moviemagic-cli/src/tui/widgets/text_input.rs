use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// A labelled single-line input with cursor, placeholder and focus highlight.
pub struct TextInput<'a> {
    pub label: &'a str,
    pub text: &'a str,
    /// Cursor position in chars.
    pub cursor: usize,
    pub placeholder: &'a str,
    pub focused: bool,
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", self.label));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let prefix = Span::styled("❯ ", Style::default().fg(Color::Cyan));
        let mut spans = vec![prefix];

        if self.text.is_empty() && !self.focused {
            spans.push(Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            let split = self
                .text
                .char_indices()
                .nth(self.cursor)
                .map(|(i, _)| i)
                .unwrap_or(self.text.len());
            let (before_cursor, after_cursor) = self.text.split_at(split);
            spans.push(Span::raw(before_cursor));

            if self.focused {
                let cursor_char = after_cursor.chars().next().unwrap_or(' ');
                spans.push(Span::styled(
                    cursor_char.to_string(),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ));
                if after_cursor.len() > cursor_char.len_utf8() {
                    spans.push(Span::raw(&after_cursor[cursor_char.len_utf8()..]));
                }
                if self.text.is_empty() {
                    spans.push(Span::styled(
                        self.placeholder,
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            } else {
                spans.push(Span::raw(after_cursor));
            }
        }

        let line = Line::from(spans);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
