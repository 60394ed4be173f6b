use moviemagic_core::model::SearchMode;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Search mode selector showing all three modes with the current one lit.
pub struct ModeBar {
    pub selected: SearchMode,
    pub active: bool,
}

impl Widget for ModeBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans: Vec<Span> = Vec::new();

        for (i, mode) in SearchMode::ALL.iter().enumerate() {
            let style = if *mode == self.selected {
                if self.active {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                }
            } else {
                Style::default().fg(Color::DarkGray)
            };

            spans.push(Span::styled(format!(" {} ", mode.label()), style));

            if i < SearchMode::ALL.len() - 1 {
                spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
            }
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
