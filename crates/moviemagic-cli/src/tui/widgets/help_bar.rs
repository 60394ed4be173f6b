use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tui::app::{Focus, Phase};

/// Bottom help bar showing key bindings for the focused control.
pub struct HelpBar {
    pub focus: Focus,
    pub phase: Phase,
}

impl Widget for HelpBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::DarkGray);
        let key_style = Style::default().fg(Color::Cyan);

        let mut spans: Vec<Span> = match self.phase {
            Phase::Searching => vec![Span::styled("Searching...  ", Style::default().fg(Color::Yellow))],
            Phase::Generating => vec![Span::styled(
                "Generating...  ",
                Style::default().fg(Color::Yellow),
            )],
            Phase::Animating | Phase::AwaitingInput => Vec::new(),
        };

        match self.focus {
            Focus::Query | Focus::Occasion => spans.extend([
                Span::styled("Enter", key_style),
                Span::styled(" search  ", style),
            ]),
            Focus::Mode => spans.extend([
                Span::styled("←/→", key_style),
                Span::styled(" mode  ", style),
                Span::styled("Enter", key_style),
                Span::styled(" search  ", style),
            ]),
            Focus::YearFrom | Focus::YearTo => spans.extend([
                Span::styled("←/→", key_style),
                Span::styled(" ±1  ", style),
                Span::styled("PgUp/PgDn", key_style),
                Span::styled(" ±10  ", style),
                Span::styled("Enter", key_style),
                Span::styled(" search  ", style),
            ]),
            Focus::Examples => spans.extend([
                Span::styled("←/→", key_style),
                Span::styled(" pick  ", style),
                Span::styled("Enter", key_style),
                Span::styled(" run example  ", style),
            ]),
        }

        spans.extend([
            Span::styled("F1-F6", key_style),
            Span::styled(" examples  ", style),
            Span::styled("Tab", key_style),
            Span::styled(" next field  ", style),
            Span::styled("↑/↓", key_style),
            Span::styled(" scroll  ", style),
            Span::styled("Esc", key_style),
            Span::styled(" quit", style),
        ]);

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
