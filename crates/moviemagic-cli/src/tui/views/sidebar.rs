use moviemagic_core::model::{YEAR_CEILING, YEAR_FLOOR};
use moviemagic_core::prompts::{
    self, CONNECTED_ICON, CONNECTED_STATUS, EXAMPLES, SIDEBAR_SUBHEADER, SIDEBAR_TITLE,
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    app::{App, Focus},
    widgets::mode_bar::ModeBar,
};

/// Right-hand panel: the hub intro, then search mode, its description, and
/// the year range.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [intro, settings] =
        Layout::vertical([Constraint::Length(14), Constraint::Min(0)]).areas(area);
    render_intro(frame, intro);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Settings ");
    let inner = block.inner(settings);
    frame.render_widget(block, settings);

    let [mode_label, mode_bar, description, years_label, years, _gap, tip] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(5),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    let heading = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    frame.render_widget(Line::from(Span::styled("Search mode", heading)), mode_label);
    frame.render_widget(
        ModeBar {
            selected: app.mode,
            active: app.focus == Focus::Mode,
        },
        mode_bar,
    );
    frame.render_widget(
        Paragraph::new(app.mode.description())
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true }),
        description,
    );

    frame.render_widget(
        Line::from(vec![
            Span::styled("Release years ", heading),
            Span::styled(
                format!("({YEAR_FLOOR}-{YEAR_CEILING})"),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        years_label,
    );
    frame.render_widget(
        Line::from(vec![
            year_span(app.year_from, app.focus == Focus::YearFrom),
            Span::styled("  to  ", Style::default().fg(Color::DarkGray)),
            year_span(app.year_to, app.focus == Focus::YearTo),
        ]),
        years,
    );

    if let Some(example) = EXAMPLES.get(app.selected_example) {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled("Need some ideas?", heading)),
                Line::from(Span::styled(
                    example.help,
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .wrap(Wrap { trim: true }),
            tip,
        );
    }
}

fn render_intro(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            SIDEBAR_TITLE,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            SIDEBAR_SUBHEADER,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            prompts::SIDEBAR_INTRO,
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{CONNECTED_ICON} {CONNECTED_STATUS}"),
            Style::default().fg(Color::Green),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn year_span(year: u16, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    Span::styled(format!(" {year} "), style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviemagic_core::config::SearchConfig;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(36, 40)).unwrap();
        terminal
            .draw(|frame| render(frame, app, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_sidebar_shows_hub_intro_and_status() {
        let app = App::new(SearchConfig::default(), Duration::ZERO);
        let text = rendered(&app);
        assert!(text.contains("Movie Magic Hub"));
        assert!(text.contains("Your AI-powered Film"));
        assert!(text.contains("Connected to Weaviate"));
        assert!(text.contains("Settings"));
        assert!(text.contains("Hybrid"));
    }
}
