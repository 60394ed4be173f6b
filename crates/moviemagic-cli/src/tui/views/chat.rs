use moviemagic_core::grid::{ResultCell, ResultGrid};
use moviemagic_core::model::{display_rows, ConversationTurn, Role};
use moviemagic_core::prompts::{self, EXAMPLES, OCCASION_PLACEHOLDER, QUERY_PLACEHOLDER};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    app::{App, Focus},
    views::sidebar,
    widgets::{help_bar::HelpBar, text_input::TextInput},
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [main, side] =
        Layout::horizontal([Constraint::Min(40), Constraint::Length(36)]).areas(area);

    let notice_height = app.notices.len().max(1) as u16;
    let layout = Layout::vertical([
        Constraint::Length(1),             // title
        Constraint::Min(5),                // conversation
        Constraint::Length(notice_height), // transient notices
        Constraint::Length(3),             // query
        Constraint::Length(3),             // occasion
        Constraint::Length(2),             // examples
        Constraint::Length(1),             // help bar
    ])
    .split(main);

    frame.render_widget(
        Line::from(Span::styled(
            "🎬 Welcome to Movie Magic Hub!",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        layout[0],
    );

    render_conversation(frame, app, layout[1]);

    let notices: Vec<Line> = app
        .notices
        .iter()
        .map(|n| Line::from(Span::styled(n.as_str(), Style::default().fg(Color::Yellow))))
        .collect();
    frame.render_widget(Paragraph::new(notices), layout[2]);

    frame.render_widget(
        TextInput {
            label: "What type of movies are you searching for?",
            text: &app.query.text,
            cursor: app.query.cursor,
            placeholder: QUERY_PLACEHOLDER,
            focused: app.focus == Focus::Query,
        },
        layout[3],
    );
    frame.render_widget(
        TextInput {
            label: "What's the occasion?",
            text: &app.occasion.text,
            cursor: app.occasion.cursor,
            placeholder: OCCASION_PLACEHOLDER,
            focused: app.focus == Focus::Occasion,
        },
        layout[4],
    );

    render_examples(frame, app, layout[5]);

    frame.render_widget(
        HelpBar {
            focus: app.focus,
            phase: app.phase,
        },
        layout[6],
    );

    sidebar::render(frame, app, side);
}

fn render_conversation(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat ({}) ", app.session.conversation().len()));
    let inner = block.inner(area);

    let mut lines: Vec<Line> = Vec::new();
    for (index, turn) in app.session.conversation().turns().iter().enumerate() {
        lines.push(role_line(turn.role));

        let content = match &app.animation {
            Some(anim) if anim.turn == index => format!("{}{}", prompts::SUMMARY_PREFIX, anim.frame),
            _ => turn.content.clone(),
        };
        for text in content.lines() {
            lines.push(markdown_line(text));
        }

        match app.grids.get(&index) {
            Some(grid) => lines.extend(grid_lines(grid)),
            None => lines.extend(stored_result_lines(turn, app.settings.row_width)),
        }
        lines.push(Line::from(""));
    }

    let total = wrapped_height(&lines, inner.width);
    let offset = total
        .saturating_sub(usize::from(inner.height))
        .saturating_sub(usize::from(app.scroll_back));
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);

    let chat = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(chat, area);
}

fn role_line(role: Role) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled(
            "you",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Role::Assistant => Line::from(Span::styled(
            "🍿 recommender",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
    }
}

/// Render `**bold**` runs; everything else is plain text.
fn markdown_line(text: &str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, part) in text.split("**").enumerate() {
        if part.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }
    Line::from(spans)
}

/// Results laid out in rows; a poster shows as its title with a frame mark.
fn grid_lines(grid: &ResultGrid) -> Vec<Line<'static>> {
    grid.rows()
        .into_iter()
        .map(|row| {
            let mut spans = vec![Span::raw("  ")];
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
                }
                spans.push(match cell {
                    ResultCell::Poster { title, .. } => Span::styled(
                        format!("🖼 {title}"),
                        Style::default().fg(Color::Cyan),
                    ),
                    ResultCell::Title { title } => Span::raw(title.clone()),
                });
            }
            Line::from(spans)
        })
        .collect()
}

/// Fallback for results turns without a layout: poster rows, then title
/// rows, each `row_width` wide.
fn stored_result_lines(turn: &ConversationTurn, row_width: usize) -> Vec<Line<'static>> {
    let posters = display_rows(turn.images(), row_width).into_iter().map(|row| {
        Line::from(Span::styled(
            format!("  {}", vec!["🖼"; row.len()].join(" │ ")),
            Style::default().fg(Color::Cyan),
        ))
    });
    let titles = display_rows(turn.titles(), row_width)
        .into_iter()
        .map(|row| Line::from(format!("  {}", row.join(" │ "))));
    posters.chain(titles).collect()
}

fn wrapped_height(lines: &[Line], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

fn render_examples(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Examples;
    let lines: Vec<Line> = EXAMPLES
        .chunks(3)
        .enumerate()
        .map(|(row, chunk)| {
            let mut spans = Vec::new();
            for (col, example) in chunk.iter().enumerate() {
                let index = row * 3 + col;
                let style = if focused && index == app.selected_example {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                spans.push(Span::styled(
                    format!("F{}", index + 1),
                    Style::default().fg(Color::Cyan),
                ));
                spans.push(Span::styled(format!(" {} ", example.label()), style));
                spans.push(Span::raw("  "));
            }
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_bold_runs() {
        let line = markdown_line("I'm looking for a **Heist** movie.");
        let bold: Vec<&str> = line
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(bold, vec!["Heist"]);
    }

    #[test]
    fn test_stored_result_lines_follow_row_width() {
        let turn = ConversationTurn::assistant_with_results(
            prompts::RESULTS_TURN,
            vec!["data:image/png;base64,a".into()],
            (0..10).map(|i| format!("Movie {i}")).collect(),
        );
        let lines = stored_result_lines(&turn, 5);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].to_string(), "  Movie 0 │ Movie 1 │ Movie 2 │ Movie 3 │ Movie 4");
    }

    #[test]
    fn test_wrapped_height_counts_wrapped_lines() {
        let lines = vec![Line::from("a".repeat(25)), Line::from("")];
        assert_eq!(wrapped_height(&lines, 10), 4);
    }
}
