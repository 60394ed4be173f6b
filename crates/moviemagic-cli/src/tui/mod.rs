pub mod app;
pub mod event;
mod views;
mod widgets;

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use moviemagic_core::backend::MovieBackend;
use moviemagic_core::config::MovieConfig;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;

use self::app::App;
use self::event::{AsyncAction, AsyncResult};

/// Entry point for the interactive terminal chat.
pub async fn run_tui<B>(config: &MovieConfig, backend: B) -> Result<()>
where
    B: MovieBackend + 'static,
{
    // Channels for async communication
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AsyncAction>();
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<AsyncResult>();

    tokio::spawn(async move {
        worker_loop(backend, &mut action_rx, &result_tx).await;
    });

    let mut terminal = ratatui::init();
    let mut app = App::new(
        config.search.clone(),
        Duration::from_millis(config.ui.stream_delay_ms),
    );

    let result = run_loop(&mut terminal, &mut app, &action_tx, &mut result_rx);

    ratatui::restore();

    result
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    action_tx: &mpsc::UnboundedSender<AsyncAction>,
    result_rx: &mut mpsc::UnboundedReceiver<AsyncResult>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        // Poll for async results (non-blocking)
        while let Ok(result) = result_rx.try_recv() {
            if let Some(action) = app.handle_result(result) {
                let _ = action_tx.send(action);
            }
        }

        if ct_event::poll(app.poll_timeout())? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = app.handle_key(key) {
                        let _ = action_tx.send(action);
                    }
                }
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    views::chat::render(frame, app, frame.area());

    // Render error toast overlay if present
    if let Some(ref msg) = app.error_message {
        render_error_toast(frame, msg);
    }
}

fn render_error_toast(frame: &mut Frame, msg: &str) {
    use ratatui::{
        layout::{Constraint, Flex, Layout},
        style::{Color, Style},
        widgets::{Block, Borders, Clear, Paragraph, Wrap},
    };

    let area = frame.area();
    let [toast_area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [toast_area] = Layout::vertical([Constraint::Length(4)])
        .flex(Flex::Center)
        .areas(toast_area);

    frame.render_widget(Clear, toast_area);
    let toast = Paragraph::new(format!(" 🚨 {msg}"))
        .style(Style::default().fg(Color::White).bg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error "),
        );
    frame.render_widget(toast, toast_area);
}

/// Async worker loop: runs backend calls one at a time, in arrival order.
async fn worker_loop<B: MovieBackend>(
    backend: B,
    action_rx: &mut mpsc::UnboundedReceiver<AsyncAction>,
    result_tx: &mpsc::UnboundedSender<AsyncResult>,
) {
    while let Some(action) = action_rx.recv().await {
        let result = match action {
            AsyncAction::Search { prepared } => match backend.search(&prepared.query).await {
                Ok(rows) => AsyncResult::SearchResults { prepared, rows },
                Err(e) => {
                    tracing::warn!(error = %e, "search failed");
                    AsyncResult::Error(format!("Search failed: {e}"))
                }
            },
            AsyncAction::Generate { prepared } => {
                match backend
                    .generate_grouped(&prepared.query, &prepared.task)
                    .await
                {
                    Ok(passage) => AsyncResult::Summary { passage },
                    Err(e) => {
                        tracing::warn!(error = %e, "generation failed");
                        AsyncResult::Error(format!("Recommendation failed: {e}"))
                    }
                }
            }
        };
        if result_tx.send(result).is_err() {
            break; // UI closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviemagic_core::backend::{GroupedTask, HybridQuery};
    use moviemagic_core::config::SearchConfig;
    use moviemagic_core::model::SearchResultRow;
    use moviemagic_core::session::ChatSession;
    use moviemagic_core::session::SearchForm;
    use moviemagic_core::MovieError;

    struct CannedBackend {
        rows: Vec<SearchResultRow>,
    }

    impl MovieBackend for CannedBackend {
        async fn search(&self, _query: &HybridQuery) -> moviemagic_core::Result<Vec<SearchResultRow>> {
            Ok(self.rows.clone())
        }

        async fn generate_grouped(
            &self,
            _query: &HybridQuery,
            _task: &GroupedTask,
        ) -> moviemagic_core::Result<String> {
            Err(MovieError::Generation("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn test_worker_round_trip() {
        let backend = CannedBackend {
            rows: vec![SearchResultRow {
                title: "Heat".into(),
                tagline: "A Los Angeles crime saga".into(),
                poster: None,
            }],
        };
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(async move {
            worker_loop(backend, &mut action_rx, &result_tx).await;
        });

        let mut session = ChatSession::new();
        let prepared = session
            .begin_search(&SearchForm::default(), &SearchConfig::default())
            .unwrap();
        action_tx
            .send(AsyncAction::Search {
                prepared: prepared.clone(),
            })
            .unwrap();
        action_tx.send(AsyncAction::Generate { prepared }).unwrap();

        match result_rx.recv().await.unwrap() {
            AsyncResult::SearchResults { rows, .. } => assert_eq!(rows.len(), 1),
            other => panic!("expected search results, got {other:?}"),
        }
        match result_rx.recv().await.unwrap() {
            AsyncResult::Error(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("expected error, got {other:?}"),
        }

        drop(action_tx);
        worker.await.unwrap();
    }
}
