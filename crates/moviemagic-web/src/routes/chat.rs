use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use moviemagic_core::backend::MovieBackend;
use moviemagic_core::grid::{ResultCell, ResultGrid};
use moviemagic_core::model::{
    display_rows, ConversationTurn, Role, SearchMode, YEAR_CEILING, YEAR_FLOOR,
};
use moviemagic_core::prompts::{self, EXAMPLES};
use moviemagic_core::session::{run_cycle, CycleOutcome, SearchForm};
use moviemagic_core::MovieError;

use crate::error::{html_escape, AppError};
use crate::session::{set_cookie_value, SessionHandle, WebSession};
use crate::AppState;

pub fn routes<B: MovieBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/", get(chat_page::<B>))
        .route("/search", post(submit_search::<B>))
        .route("/example/{index}", post(run_example::<B>))
}

// -- View models --

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate {
    sidebar_title: &'static str,
    sidebar_subheader: &'static str,
    sidebar_intro: &'static str,
    connected_status: String,
    turns: Vec<TurnView>,
    notices: Vec<String>,
    error: Option<String>,
    query: String,
    occasion: String,
    query_placeholder: &'static str,
    occasion_placeholder: &'static str,
    modes: Vec<ModeView>,
    mode_description: &'static str,
    year_from: u16,
    year_to: u16,
    year_floor: u16,
    year_ceiling: u16,
    examples: Vec<ExampleView>,
    /// Summary turn to type out via `/stream/{turn}`.
    animate: Option<usize>,
}

struct TurnView {
    is_user: bool,
    html: String,
    rows: Vec<Vec<CellView>>,
    streaming: bool,
}

struct CellView {
    title: String,
    poster: Option<String>,
}

struct ModeView {
    value: String,
    label: &'static str,
    selected: bool,
}

struct ExampleView {
    index: usize,
    label: String,
    help: &'static str,
}

impl ChatTemplate {
    /// Build the page and consume the one-shot state (notices, error banner,
    /// pending animation).
    fn take_from(web: &mut WebSession, row_width: usize) -> Self {
        let animate = web.animate.take();
        let turns = web
            .chat
            .conversation()
            .turns()
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                turn_view(turn, web.grids.get(&index), animate == Some(index), row_width)
            })
            .collect();

        let (query, occasion) = web
            .chat
            .take_prefill()
            .unwrap_or_else(|| (web.form.query.clone(), web.form.occasion.clone()));

        Self {
            sidebar_title: prompts::SIDEBAR_TITLE,
            sidebar_subheader: prompts::SIDEBAR_SUBHEADER,
            sidebar_intro: prompts::SIDEBAR_INTRO,
            connected_status: format!("{} {}", prompts::CONNECTED_ICON, prompts::CONNECTED_STATUS),
            turns,
            notices: std::mem::take(&mut web.notices),
            error: web.error.take(),
            query,
            occasion,
            query_placeholder: prompts::QUERY_PLACEHOLDER,
            occasion_placeholder: prompts::OCCASION_PLACEHOLDER,
            modes: SearchMode::ALL
                .iter()
                .map(|mode| ModeView {
                    value: mode.label().to_lowercase(),
                    label: mode.label(),
                    selected: *mode == web.form.mode,
                })
                .collect(),
            mode_description: web.form.mode.description(),
            year_from: web.form.year_from,
            year_to: web.form.year_to,
            year_floor: YEAR_FLOOR,
            year_ceiling: YEAR_CEILING,
            examples: EXAMPLES
                .iter()
                .enumerate()
                .map(|(index, example)| ExampleView {
                    index,
                    label: example.label(),
                    help: example.help,
                })
                .collect(),
            animate,
        }
    }
}

fn turn_view(
    turn: &ConversationTurn,
    grid: Option<&ResultGrid>,
    streaming: bool,
    row_width: usize,
) -> TurnView {
    let rows = match grid {
        Some(grid) => grid
            .rows()
            .into_iter()
            .map(|row| row.iter().map(cell_view).collect())
            .collect(),
        None => stored_rows(turn, row_width),
    };
    // A streamed summary starts from its prefix; the frames fill in the rest.
    let html = if streaming {
        html_escape(prompts::SUMMARY_PREFIX)
    } else {
        markdown_html(&turn.content)
    };
    TurnView {
        is_user: turn.role == Role::User,
        html,
        rows,
        streaming,
    }
}

fn cell_view(cell: &ResultCell) -> CellView {
    match cell {
        ResultCell::Poster { uri, title } => CellView {
            title: title.clone(),
            poster: Some(uri.clone()),
        },
        ResultCell::Title { title } => CellView {
            title: title.clone(),
            poster: None,
        },
    }
}

/// Rows rebuilt from the turn alone: poster rows first, then title rows,
/// each `row_width` wide.
fn stored_rows(turn: &ConversationTurn, row_width: usize) -> Vec<Vec<CellView>> {
    let posters = display_rows(turn.images(), row_width).into_iter().map(|row| {
        row.iter()
            .map(|uri| CellView {
                title: String::new(),
                poster: Some(uri.clone()),
            })
            .collect::<Vec<_>>()
    });
    let titles = display_rows(turn.titles(), row_width).into_iter().map(|row| {
        row.iter()
            .map(|title| CellView {
                title: title.clone(),
                poster: None,
            })
            .collect::<Vec<_>>()
    });
    posters.chain(titles).collect()
}

/// Escape the text and turn `**bold**` runs into `<strong>`.
fn markdown_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len());
    for (i, part) in text.split("**").enumerate() {
        let escaped = html_escape(part);
        if i % 2 == 1 {
            html.push_str("<strong>");
            html.push_str(&escaped);
            html.push_str("</strong>");
        } else {
            html.push_str(&escaped);
        }
    }
    html
}

// -- Handlers --

async fn chat_page<B: MovieBackend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let handle = state.sessions.resolve(&headers);
    let html = {
        let mut web = handle.session.lock().await;
        web.chat.greet();
        let tmpl = ChatTemplate::take_from(&mut web, state.config.search.row_width);
        tmpl.render()?
    };
    Ok(with_cookie(&handle, Html(html)))
}

async fn submit_search<B: MovieBackend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    Form(form): Form<SearchForm>,
) -> Response {
    let handle = state.sessions.resolve(&headers);
    {
        let mut guard = handle.session.lock().await;
        let web = &mut *guard;
        web.chat.greet();
        search(&state, web, form).await;
    }
    with_cookie(&handle, Redirect::to("/"))
}

async fn run_example<B: MovieBackend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Response {
    let handle = state.sessions.resolve(&headers);
    {
        let mut guard = handle.session.lock().await;
        let web = &mut *guard;
        web.chat.greet();
        match web.chat.select_example(index) {
            Ok(example) => {
                let mut form = web.form.clone();
                form.apply_example(example);
                search(&state, web, form).await;
            }
            Err(e) => web.error = Some(e.to_string()),
        }
    }
    with_cookie(&handle, Redirect::to("/"))
}

/// Run one cycle and leave its outcome on the session for the next render.
async fn search<B: MovieBackend>(state: &AppState<B>, web: &mut WebSession, form: SearchForm) {
    let outcome = run_cycle(&mut web.chat, &state.backend, &state.config.search, &form).await;
    web.form = form;

    match outcome {
        Ok(CycleOutcome::NoMatches { notice }) => web.notices.push(notice),
        Ok(CycleOutcome::Recommended {
            grid, summary_turn, ..
        }) => {
            // The results turn sits right before the summary.
            web.grids.insert(summary_turn.saturating_sub(1), grid);
            web.notices.push(prompts::FOUND_NOTICE.to_string());
            web.animate = Some(summary_turn);
        }
        Err(e) => {
            tracing::warn!(error = %e, "search cycle failed");
            web.error = Some(describe_error(&e));
        }
    }
}

fn describe_error(err: &MovieError) -> String {
    if err.is_unavailable() {
        format!("{err}. Weaviate looks unreachable; check WEAVIATE_URL and try again.")
    } else {
        err.to_string()
    }
}

fn with_cookie(handle: &SessionHandle, resp: impl IntoResponse) -> Response {
    let mut resp = resp.into_response();
    if handle.is_new {
        if let Ok(value) = HeaderValue::from_str(&set_cookie_value(handle.id)) {
            resp.headers_mut().insert(SET_COOKIE, value);
        }
    }
    resp
}
