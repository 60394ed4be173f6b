use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use moviemagic_core::backend::MovieBackend;
use moviemagic_core::grid::ResultGrid;
use moviemagic_core::model::{SearchMode, SearchResultRow, DEFAULT_YEARS};
use moviemagic_core::session::{run_cycle, ChatSession, CycleOutcome, SearchForm};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

pub fn routes<B: MovieBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new().route("/api/v1/search", get(api_search::<B>))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub occasion: String,
    pub mode: Option<String>,
    pub from: Option<u16>,
    pub to: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub alpha: f32,
    pub from: u16,
    pub to: u16,
    pub results: Vec<SearchResultRow>,
    pub grid: Option<ResultGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// One stateless cycle; nothing is kept between calls.
async fn api_search<B: MovieBackend>(
    State(state): State<Arc<AppState<B>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let mode = match params.mode.as_deref() {
        Some(raw) => raw.parse::<SearchMode>().map_err(ApiError::bad_request)?,
        None => SearchMode::default(),
    };
    let form = SearchForm {
        query: params.q,
        occasion: params.occasion,
        mode,
        year_from: params.from.unwrap_or(DEFAULT_YEARS.0),
        year_to: params.to.unwrap_or(DEFAULT_YEARS.1),
    };

    let mut session = ChatSession::new();
    let outcome = run_cycle(&mut session, &state.backend, &state.config.search, &form).await?;

    let mut response = SearchResponse {
        query: form.query,
        mode,
        alpha: mode.alpha(),
        from: form.year_from,
        to: form.year_to,
        results: Vec::new(),
        grid: None,
        recommendation: None,
        notice: None,
    };
    match outcome {
        CycleOutcome::NoMatches { notice } => response.notice = Some(notice),
        CycleOutcome::Recommended {
            rows, grid, passage, ..
        } => {
            response.results = rows;
            response.grid = Some(grid);
            response.recommendation = Some(passage);
        }
    }
    Ok(Json(response))
}
