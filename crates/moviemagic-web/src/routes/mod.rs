pub mod api;
pub mod chat;
pub mod stream;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;
use moviemagic_core::backend::MovieBackend;

use crate::AppState;

pub fn router<B: MovieBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/health", get(health::<B>))
        .merge(chat::routes::<B>())
        .merge(stream::routes::<B>())
        .merge(api::routes::<B>())
        .fallback(not_found)
}

/// Liveness only; Weaviate is not contacted.
async fn health<B: MovieBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "collection": state.config.search.collection,
            "sessions": state.sessions.len(),
        })),
    )
}

async fn not_found() -> (StatusCode, Html<String>) {
    let body = r#"<!doctype html>
<html><head><title>404 · Movie Magic Hub</title>
<style>body{font-family:system-ui;background:#14101f;color:#e8e4f0;display:flex;justify-content:center;align-items:center;height:100vh;margin:0}
.box{text-align:center}
h1{font-size:4rem;color:#c39bff;margin:0}
p{color:#9a93ab;margin:0.5rem 0 1.5rem}
a{color:#c39bff;text-decoration:none;padding:0.5rem 1rem;border:1px solid #3a2f55;border-radius:8px}
a:hover{border-color:#c39bff;background:rgba(195,155,255,0.1)}</style>
</head><body><div class="box"><h1>404</h1><p>This page doesn't exist.</p><a href="/">Back to the chat</a></div></body></html>"#;
    (StatusCode::NOT_FOUND, Html(body.to_string()))
}
