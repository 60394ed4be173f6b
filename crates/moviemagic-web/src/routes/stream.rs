//! Server-sent typewriter animation for a finished summary turn.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use moviemagic_core::backend::MovieBackend;
use moviemagic_core::prompts::SUMMARY_PREFIX;
use moviemagic_core::typewriter::Typewriter;

use crate::error::ApiError;
use crate::AppState;

pub fn routes<B: MovieBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new().route("/stream/{turn}", get(stream_summary::<B>))
}

/// Each `frame` event carries the full text so far; `done` carries the
/// settled text.
async fn stream_summary<B: MovieBackend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    Path(turn): Path<usize>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = state
        .sessions
        .get(&headers)
        .ok_or_else(|| ApiError::not_found("no chat session"))?;

    let passage = {
        let web = session.lock().await;
        let passage = web
            .chat
            .conversation()
            .get(turn)
            .and_then(|t| t.content.strip_prefix(SUMMARY_PREFIX))
            .map(str::to_string);
        passage.ok_or_else(|| ApiError::not_found(format!("turn {turn} is not a recommendation")))?
    };

    let delay = Duration::from_millis(state.config.ui.stream_delay_ms);
    Ok(Sse::new(typewriter_events(&passage, delay)).keep_alive(KeepAlive::default()))
}

fn typewriter_events(
    passage: &str,
    delay: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let writer = Typewriter::new(passage);
    let settled = format!("{SUMMARY_PREFIX}{}", writer.final_text());
    let words = writer.frame_count() - 1;

    let frames = stream::iter(writer.take(words).collect::<Vec<_>>()).then(move |frame| async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok::<_, Infallible>(
            Event::default()
                .event("frame")
                .data(format!("{SUMMARY_PREFIX}{frame}")),
        )
    });
    let done = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("done").data(settled))
    });
    frames.chain(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use moviemagic_core::typewriter::CURSOR;
    use tower::ServiceExt;

    async fn session_after_search(state: Arc<AppState<StubBackend>>) -> String {
        let req = Request::builder()
            .method("POST")
            .uri("/search")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("query=Horror&occasion=Halloween&mode=semantic&year_from=1990&year_to=2024"))
            .unwrap();
        let resp = app(state).oneshot(req).await.unwrap();
        let value = resp.headers()[SET_COOKIE].to_str().unwrap();
        value.split(';').next().unwrap().to_string()
    }

    fn stream_request(turn: usize, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/stream/{turn}"))
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_stream_frames_then_done() {
        let state = state(StubBackend::with_rows(movies(1, 0)));
        let cookie = session_after_search(state.clone()).await;

        let resp = app(state).oneshot(stream_request(3, &cookie)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/event-stream");

        let body = body_string(resp).await;
        assert_eq!(body.matches("event: frame").count(), 3);
        assert!(body.contains(&format!("data: {SUMMARY_PREFIX}Watch {CURSOR}")));
        assert_eq!(body.matches("event: done").count(), 1);
        assert!(body.contains(&format!("data: {SUMMARY_PREFIX}Watch Alien tonight \n")));
    }

    #[tokio::test]
    async fn test_stream_rejects_non_summary_turn() {
        let state = state(StubBackend::with_rows(movies(1, 0)));
        let cookie = session_after_search(state.clone()).await;

        // Turn 1 is the user message.
        let resp = app(state).oneshot(stream_request(1, &cookie)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_without_session() {
        let state = state(StubBackend::with_rows(vec![]));
        let resp = app(state)
            .oneshot(
                Request::builder()
                    .uri("/stream/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "no chat session");
    }
}
