//! Per-browser chat sessions, keyed by a cookie.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use moviemagic_core::config::WebConfig;
use moviemagic_core::grid::ResultGrid;
use moviemagic_core::session::{ChatSession, SearchForm};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "mm_session";

/// Everything one browser sees: the conversation plus the page state that is
/// never recorded in it.
#[derive(Debug, Default)]
pub struct WebSession {
    pub chat: ChatSession,
    /// Last submitted widget values, echoed back into the form.
    pub form: SearchForm,
    /// Result layouts by the index of their results turn.
    pub grids: HashMap<usize, ResultGrid>,
    /// Shown on the next render only.
    pub notices: Vec<String>,
    pub error: Option<String>,
    /// Summary turn the next render should type out.
    pub animate: Option<usize>,
}

pub type SharedSession = Arc<tokio::sync::Mutex<WebSession>>;

#[derive(Debug)]
struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// In-memory sessions. Idle ones expire after `ttl`; past `capacity` the
/// least recently seen is dropped.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
    capacity: usize,
}

pub struct SessionHandle {
    pub id: Uuid,
    pub session: SharedSession,
    /// The cookie must be (re)issued.
    pub is_new: bool,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &WebConfig) -> Self {
        Self::new(
            Duration::from_secs(config.session_ttl_secs),
            config.max_sessions,
        )
    }

    /// The session named by the request cookie, or a fresh one.
    pub fn resolve(&self, headers: &HeaderMap) -> SessionHandle {
        self.resolve_at(headers, Instant::now())
    }

    fn resolve_at(&self, headers: &HeaderMap, now: Instant) -> SessionHandle {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < ttl);

        if let Some(id) = session_id(headers) {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return SessionHandle {
                    id,
                    session: entry.session.clone(),
                    is_new: false,
                };
            }
        }

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    tracing::debug!(%id, "evicted chat session");
                }
                None => break,
            }
        }

        let id = Uuid::now_v7();
        let session = SharedSession::default();
        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(%id, "new chat session");
        SessionHandle {
            id,
            session,
            is_new: true,
        }
    }

    /// Lookup only; never creates a session.
    pub fn get(&self, headers: &HeaderMap) -> Option<SharedSession> {
        let id = session_id(headers)?;
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(&id)
            .filter(|entry| entry.last_seen.elapsed() < self.ttl)
            .map(|entry| entry.session.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

/// Parse the session id out of the `Cookie` header(s).
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn set_cookie_value(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_id_among_other_cookies() {
        let id = Uuid::now_v7();
        let headers = headers_with_cookie(&format!("theme=dark; {SESSION_COOKIE}={id}; x=1"));
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        let headers = headers_with_cookie(&format!("{SESSION_COOKIE}=not-a-uuid"));
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_resolve_reuses_known_session() {
        let store = SessionStore::default();
        let first = store.resolve(&HeaderMap::new());
        assert!(first.is_new);

        let headers = headers_with_cookie(&format!("{SESSION_COOKIE}={}", first.id));
        let second = store.resolve(&headers);
        assert!(!second.is_new);
        assert_eq!(second.id, first.id);
        assert!(Arc::ptr_eq(&first.session, &second.session));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_id_starts_fresh() {
        let store = SessionStore::default();
        let stale = Uuid::now_v7();
        let headers = headers_with_cookie(&format!("{SESSION_COOKIE}={stale}"));
        let handle = store.resolve(&headers);
        assert!(handle.is_new);
        assert_ne!(handle.id, stale);
        assert!(store.get(&headers).is_none());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(60), 10);
        let start = Instant::now();
        let first = store.resolve_at(&HeaderMap::new(), start);
        let headers = headers_with_cookie(&format!("{SESSION_COOKIE}={}", first.id));

        let again = store.resolve_at(&headers, start + Duration::from_secs(30));
        assert!(!again.is_new);

        // Expiry counts from the last visit, not from creation.
        assert!(!store.resolve_at(&headers, start + Duration::from_secs(80)).is_new);
        let late = store.resolve_at(&headers, start + Duration::from_secs(150));
        assert!(late.is_new);
        assert_ne!(late.id, first.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cookieless_clients_are_capped() {
        let store = SessionStore::new(Duration::from_secs(3600), 3);
        let start = Instant::now();
        let first = store.resolve_at(&HeaderMap::new(), start);
        for i in 1..20u64 {
            store.resolve_at(&HeaderMap::new(), start + Duration::from_millis(i));
        }
        assert_eq!(store.len(), 3);

        let headers = headers_with_cookie(&format!("{SESSION_COOKIE}={}", first.id));
        assert!(store.get(&headers).is_none());
    }

    #[test]
    fn test_cookie_value() {
        let id = Uuid::now_v7();
        let value = set_cookie_value(id);
        assert!(value.starts_with(&format!("{SESSION_COOKIE}={id};")));
        assert!(value.contains("HttpOnly"));
    }
}
