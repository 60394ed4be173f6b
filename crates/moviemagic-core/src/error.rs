use thiserror::Error;

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("{0} not set")]
    MissingEnv(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Weaviate error: {0}")]
    Backend(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MovieError {
    /// Returns `true` when the error means the search service could not be
    /// reached at all (as opposed to the service rejecting the request).
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Backend(msg) => is_unavailable_message(msg),
            _ => false,
        }
    }
}

fn is_unavailable_message(msg: &str) -> bool {
    let msg_lower = msg.to_lowercase();
    for code in ["502", "503", "504"] {
        if msg_lower.contains(code) {
            return true;
        }
    }
    let patterns = [
        "timeout",
        "timed out",
        "connection refused",
        "connection reset",
        "dns error",
        "temporarily unavailable",
    ];
    patterns.iter().any(|p| msg_lower.contains(p))
}

pub type Result<T> = std::result::Result<T, MovieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_names_the_variable() {
        let err = MovieError::MissingEnv("WEAVIATE_URL".into());
        assert_eq!(err.to_string(), "WEAVIATE_URL not set");
    }

    #[test]
    fn test_unavailable_503() {
        let err = MovieError::Backend("GraphQL returned 503 Service Unavailable".into());
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_unavailable_connection_refused() {
        let err = MovieError::Backend("connection refused".into());
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_graphql_rejection_is_not_unavailable() {
        let err = MovieError::Backend("Cannot query field \"poster\" on type \"MovieDemo\"".into());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_invalid_input_is_not_unavailable() {
        let err = MovieError::InvalidInput("year range 2020-1990 is reversed".into());
        assert!(!err.is_unavailable());
    }
}
