use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::{graphql, GroupedTask, HybridQuery, MovieBackend};
use crate::config::{Secrets, WeaviateConfig};
use crate::error::{MovieError, Result};
use crate::model::SearchResultRow;

/// Weaviate Cloud client.
///
/// Talks to the cluster's GraphQL endpoint. The generation provider key is
/// forwarded on every request so the cluster can run grouped generation.
pub struct WeaviateClient {
    graphql_url: String,
    http: reqwest::Client,
}

impl WeaviateClient {
    pub fn new(secrets: &Secrets, settings: &WeaviateConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", secrets.weaviate_api_key), "WEAVIATE_API_KEY")?,
        );
        headers.insert(
            "X-Cohere-Api-Key",
            header_value(&secrets.cohere_api_key, "COHERE_API_KEY")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()?;

        Ok(Self {
            graphql_url: graphql_url(&secrets.weaviate_url),
            http,
        })
    }

    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// POST one GraphQL document and return the raw body.
    async fn post_graphql(&self, operation: &str, query: String) -> Result<String> {
        tracing::debug!(operation, url = %self.graphql_url, "weaviate request");
        let resp = self
            .http
            .post(&self.graphql_url)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(MovieError::Backend(format!(
                "{operation} returned {status}: {}",
                preview(&body)
            )));
        }
        Ok(body)
    }
}

impl MovieBackend for WeaviateClient {
    async fn search(&self, query: &HybridQuery) -> Result<Vec<SearchResultRow>> {
        let document = graphql::search_query(query)?;
        let body = self.post_graphql("search", document).await?;
        let rows = graphql::parse_rows(&query.collection, &body).map_err(|e| with_preview(e, &body))?;
        tracing::info!(
            collection = %query.collection,
            alpha = query.alpha,
            from = query.filter.min,
            to = query.filter.max,
            count = rows.len(),
            "hybrid search"
        );
        Ok(rows)
    }

    async fn generate_grouped(&self, query: &HybridQuery, task: &GroupedTask) -> Result<String> {
        let document = graphql::generate_query(query, task)?;
        let body = self.post_graphql("generate", document).await?;
        let passage =
            graphql::parse_generated(&query.collection, &body).map_err(|e| with_preview(e, &body))?;
        tracing::info!(chars = passage.len(), "grouped generation");
        Ok(passage)
    }
}

/// `<url>/v1/graphql`, defaulting to https when the cluster URL has no scheme.
fn graphql_url(cluster_url: &str) -> String {
    let trimmed = cluster_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        format!("{trimmed}/v1/graphql")
    } else {
        format!("https://{trimmed}/v1/graphql")
    }
}

fn header_value(value: &str, name: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| MovieError::Config(format!("{name} contains characters not allowed in a header")))
}

/// Undecodable bodies are reported with the first 300 characters attached.
fn with_preview(err: MovieError, body: &str) -> MovieError {
    match err {
        MovieError::Serialization(e) => MovieError::Backend(format!(
            "failed to decode GraphQL response: {e}\nBody: {}",
            preview(body)
        )),
        other => other,
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(300) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets(url: &str) -> Secrets {
        Secrets {
            weaviate_url: url.into(),
            weaviate_api_key: "wv-key".into(),
            cohere_api_key: "co-key".into(),
        }
    }

    #[test]
    fn test_graphql_url_adds_scheme() {
        assert_eq!(
            graphql_url("demo-abc.weaviate.network"),
            "https://demo-abc.weaviate.network/v1/graphql"
        );
    }

    #[test]
    fn test_graphql_url_keeps_scheme_and_trims_slash() {
        assert_eq!(
            graphql_url("http://localhost:8080/"),
            "http://localhost:8080/v1/graphql"
        );
    }

    #[test]
    fn test_client_builds_from_secrets() {
        let client =
            WeaviateClient::new(&secrets("demo.weaviate.network"), &WeaviateConfig::default())
                .unwrap();
        assert_eq!(
            client.graphql_url(),
            "https://demo.weaviate.network/v1/graphql"
        );
    }

    #[test]
    fn test_key_with_newline_is_config_error() {
        let mut s = secrets("demo.weaviate.network");
        s.cohere_api_key = "bad\nkey".into();
        let result = WeaviateClient::new(&s, &WeaviateConfig::default());
        assert!(matches!(result, Err(MovieError::Config(_))));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let body = "é".repeat(400);
        assert_eq!(preview(&body).chars().count(), 300);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_decode_failure_becomes_backend_error_with_body() {
        let err = graphql::parse_rows("MovieDemo", "upstream exploded").unwrap_err();
        let err = with_preview(err, "upstream exploded");
        assert!(matches!(err, MovieError::Backend(ref m) if m.contains("upstream exploded")));
    }
}
