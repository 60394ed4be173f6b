use crate::error::{MovieError, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Secrets that must be present before anything connects to the service.
pub const REQUIRED_ENV_VARS: &[&str] = &["WEAVIATE_URL", "WEAVIATE_API_KEY", "COHERE_API_KEY"];

/// Read every name in `names` through `lookup`. The first name whose value is
/// absent or empty aborts the load with [`MovieError::MissingEnv`].
pub fn load_required<F>(names: &[&str], lookup: F) -> Result<HashMap<String, String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = HashMap::with_capacity(names.len());
    for &name in names {
        match lookup(name) {
            Some(value) if !value.trim().is_empty() => {
                values.insert(name.to_string(), value);
            }
            _ => return Err(MovieError::MissingEnv(name.to_string())),
        }
    }
    Ok(values)
}

/// Connection secrets for the Weaviate cluster and the generation provider.
#[derive(Clone)]
pub struct Secrets {
    pub weaviate_url: String,
    pub weaviate_api_key: String,
    /// Forwarded to Weaviate as `X-Cohere-Api-Key` for grouped generation.
    pub cohere_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("weaviate_url", &self.weaviate_url)
            .field("weaviate_api_key", &"<redacted>")
            .field("cohere_api_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = load_required(REQUIRED_ENV_VARS, lookup)?;
        let mut take = |name: &str| values.remove(name).unwrap_or_default();
        Ok(Self {
            weaviate_url: take("WEAVIATE_URL"),
            weaviate_api_key: take("WEAVIATE_API_KEY"),
            cohere_api_key: take("COHERE_API_KEY"),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub weaviate: WeaviateConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    /// How many results share one display row.
    #[serde(default = "default_row_width")]
    pub row_width: usize,
    #[serde(default = "default_return_fields")]
    pub return_fields: Vec<String>,
    /// Properties handed to the generator alongside the grouped task.
    #[serde(default = "default_grouped_fields")]
    pub grouped_fields: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            limit: default_search_limit(),
            row_width: default_row_width(),
            return_fields: default_return_fields(),
            grouped_fields: default_grouped_fields(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaviateConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Idle time after which a browser session is forgotten.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Sessions kept at most; the least recently seen goes first.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Pause between words while the recommendation is typed out.
    #[serde(default = "default_stream_delay_ms")]
    pub stream_delay_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            stream_delay_ms: default_stream_delay_ms(),
        }
    }
}

// -- Defaults --

fn default_collection() -> String {
    "MovieDemo".to_string()
}
fn default_search_limit() -> usize {
    10
}
fn default_row_width() -> usize {
    5
}
fn default_return_fields() -> Vec<String> {
    vec!["title".into(), "tagline".into(), "poster".into()]
}
fn default_grouped_fields() -> Vec<String> {
    vec!["title".into(), "tagline".into()]
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_web_host() -> String {
    "127.0.0.1".to_string()
}
fn default_web_port() -> u16 {
    8501
}
fn default_session_ttl_secs() -> u64 {
    1800
}
fn default_max_sessions() -> usize {
    1000
}
fn default_stream_delay_ms() -> u64 {
    20
}

/// Result rows are laid out for at most this many movies.
pub const MAX_SEARCH_LIMIT: usize = 10;
pub const MAX_ROW_WIDTH: usize = 12;

impl MovieConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/moviemagic/config.toml (global)
    /// 2. .moviemagic/config.toml (project)
    /// 3. .moviemagic/config.local.toml (local, gitignored)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = project_dir {
            let project_config = dir.join(".moviemagic").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            let local_config = dir.join(".moviemagic").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| MovieError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| MovieError::Config(e.to_string()))?;

        cfg.validate();
        Ok(cfg)
    }

    /// Defaults only (no files).
    pub fn default_config() -> Self {
        Self {
            search: SearchConfig::default(),
            weaviate: WeaviateConfig::default(),
            web: WebConfig::default(),
            ui: UiConfig::default(),
        }
    }

    /// Clamp out-of-range values and report what was changed.
    /// Lenient: the config is fixed up, never rejected.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.search.collection.trim().is_empty() {
            warnings.push(format!(
                "search.collection is empty, using '{}'",
                default_collection()
            ));
            self.search.collection = default_collection();
        }

        if self.search.limit == 0 || self.search.limit > MAX_SEARCH_LIMIT {
            let clamped = self.search.limit.clamp(1, MAX_SEARCH_LIMIT);
            warnings.push(format!(
                "search.limit = {} out of range [1, {MAX_SEARCH_LIMIT}], setting to {clamped}",
                self.search.limit
            ));
            self.search.limit = clamped;
        }

        if self.search.row_width == 0 || self.search.row_width > MAX_ROW_WIDTH {
            let clamped = self.search.row_width.clamp(1, MAX_ROW_WIDTH);
            warnings.push(format!(
                "search.row_width = {} out of range [1, {MAX_ROW_WIDTH}], setting to {clamped}",
                self.search.row_width
            ));
            self.search.row_width = clamped;
        }

        if !self.search.return_fields.iter().any(|f| f == "title") {
            warnings.push("search.return_fields is missing 'title', adding it".to_string());
            self.search.return_fields.insert(0, "title".to_string());
        }

        if self.search.grouped_fields.is_empty() {
            warnings.push("search.grouped_fields is empty, using title and tagline".to_string());
            self.search.grouped_fields = default_grouped_fields();
        }

        if self.weaviate.timeout_secs == 0 {
            warnings.push("weaviate.timeout_secs = 0, setting to 1".to_string());
            self.weaviate.timeout_secs = 1;
        }
        if self.weaviate.connect_timeout_secs == 0 {
            warnings.push("weaviate.connect_timeout_secs = 0, setting to 1".to_string());
            self.weaviate.connect_timeout_secs = 1;
        }

        if self.web.session_ttl_secs == 0 {
            warnings.push("web.session_ttl_secs = 0, setting to 1".to_string());
            self.web.session_ttl_secs = 1;
        }
        if self.web.max_sessions == 0 {
            warnings.push("web.max_sessions = 0, setting to 1".to_string());
            self.web.max_sessions = 1;
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }
}

/// `~/.config/moviemagic/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("moviemagic").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_secrets_all_present() {
        let secrets = Secrets::from_lookup(lookup_from(&[
            ("WEAVIATE_URL", "https://demo.weaviate.network"),
            ("WEAVIATE_API_KEY", "wv-key"),
            ("COHERE_API_KEY", "co-key"),
        ]))
        .unwrap();
        assert_eq!(secrets.weaviate_url, "https://demo.weaviate.network");
        assert_eq!(secrets.weaviate_api_key, "wv-key");
        assert_eq!(secrets.cohere_api_key, "co-key");
    }

    #[test]
    fn test_missing_secret_is_named() {
        let err = Secrets::from_lookup(lookup_from(&[
            ("WEAVIATE_URL", "https://demo.weaviate.network"),
            ("COHERE_API_KEY", "co-key"),
        ]))
        .unwrap_err();
        assert!(matches!(err, MovieError::MissingEnv(ref n) if n == "WEAVIATE_API_KEY"));
    }

    #[test]
    fn test_empty_secret_counts_as_missing() {
        let err = Secrets::from_lookup(lookup_from(&[
            ("WEAVIATE_URL", ""),
            ("WEAVIATE_API_KEY", "wv-key"),
            ("COHERE_API_KEY", "co-key"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "WEAVIATE_URL not set");
    }

    #[test]
    fn test_first_missing_name_wins() {
        let err = load_required(&["A", "B", "C"], |_| None).unwrap_err();
        assert!(matches!(err, MovieError::MissingEnv(ref n) if n == "A"));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let secrets = Secrets {
            weaviate_url: "https://x".into(),
            weaviate_api_key: "super-secret".into(),
            cohere_api_key: "also-secret".into(),
        };
        let dbg = format!("{secrets:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(!dbg.contains("also-secret"));
    }

    #[test]
    fn test_default_config() {
        let cfg = MovieConfig::default_config();
        assert_eq!(cfg.search.collection, "MovieDemo");
        assert_eq!(cfg.search.limit, 10);
        assert_eq!(cfg.search.row_width, 5);
        assert_eq!(cfg.ui.stream_delay_ms, 20);
        assert_eq!(cfg.search.grouped_fields, vec!["title", "tagline"]);
    }

    #[test]
    fn test_validate_defaults_has_no_warnings() {
        let mut cfg = MovieConfig::default_config();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn test_validate_clamps_limits() {
        let mut cfg = MovieConfig::default_config();
        cfg.search.limit = 0;
        cfg.search.row_width = 40;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert_eq!(cfg.search.limit, 1);
        assert_eq!(cfg.search.row_width, MAX_ROW_WIDTH);
    }

    #[test]
    fn test_validate_caps_limit_at_ten() {
        let mut cfg = MovieConfig::default_config();
        cfg.search.limit = 50;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(cfg.search.limit, 10);
    }

    #[test]
    fn test_validate_session_bounds() {
        let mut cfg = MovieConfig::default_config();
        cfg.web.session_ttl_secs = 0;
        cfg.web.max_sessions = 0;
        assert_eq!(cfg.validate().len(), 2);
        assert_eq!(cfg.web.session_ttl_secs, 1);
        assert_eq!(cfg.web.max_sessions, 1);
    }

    #[test]
    fn test_validate_restores_title_field() {
        let mut cfg = MovieConfig::default_config();
        cfg.search.return_fields = vec!["tagline".into()];
        cfg.validate();
        assert_eq!(cfg.search.return_fields, vec!["title", "tagline"]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = "[search]\nlimit = 5\n";
        let cfg: MovieConfig = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.search.limit, 5);
        assert_eq!(cfg.search.collection, "MovieDemo");
        assert_eq!(cfg.web.port, 8501);
        assert_eq!(cfg.web.session_ttl_secs, 1800);
    }
}
