use serde::{Deserialize, Serialize};

use crate::error::{MovieError, Result};

pub const YEAR_FLOOR: u16 = 1950;
pub const YEAR_CEILING: u16 = 2024;
pub const DEFAULT_YEARS: (u16, u16) = (1990, 2024);

/// How results are ranked. Each mode pins the hybrid `alpha` the service uses
/// to blend BM25 and vector scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Keyword,
    Semantic,
    #[default]
    Hybrid,
}

impl SearchMode {
    pub const ALL: [SearchMode; 3] = [SearchMode::Keyword, SearchMode::Semantic, SearchMode::Hybrid];

    pub fn alpha(self) -> f32 {
        match self {
            SearchMode::Keyword => 0.0,
            SearchMode::Semantic => 1.0,
            SearchMode::Hybrid => 0.7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::Keyword => "Keyword",
            SearchMode::Semantic => "Semantic",
            SearchMode::Hybrid => "Hybrid",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SearchMode::Keyword => "Looking for a classic keyword search? The BM25 algorithm ranks movies based on how often your keywords appear.",
            SearchMode::Semantic => "Want to find films based on their overall meaning? The semantic (vector) search fetches results closest to your search context.",
            SearchMode::Hybrid => "Can't decide? The Hybrid search merges both keyword and semantic results for the best of both worlds!",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SearchMode::Keyword => SearchMode::Semantic,
            SearchMode::Semantic => SearchMode::Hybrid,
            SearchMode::Hybrid => SearchMode::Keyword,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SearchMode::Keyword => SearchMode::Hybrid,
            SearchMode::Semantic => SearchMode::Keyword,
            SearchMode::Hybrid => SearchMode::Semantic,
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" | "bm25" => Ok(SearchMode::Keyword),
            "semantic" | "vector" => Ok(SearchMode::Semantic),
            "hybrid" => Ok(SearchMode::Hybrid),
            other => Err(format!(
                "unknown search mode: '{other}' (expected keyword, semantic, or hybrid)"
            )),
        }
    }
}

/// Inclusive release-year window. Always `min <= max`, both within
/// [`YEAR_FLOOR`]..=[`YEAR_CEILING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    min: u16,
    max: u16,
}

impl YearRange {
    pub fn new(min: u16, max: u16) -> Result<Self> {
        if min > max {
            return Err(MovieError::InvalidInput(format!(
                "year range {min}-{max} is reversed: start must not be after end"
            )));
        }
        if min < YEAR_FLOOR || max > YEAR_CEILING {
            return Err(MovieError::InvalidInput(format!(
                "year range {min}-{max} is outside {YEAR_FLOOR}-{YEAR_CEILING}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u16 {
        self.min
    }

    pub fn max(&self) -> u16 {
        self.max
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_YEARS.0,
            max: DEFAULT_YEARS.1,
        }
    }
}

/// What the user asked for, already sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub years: YearRange,
    pub mode: SearchMode,
}

impl SearchRequest {
    pub fn alpha(&self) -> f32 {
        self.mode.alpha()
    }
}

/// One movie as returned by the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultRow {
    pub title: String,
    pub tagline: String,
    /// Base64 image payload, when the object has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl SearchResultRow {
    pub fn poster_uri(&self) -> Option<String> {
        self.poster.as_deref().map(poster_data_uri)
    }
}

/// Wrap a base64 poster in a `data:` URI. The payload is not validated.
pub fn poster_data_uri(base64: &str) -> String {
    format!("data:image/png;base64,{base64}")
}
