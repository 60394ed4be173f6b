mod graphql;
mod weaviate;

pub use graphql::{generate_query, parse_generated, parse_rows, search_query};
pub use weaviate::WeaviateClient;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::model::{SearchRequest, SearchResultRow, YearRange};

/// Property the year filter applies to.
pub const RELEASE_YEAR_PROPERTY: &str = "release_year";

/// `release_year >= min AND release_year <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearFilter {
    pub min: u16,
    pub max: u16,
}

impl From<YearRange> for YearFilter {
    fn from(years: YearRange) -> Self {
        Self {
            min: years.min(),
            max: years.max(),
        }
    }
}

/// Everything the search service needs for one filtered hybrid query.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridQuery {
    pub collection: String,
    pub text: String,
    pub return_fields: Vec<String>,
    pub filter: YearFilter,
    pub limit: usize,
    /// 0 = pure keyword (BM25), 1 = pure vector.
    pub alpha: f32,
}

impl HybridQuery {
    pub fn from_request(request: &SearchRequest, settings: &SearchConfig) -> Self {
        Self {
            collection: settings.collection.clone(),
            text: request.query.clone(),
            return_fields: settings.return_fields.clone(),
            filter: request.years.into(),
            limit: settings.limit,
            alpha: request.alpha(),
        }
    }
}

/// Instruction for one generated passage over the whole result group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTask {
    pub instruction: String,
    pub properties: Vec<String>,
}

/// The hosted search + generation service. Weaviate is the real
/// implementation; tests substitute in-memory fakes.
pub trait MovieBackend: Send + Sync {
    /// Run the query and return rows in the service's relevance order.
    /// An empty vector means nothing matched.
    fn search(
        &self,
        query: &HybridQuery,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResultRow>>> + Send;

    /// Run the same query and return one passage generated over the group.
    fn generate_grouped(
        &self,
        query: &HybridQuery,
        task: &GroupedTask,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
