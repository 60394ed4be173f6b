use moviemagic_core::model::SearchResultRow;
use moviemagic_core::session::PreparedSearch;

/// Actions the UI sends to the async worker task.
#[derive(Debug)]
pub enum AsyncAction {
    /// Run the hybrid search for an already-recorded user turn.
    Search { prepared: PreparedSearch },
    /// Generate the grouped recommendation over the same query and filter.
    Generate { prepared: PreparedSearch },
}

/// Results the async worker sends back to the UI.
#[derive(Debug)]
pub enum AsyncResult {
    /// Search finished. An empty `rows` means nothing matched.
    SearchResults {
        prepared: PreparedSearch,
        rows: Vec<SearchResultRow>,
    },
    /// The generated passage, complete.
    Summary { passage: String },
    /// An error occurred during an async operation.
    Error(String),
}
