//! One chat session: the conversation log plus the interaction steps that
//! append to it.
//!
//! Front-ends drive a cycle either in one call ([`run_cycle`]) or step by step
//! ([`ChatSession::begin_search`], [`ChatSession::record_results`],
//! [`ChatSession::record_summary`]) when the backend calls happen elsewhere.

use serde::{Deserialize, Serialize};

use crate::backend::{GroupedTask, HybridQuery, MovieBackend};
use crate::config::SearchConfig;
use crate::error::{MovieError, Result};
use crate::grid::ResultGrid;
use crate::model::{
    Conversation, ConversationTurn, SearchMode, SearchRequest, SearchResultRow, YearRange,
    DEFAULT_YEARS,
};
use crate::prompts::{self, ExamplePrompt};
use crate::sanitize::clean_input;

/// Raw widget state, before sanitizing or validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub occasion: String,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default = "default_year_from")]
    pub year_from: u16,
    #[serde(default = "default_year_to")]
    pub year_to: u16,
}

fn default_year_from() -> u16 {
    DEFAULT_YEARS.0
}
fn default_year_to() -> u16 {
    DEFAULT_YEARS.1
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            query: String::new(),
            occasion: String::new(),
            mode: SearchMode::default(),
            year_from: default_year_from(),
            year_to: default_year_to(),
        }
    }
}

impl SearchForm {
    /// Fill query and occasion from an example, keeping mode and years.
    pub fn apply_example(&mut self, example: &ExamplePrompt) {
        self.query = example.movie_type.to_string();
        self.occasion = example.occasion.to_string();
    }
}

/// A validated search, ready for both backend calls.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSearch {
    pub query: HybridQuery,
    pub task: GroupedTask,
    pub mode: SearchMode,
}

impl PreparedSearch {
    pub fn query_text(&self) -> &str {
        &self.query.text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsOutcome {
    /// Nothing matched; the notice is display-only.
    NoMatches { notice: String },
    Found { grid: ResultGrid },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoMatches {
        notice: String,
    },
    Recommended {
        rows: Vec<SearchResultRow>,
        grid: ResultGrid,
        passage: String,
        /// Index of the summary turn in the conversation.
        summary_turn: usize,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSession {
    conversation: Conversation,
    greeted: bool,
    /// Query and occasion of the last selected example, echoed back into the
    /// inputs on the next render.
    prefill: Option<(String, String)>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn greeted(&self) -> bool {
        self.greeted
    }

    /// Append the greeting the first time only. Returns whether it was added.
    pub fn greet(&mut self) -> bool {
        if self.greeted {
            return false;
        }
        self.conversation
            .push(ConversationTurn::assistant(prompts::GREETING));
        self.greeted = true;
        true
    }

    pub fn select_example(&mut self, index: usize) -> Result<&'static ExamplePrompt> {
        let example = prompts::example(index).ok_or_else(|| {
            MovieError::InvalidInput(format!(
                "no example prompt #{} (there are {})",
                index + 1,
                prompts::EXAMPLES.len()
            ))
        })?;
        self.prefill = Some((example.movie_type.to_string(), example.occasion.to_string()));
        Ok(example)
    }

    pub fn prefill(&self) -> Option<(&str, &str)> {
        self.prefill
            .as_ref()
            .map(|(q, o)| (q.as_str(), o.as_str()))
    }

    /// Hand the pending prefill to the inputs once.
    pub fn take_prefill(&mut self) -> Option<(String, String)> {
        self.prefill.take()
    }

    /// Validate the form and append the user turn. Nothing is appended when
    /// validation fails.
    pub fn begin_search(
        &mut self,
        form: &SearchForm,
        settings: &SearchConfig,
    ) -> Result<PreparedSearch> {
        let years = YearRange::new(form.year_from, form.year_to)?;
        // Submitted text wins over any example still waiting to be shown.
        self.prefill = None;
        let query = clean_input(&form.query);
        let occasion = clean_input(&form.occasion);

        let request = SearchRequest {
            query,
            years,
            mode: form.mode,
        };
        let prepared = PreparedSearch {
            query: HybridQuery::from_request(&request, settings),
            task: GroupedTask {
                instruction: occasion.clone(),
                properties: settings.grouped_fields.clone(),
            },
            mode: form.mode,
        };

        self.conversation.push(ConversationTurn::user(prompts::user_message(
            &request.query,
            &occasion,
        )));
        tracing::debug!(
            mode = %request.mode,
            from = years.min(),
            to = years.max(),
            "search started"
        );
        Ok(prepared)
    }

    /// Append the assistant turn for a finished search.
    pub fn record_results(
        &mut self,
        prepared: &PreparedSearch,
        rows: &[SearchResultRow],
        row_width: usize,
    ) -> ResultsOutcome {
        if rows.is_empty() {
            self.conversation
                .push(ConversationTurn::assistant(prompts::NO_RESULTS_TURN));
            return ResultsOutcome::NoMatches {
                notice: prompts::no_results_notice(prepared.query_text(), prepared.mode.label()),
            };
        }

        let grid = ResultGrid::from_rows(rows, row_width);
        self.conversation.push(ConversationTurn::assistant_with_results(
            prompts::RESULTS_TURN,
            grid.images(),
            grid.titles(),
        ));
        ResultsOutcome::Found { grid }
    }

    /// Append the summary turn and return its index.
    pub fn record_summary(&mut self, passage: &str) -> usize {
        self.conversation
            .push(ConversationTurn::assistant(prompts::summary_turn(passage)))
    }
}

/// One full interaction: user turn, search, results turn, then generation and
/// the summary turn. Search and generation run strictly in sequence and an
/// empty result set skips generation. A backend error stops the cycle with
/// whatever turns were already appended left in place.
pub async fn run_cycle<B: MovieBackend>(
    session: &mut ChatSession,
    backend: &B,
    settings: &SearchConfig,
    form: &SearchForm,
) -> Result<CycleOutcome> {
    let prepared = session.begin_search(form, settings)?;

    let rows = backend.search(&prepared.query).await?;
    let grid = match session.record_results(&prepared, &rows, settings.row_width) {
        ResultsOutcome::NoMatches { notice } => {
            tracing::info!(query = %prepared.query_text(), "no movies matched");
            return Ok(CycleOutcome::NoMatches { notice });
        }
        ResultsOutcome::Found { grid } => grid,
    };

    let passage = backend
        .generate_grouped(&prepared.query, &prepared.task)
        .await?;
    let summary_turn = session.record_summary(&passage);

    Ok(CycleOutcome::Recommended {
        rows,
        grid,
        passage,
        summary_turn,
    })
}
