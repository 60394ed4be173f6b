//! Weaviate GraphQL `Get` queries and response decoding.
//!
//! Both operations share one argument block (hybrid query, year filter,
//! limit); they differ only in the field selection.

use std::collections::HashMap;

use serde::Deserialize;

use super::{GroupedTask, HybridQuery, RELEASE_YEAR_PROPERTY};
use crate::error::{MovieError, Result};
use crate::model::SearchResultRow;

/// Build the search query: `{ Get { Collection(...) { title tagline poster } } }`.
pub fn search_query(query: &HybridQuery) -> Result<String> {
    check_name(&query.collection)?;
    for field in &query.return_fields {
        check_name(field)?;
    }
    Ok(format!(
        "{{ Get {{ {}({}) {{ {} }} }} }}",
        query.collection,
        arguments(query),
        query.return_fields.join(" ")
    ))
}

/// Build the grouped generation query over the same candidate set.
pub fn generate_query(query: &HybridQuery, task: &GroupedTask) -> Result<String> {
    check_name(&query.collection)?;
    let properties = task
        .properties
        .iter()
        .map(|p| check_name(p).map(|_| string_literal(p)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "{{ Get {{ {}({}) {{ _additional {{ generate(groupedResult: {{task: {}, properties: [{}]}}) {{ groupedResult error }} }} }} }} }}",
        query.collection,
        arguments(query),
        string_literal(&task.instruction),
        properties.join(", ")
    ))
}

fn arguments(query: &HybridQuery) -> String {
    format!(
        "hybrid: {{query: {}, alpha: {:?}}}, where: {{operator: And, operands: [\
         {{path: [\"{prop}\"], operator: GreaterThanEqual, valueInt: {}}}, \
         {{path: [\"{prop}\"], operator: LessThanEqual, valueInt: {}}}]}}, limit: {}",
        string_literal(&query.text),
        query.alpha,
        query.filter.min,
        query.filter.max,
        query.limit,
        prop = RELEASE_YEAR_PROPERTY,
    )
}

/// JSON string escaping is a valid GraphQL string literal.
fn string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Collection and property names are interpolated bare, so they must be
/// GraphQL names: `[_A-Za-z][_0-9A-Za-z]*`.
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MovieError::Config(format!(
            "'{name}' is not a valid collection or property name"
        )))
    }
}

// -- Response wrappers --

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct GraphQlResponse<T> {
    data: Option<GetData<T>>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct GetData<T> {
    #[serde(rename = "Get", default)]
    get: HashMap<String, Option<Vec<T>>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T> GraphQlResponse<T> {
    /// Objects under `data.Get.<collection>`. A null or absent list is an
    /// empty result; any reported error fails the whole call.
    fn into_objects(self, collection: &str) -> Result<Vec<T>> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(MovieError::Backend(messages.join("; ")));
        }
        Ok(self
            .data
            .and_then(|mut d| d.get.remove(collection))
            .flatten()
            .unwrap_or_default())
    }
}

#[derive(Deserialize)]
struct MovieObject {
    title: Option<String>,
    tagline: Option<String>,
    poster: Option<String>,
}

#[derive(Deserialize)]
struct GeneratedObject {
    #[serde(rename = "_additional")]
    additional: Option<Additional>,
}

#[derive(Deserialize)]
struct Additional {
    generate: Option<GenerateResult>,
}

#[derive(Deserialize)]
struct GenerateResult {
    #[serde(rename = "groupedResult")]
    grouped_result: Option<String>,
    error: Option<String>,
}

pub fn parse_rows(collection: &str, body: &str) -> Result<Vec<SearchResultRow>> {
    let response: GraphQlResponse<MovieObject> = serde_json::from_str(body)?;
    Ok(response
        .into_objects(collection)?
        .into_iter()
        .map(|o| SearchResultRow {
            title: o.title.unwrap_or_default(),
            tagline: o.tagline.unwrap_or_default(),
            poster: o.poster.filter(|p| !p.trim().is_empty()),
        })
        .collect())
}

/// The grouped passage rides on the first object's `_additional.generate`.
pub fn parse_generated(collection: &str, body: &str) -> Result<String> {
    let response: GraphQlResponse<GeneratedObject> = serde_json::from_str(body)?;
    let objects = response.into_objects(collection)?;
    if objects.is_empty() {
        return Err(MovieError::Generation(
            "no objects matched, nothing to generate from".into(),
        ));
    }

    for generate in objects
        .into_iter()
        .filter_map(|o| o.additional.and_then(|a| a.generate))
    {
        if let Some(err) = generate.error.filter(|e| !e.is_empty()) {
            return Err(MovieError::Generation(err));
        }
        if let Some(text) = generate.grouped_result {
            return Ok(text);
        }
    }

    Err(MovieError::Generation(
        "response missing groupedResult".into(),
    ))
}
