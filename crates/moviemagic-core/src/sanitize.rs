//! Free-text cleanup applied before any text reaches a query.

/// Remove single and double quotes so user text cannot break out of a
/// GraphQL string literal. Nothing else is escaped or validated.
pub fn clean_input(text: &str) -> String {
    text.chars().filter(|c| *c != '"' && *c != '\'').collect()
}
