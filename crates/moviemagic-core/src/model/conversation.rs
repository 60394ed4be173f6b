use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat turn. `images` holds poster data URIs and `titles` the
/// titles of results that had no poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<Vec<String>>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: None,
            titles: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            images: None,
            titles: None,
        }
    }

    pub fn assistant_with_results(
        content: impl Into<String>,
        images: Vec<String>,
        titles: Vec<String>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            images: Some(images),
            titles: Some(titles),
        }
    }

    pub fn images(&self) -> &[String] {
        self.images.as_deref().unwrap_or_default()
    }

    pub fn titles(&self) -> &[String] {
        self.titles.as_deref().unwrap_or_default()
    }
}

/// Append-only chat log for one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn and return its index.
    pub fn push(&mut self, turn: ConversationTurn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn get(&self, index: usize) -> Option<&ConversationTurn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Split `items` into display rows of at most `width` entries.
pub fn display_rows<T>(items: &[T], width: usize) -> Vec<&[T]> {
    items.chunks(width.max(1)).collect()
}
