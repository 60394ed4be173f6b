//! Movie Magic Hub core: configuration, the Weaviate backend, and the chat
//! session that turns a search form into conversation turns.

pub mod backend;
pub mod config;
pub mod error;
pub mod grid;
pub mod model;
pub mod prompts;
pub mod sanitize;
pub mod session;
pub mod typewriter;

pub use error::{MovieError, Result};
