//! Externally generated diagram suggestions.

use crate::document::DiagramState;
use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Suggestion source unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid suggestion: {0}")]
    Invalid(String),
}

/// How a suggestion is combined with the current diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionMode {
    /// Replace everything.
    #[default]
    Replace,
    /// Append the suggested elements under fresh ids.
    Merge,
}

/// A proposed diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub state: DiagramState,
    #[serde(default)]
    pub mode: SuggestionMode,
}

/// Something that turns a prompt into a diagram, such as a generation service
/// or an importer.
pub trait SuggestionSource {
    fn suggest(&self, prompt: &str) -> BoxFuture<'_, Result<Suggestion, SuggestionError>>;
}
