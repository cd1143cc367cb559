use thiserror::Error;

use crate::core::entry::EntryError;

/// Errors that abort extraction of one source unit, or reject a configuration.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The unit could not be parsed by its dialect's grammar.
    #[error("{file}:{line}: failed to parse: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    /// A message was rejected by the entry model (whitespace, conflicting plural).
    #[error("{file}:{line}: {source}")]
    Entry {
        file: String,
        line: usize,
        #[source]
        source: EntryError,
    },

    #[error("invalid keyword {spec:?}: {reason}")]
    InvalidKeyword { spec: String, reason: String },

    #[error("invalid attribute pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to load grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

impl ExtractError {
    /// Best-known line of the failure, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ExtractError::Parse { line, .. } | ExtractError::Entry { line, .. } => Some(*line),
            _ => None,
        }
    }
}
