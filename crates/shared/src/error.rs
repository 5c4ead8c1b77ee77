//! Error kinds surfaced by query validation, submission and polling.
//!
//! These never escape the generation state machine as `Err` values; they are
//! recorded in the state together with their wire code.

use thiserror::Error;

/// Minimum number of characters (after trimming) a query must contain
pub const MIN_QUERY_LENGTH: usize = 3;

/// Maximum number of characters (after trimming) a query may contain
pub const MAX_QUERY_LENGTH: usize = 200;

/// Errors produced while turning a question into a video
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Please enter at least 3 characters")]
    QueryTooShort,

    #[error("Query is too long. AI model has a limit of 200 characters. Please shorten your question.")]
    QueryTooLong,

    /// No catalog entry matched; shown to users as a capacity problem
    #[error("Unable to generate video due to AI model credit limit exceeded. Please try again later or contact support for assistance.")]
    NoMatchingContent,

    /// Rejection reported by a remote backend with its own code
    #[error("{message}")]
    Backend { code: String, message: String },

    /// Transport failure or timeout
    #[error("{0}")]
    Network(String),

    /// The backend reported that generation failed while polling
    #[error("{0}")]
    GenerationFailed(String),
}

impl GenerationError {
    /// Wire code for this error
    pub fn code(&self) -> &str {
        match self {
            GenerationError::QueryTooShort => "QUERY_TOO_SHORT",
            GenerationError::QueryTooLong => "QUERY_TOO_LONG",
            GenerationError::NoMatchingContent => "AI_CREDIT_LIMIT_EXCEEDED",
            GenerationError::Backend { code, .. } => code,
            GenerationError::Network(_) => "NETWORK_ERROR",
            GenerationError::GenerationFailed(_) => "GENERATION_FAILED",
        }
    }

    /// Whether the request itself was refused, as opposed to failing midway
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GenerationError::QueryTooShort
                | GenerationError::QueryTooLong
                | GenerationError::NoMatchingContent
                | GenerationError::Backend { .. }
        )
    }

    /// Rebuild an error from a code and message received over the wire.
    ///
    /// The server's message is kept; the local wording is only used when the
    /// server sent none.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let local = match code {
            "QUERY_TOO_SHORT" => Some(GenerationError::QueryTooShort),
            "QUERY_TOO_LONG" => Some(GenerationError::QueryTooLong),
            "AI_CREDIT_LIMIT_EXCEEDED" => Some(GenerationError::NoMatchingContent),
            _ => None,
        };

        match (local, code) {
            (Some(local), _) if message.trim().is_empty() || message == local.to_string() => local,
            (_, "NETWORK_ERROR") => GenerationError::Network(message),
            (_, "GENERATION_FAILED") => GenerationError::GenerationFailed(message),
            _ => GenerationError::Backend {
                code: code.to_string(),
                message,
            },
        }
    }
}
