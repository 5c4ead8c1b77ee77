//! Query length gate applied before any matching or backend call.

use serde::Serialize;
use shared::error::{MAX_QUERY_LENGTH, MIN_QUERY_LENGTH};
use shared::GenerationError;

/// Outcome of [`validate_query`] in the shape the front-end consumes
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check that the trimmed query holds between 3 and 200 characters
pub fn check_query(query: &str) -> Result<(), GenerationError> {
    let length = query.trim().chars().count();

    if length < MIN_QUERY_LENGTH {
        return Err(GenerationError::QueryTooShort);
    }
    if length > MAX_QUERY_LENGTH {
        return Err(GenerationError::QueryTooLong);
    }
    Ok(())
}

/// [`check_query`] flattened into a `{isValid, error}` record
pub fn validate_query(query: &str) -> QueryValidation {
    match check_query(query) {
        Ok(()) => QueryValidation {
            is_valid: true,
            error: None,
        },
        Err(e) => QueryValidation {
            is_valid: false,
            error: Some(e.to_string()),
        },
    }
}
