//! Video API response envelope.
//!
//! Every endpoint of the HTTP API wraps its payload in an [`ApiResponse`].

use serde::{Deserialize, Serialize};
use shared::GenerationError;

/// Generic response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
}

/// Error body returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    pub code: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Request bookkeeping attached by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub timestamp: String,
    pub request_id: String,
    pub version: String,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, turning an unsuccessful envelope into an error.
    ///
    /// `fallback` is used as the message when the API sent no error body.
    pub fn into_result(self, fallback: &str) -> Result<T, GenerationError> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (_, _, Some(error)) => Err(GenerationError::from_code(&error.code, error.message)),
            _ => Err(GenerationError::GenerationFailed(fallback.to_string())),
        }
    }
}
