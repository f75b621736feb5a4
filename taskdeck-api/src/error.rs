//! Uniform error body returned by the remote task API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Machine-readable error detail inside an [`ApiErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine code (e.g. `VALIDATION_ERROR`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional field-level messages, keyed by field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// Error body shape: `{ error: { code, message, details? }, timestamp?,
/// path? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// The error detail block.
    pub error: ErrorDetail,
    /// Server-side timestamp of the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Request path that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorBody {
    /// Returns the server-supplied human message, if it is non-empty.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        if self.error.message.is_empty() {
            None
        } else {
            Some(&self.error.message)
        }
    }
}
