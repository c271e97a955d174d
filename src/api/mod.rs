pub mod api_structs;

use serde_json::Value;
use thiserror::Error;

pub use api_structs::{RatingSubmission, StatusResponse};

/// Request-level rejections, raised before the engine or the store is
/// touched. The transport layer maps these onto its own status codes via
/// [`RequestError::status_code`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Only POST allowed")]
    MethodNotAllowed,

    #[error("No data provided or invalid JSON")]
    MalformedBody,

    #[error("Invalid data format")]
    InvalidFormat
}

impl RequestError {
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::MethodNotAllowed => 405,
            RequestError::MalformedBody | RequestError::InvalidFormat => 400
        }
    }
}

/// Validates an incoming submission request and extracts the raw batch:
/// POST only, body must parse as a non-empty JSON array. Per-entry
/// validation is the engine's job; a syntactically intact entry never
/// aborts the batch here.
pub fn parse_submission(method: &str, body: &str) -> Result<Vec<Value>, RequestError> {
    if method != "POST" {
        return Err(RequestError::MethodNotAllowed);
    }

    if body.trim().is_empty() {
        return Err(RequestError::MalformedBody);
    }

    let parsed: Value = serde_json::from_str(body).map_err(|_| RequestError::MalformedBody)?;
    match parsed {
        Value::Array(entries) if !entries.is_empty() => Ok(entries),
        _ => Err(RequestError::InvalidFormat)
    }
}
