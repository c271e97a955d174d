use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single rating submission: `index` is the 1..10 rating, `image` the
/// item identifier. Both fields stay loosely typed so that one bad entry
/// is skipped by the engine instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>
}

impl RatingSubmission {
    /// Reads an entry from a raw batch element. Entries that are not
    /// objects come back empty and fall out during validation.
    pub fn from_value(entry: &Value) -> RatingSubmission {
        serde_json::from_value(entry.clone()).unwrap_or_default()
    }

    pub fn new(item_id: &str, rating: i32) -> RatingSubmission {
        RatingSubmission {
            index: Some(Value::from(rating)),
            image: Some(Value::from(item_id))
        }
    }
}

/// Transport-neutral status reply, `{"message": ...}` on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String
}

impl StatusResponse {
    pub fn new(message: impl Into<String>) -> StatusResponse {
        StatusResponse { message: message.into() }
    }
}
