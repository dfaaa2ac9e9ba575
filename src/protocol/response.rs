//! Response envelope returned by every API endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome marker of an API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiStatus {
    Ok,
    Fail,
}

/// JSON envelope `{status, message, payload}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T = Value> {
    pub status: ApiStatus,
    pub message: String,
    pub payload: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, payload: T) -> Self {
        Self {
            status: ApiStatus::Ok,
            message: message.into(),
            payload: Some(payload),
        }
    }
}

impl ApiResponse {
    /// Success without payload
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Ok,
            message: message.into(),
            payload: None,
        }
    }

    /// Failure carrying the error text as message
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Fail,
            message: message.into(),
            payload: None,
        }
    }
}
