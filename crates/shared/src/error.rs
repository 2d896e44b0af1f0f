use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The signer refused the request (user denied the transaction).
    Rejected,
    /// The contract reverted the call.
    Reverted,
    NotFound,
    Validation,
    Unavailable,
    Internal,
}

impl ErrorCode {
    /// Fallback classification for gateway replies without an error body.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorCode::Validation,
            401 | 403 => ErrorCode::Rejected,
            404 => ErrorCode::NotFound,
            502..=504 => ErrorCode::Unavailable,
            _ => ErrorCode::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Rejected => "rejected",
            ErrorCode::Reverted => "reverted",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Validation => "validation",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body returned by the gateway for a failed contract call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_fallback_classification() {
        assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Unavailable);
        assert_eq!(ErrorCode::from_status(500), ErrorCode::Internal);
    }

    #[test]
    fn display_matches_wire_code() {
        let err = ApiError::new(ErrorCode::NotFound, "no such post");
        assert_eq!(err.to_string(), "not_found: no such post");
        let wire = serde_json::to_value(&err).expect("serialize");
        assert_eq!(wire["code"], ErrorCode::NotFound.as_str());
    }
}
