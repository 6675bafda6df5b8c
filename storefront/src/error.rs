//! Failure taxonomy for the storefront core
//!
//! Transport and HTTP failures are [`ApiError`]s. Once they reach state they
//! are flattened into an [`ErrorInfo`], which also covers local validation
//! failures and business rejections (an OTP the backend refused).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Shown when nothing better can be extracted from a failure
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// Errors from the remote API client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with {status}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Human readable reason for this failure.
    ///
    /// Priority: field-level `errors[]` messages, then the top-level
    /// `message`, then the raw body, then [`GENERIC_ERROR`].
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { body, .. } => message_from_body(body),
            ApiError::Transport(err) if err.is_timeout() => {
                "The server took too long to respond.".to_string()
            }
            ApiError::Transport(_) | ApiError::Decode(_) => GENERIC_ERROR.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

/// Extract a message from an error response body.
///
/// `errors` entries may be plain strings or objects carrying `message` or
/// `msg`; anything else in them is skipped.
pub fn message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(trimmed) {
        let listed: Vec<&str> = fields
            .get("errors")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(entry_message)
            .collect();
        if !listed.is_empty() {
            return listed.join("\n");
        }
        if let Some(message) = fields.get("message").and_then(non_blank) {
            return message.to_string();
        }
    }
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    GENERIC_ERROR.to_string()
}

fn entry_message(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(_) => non_blank(entry),
        Value::Object(fields) => fields
            .get("message")
            .and_then(non_blank)
            .or_else(|| fields.get("msg").and_then(non_blank)),
        _ => None,
    }
}

fn non_blank(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Which class of failure put an error into state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was sent and rejected, or never arrived
    Network,
    /// Input was refused locally; no request was made
    Validation,
    /// The backend answered but refused the operation
    Rejected,
}

/// Structured reason stored in a slice's `error` field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Rejected,
            message: message.into(),
        }
    }
}

impl From<&ApiError> for ErrorInfo {
    fn from(err: &ApiError) -> Self {
        ErrorInfo::network(err.user_message())
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(body: &str) -> ApiError {
        ApiError::Status {
            status: 400,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_field_errors_win() {
        let err = status(
            r#"{"errors":[{"message":"Email is invalid"},{"msg":"Password too short"}],"message":"Bad"}"#,
        );
        assert_eq!(err.user_message(), "Email is invalid\nPassword too short");
    }

    #[test]
    fn test_top_level_message() {
        let err = status(r#"{"errors":[],"message":"Invalid credentials"}"#);
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_raw_body_then_fallback() {
        assert_eq!(status("Service down").user_message(), "Service down");
        assert_eq!(status(r#"{"message":""}"#).user_message(), r#"{"message":""}"#);
        assert_eq!(status("   ").user_message(), GENERIC_ERROR);
    }

    #[test]
    fn test_loose_errors_fall_back_to_message() {
        let err = status(r#"{"errors":null,"message":"Invalid credentials"}"#);
        assert_eq!(err.user_message(), "Invalid credentials");

        let err = status(r#"{"errors":[{"field":"email"}],"message":"Bad request"}"#);
        assert_eq!(err.user_message(), "Bad request");

        let err = status(r#"{"errors":"nope","message":"Bad request"}"#);
        assert_eq!(err.user_message(), "Bad request");
    }

    #[test]
    fn test_string_and_mixed_error_entries() {
        let err = status(r#"{"errors":["Email is required"],"message":"Bad"}"#);
        assert_eq!(err.user_message(), "Email is required");

        let err = status(
            r#"{"errors":["Email is required",{"field":"x"},{"msg":" Too short "},7],"message":"Bad"}"#,
        );
        assert_eq!(err.user_message(), "Email is required\nToo short");
    }

    #[test]
    fn test_non_object_json_is_raw() {
        assert_eq!(status(r#"["a"]"#).user_message(), r#"["a"]"#);
        assert_eq!(status(r#"{"message":42}"#).user_message(), r#"{"message":42}"#);
    }

    #[test]
    fn test_decode_error_is_generic() {
        let err: ApiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.user_message(), GENERIC_ERROR);
        assert_eq!(err.status(), None);
        assert_eq!(ErrorInfo::from(&err).kind, ErrorKind::Network);
    }
}
