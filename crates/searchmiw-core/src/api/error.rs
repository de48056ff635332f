//! Single error shape for every failed API call.

use std::fmt;

use serde_json::Value;

/// Default message for 401/403 responses without a body message.
pub const DEFAULT_AUTH_REJECTED_MESSAGE: &str = "Authentication required";

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    /// The request never reached the server or no response came back
    Network,
    /// HTTP 401/403: credentials invalid or expired
    AuthRejected,
    /// Any other failure status, GraphQL error payload or malformed body
    ServerError,
    /// Bad input detected locally or reported by the server (e.g. conflict)
    ValidationError,
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestErrorKind::Network => write!(f, "network"),
            RequestErrorKind::AuthRejected => write!(f, "auth_rejected"),
            RequestErrorKind::ServerError => write!(f, "server_error"),
            RequestErrorKind::ValidationError => write!(f, "validation_error"),
        }
    }
}

/// Classified failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    pub kind: RequestErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status, when a response was received
    pub http_status: Option<u16>,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::Network, message)
    }

    pub fn auth_rejected(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::AuthRejected, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::ServerError, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::ValidationError, message)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Classifies a non-2xx response.
    ///
    /// 401/403 are always `AuthRejected`, whatever the body says. Everything
    /// else is a `ServerError`. The body's error message is kept when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body_message = extract_error_message(body);
        let error = if matches!(status, 401 | 403) {
            Self::auth_rejected(
                body_message.unwrap_or_else(|| DEFAULT_AUTH_REJECTED_MESSAGE.to_string()),
            )
        } else {
            Self::server(body_message.unwrap_or_else(|| format!("Request failed with HTTP {status}")))
        };
        error.with_status(status)
    }

    /// Returns true for 401/403 failures; the caller should clear the session.
    pub fn is_auth_rejected(&self) -> bool {
        self.kind == RequestErrorKind::AuthRejected
    }
}

/// Result type for API operations.
pub type RequestResult<T> = std::result::Result<T, RequestError>;

/// Classifies a transport-level reqwest failure.
pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::network(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        RequestError::network(format!("Connection failed: {e}"))
    } else if e.is_decode() {
        RequestError::server(format!("Invalid response body: {e}"))
    } else {
        RequestError::network(format!("Network error: {e}"))
    }
}

/// Pulls the first error message out of a JSON error body.
///
/// Looks at `message`, then `error` (string or `{message}`), then
/// `errors[0].message`.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    non_empty(json.get("message"))
        .or_else(|| non_empty(json.get("error")))
        .or_else(|| non_empty(json.get("error").and_then(|e| e.get("message"))))
        .or_else(|| {
            non_empty(
                json.get("errors")
                    .and_then(|e| e.get(0))
                    .and_then(|e| e.get("message")),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_401_is_auth_rejected_regardless_of_body() {
        for body in ["", "not json", r#"{"message":"Token expired"}"#, r#"{"ok":true}"#] {
            let err = RequestError::from_status(401, body);
            assert_eq!(err.kind, RequestErrorKind::AuthRejected, "body: {body}");
            assert_eq!(err.http_status, Some(401));
        }
    }

    #[test]
    fn test_403_keeps_body_message() {
        let err = RequestError::from_status(403, r#"{"message":"Forbidden for you"}"#);
        assert_eq!(err.kind, RequestErrorKind::AuthRejected);
        assert_eq!(err.message, "Forbidden for you");
    }

    #[test]
    fn test_403_without_message_uses_default() {
        let err = RequestError::from_status(403, "");
        assert_eq!(err.message, DEFAULT_AUTH_REJECTED_MESSAGE);
    }

    #[test]
    fn test_other_statuses_are_server_errors() {
        let err = RequestError::from_status(500, r#"{"error":"Internal Server Error"}"#);
        assert_eq!(err.kind, RequestErrorKind::ServerError);
        assert_eq!(err.message, "Internal Server Error");

        let err = RequestError::from_status(404, "");
        assert_eq!(err.kind, RequestErrorKind::ServerError);
        assert_eq!(err.message, "Request failed with HTTP 404");
        assert_eq!(err.http_status, Some(404));
    }

    #[test]
    fn test_extract_error_message_variants() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            extract_error_message(r#"{"errors":[{"message":"first"},{"message":"second"}]}"#)
                .as_deref(),
            Some("first")
        );
        assert_eq!(extract_error_message(r#"{"message":"  "}"#), None);
        assert_eq!(extract_error_message("<html>"), None);
    }

    #[test]
    fn test_display_shows_message() {
        let err = RequestError::validation("Please enter both email and password.");
        assert_eq!(err.to_string(), "Please enter both email and password.");
        assert_eq!(err.kind.to_string(), "validation_error");
    }
}
