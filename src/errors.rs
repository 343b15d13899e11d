//! Typed error hierarchy for the CV tailoring client.
//!
//! Every fallible operation in the crate resolves to [`ApiError`]. The union
//! is deliberately small so command handlers and the status renderer can
//! match on it exhaustively:
//! - `Network`: the request never produced an HTTP response
//! - `Http`: the backend answered with a non-success status
//! - `Auth`: credentials rejected or the session became invalid
//! - `Validation`: client-side rejection, nothing was sent
//! - `Aborted`: superseded or cancelled before completion

use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure of a client operation, from validation through transport to the
/// backend's own error responses.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Aborted,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Maps a transport-level failure, keeping the timeout/connect
    /// distinction visible in the message.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            ApiError::Network(format!("cannot reach server: {err}"))
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// True when the operation was discarded rather than failed, so callers
    /// can skip error reporting for stale work.
    pub fn is_aborted(&self) -> bool {
        matches!(self, ApiError::Aborted)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status_and_message() {
        let err = ApiError::Http {
            status: 404,
            message: "File not found.".to_string(),
        };
        match &err {
            ApiError::Http { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "File not found.");
            }
            _ => panic!("Expected Http variant"),
        }
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("File not found."));
    }

    #[test]
    fn validation_helper_builds_validation_variant() {
        let err = ApiError::validation("unsupported file type");
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn aborted_is_distinguishable_from_failures() {
        assert!(ApiError::Aborted.is_aborted());
        assert!(!ApiError::Network("connection refused".into()).is_aborted());
        assert!(!ApiError::Auth("token expired".into()).is_aborted());
    }

    #[test]
    fn auth_predicate_matches_only_auth() {
        assert!(ApiError::Auth("invalid credentials".into()).is_auth());
        assert!(
            !ApiError::Http {
                status: 500,
                message: "boom".into()
            }
            .is_auth()
        );
    }

    #[test]
    fn errors_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ApiError::Aborted);
        assert_std_error(&ApiError::Network("down".into()));
    }
}
