//! Upstream error taxonomy

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, timeout or body read failure
    #[error("Student API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without a usable envelope
    #[error("Student API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// `{success: false, message}` business-rule rejection
    #[error("{0}")]
    Rejected(String),

    /// Payload did not match the expected shape
    #[error("Unexpected response from student API: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Worth one more attempt on an idempotent request
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Transport(e) => e.is_timeout() || e.is_connect(),
            BackendError::Status { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Status the portal answers with when this error ends a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            BackendError::Status { status: 401, .. } => StatusCode::UNAUTHORIZED,
            BackendError::Status { status: 403, .. } => StatusCode::FORBIDDEN,
            BackendError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
            BackendError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to the student
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected(message) => message.clone(),
            BackendError::Status { status: 401, .. } => "Not authenticated".to_string(),
            BackendError::Status { status: 403, .. } => "Not allowed".to_string(),
            BackendError::Status { status: 404, .. } => "Not found".to_string(),
            _ => "The student service is unavailable. Please refresh and try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_statuses_are_transient() {
        for status in [502, 503, 504] {
            let err = BackendError::Status {
                status,
                message: String::new(),
            };
            assert!(err.is_transient());
            assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        }
        let err = BackendError::Status {
            status: 500,
            message: String::new(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_rejection_keeps_backend_message() {
        let err = BackendError::Rejected("Batch is full".to_string());
        assert!(!err.is_transient());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_message(), "Batch is full");
    }

    #[test]
    fn test_auth_statuses_pass_through() {
        let err = BackendError::Status {
            status: 401,
            message: "expired".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), "Not authenticated");
    }
}
