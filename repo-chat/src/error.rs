use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Everything a single session command can fail with.
///
/// All variants are recoverable: a failed command leaves the session as it
/// was before the call (apart from the user turn a failed chat keeps), so
/// the same command can be retried straight away.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Rejected locally, nothing was sent.
    #[error("Validation error: {0}")]
    LocalValidation(String),

    /// The liveness probe failed; no other backend call is attempted.
    #[error("Backend is not available")]
    BackendUnavailable,

    /// The backend answered with a non-success status or `success: false`.
    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// Network failure, timeout or an unreadable response body.
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// The command is not valid in the session's current state.
    #[error("Not ready: {0}")]
    NotReady(&'static str),

    /// Another command for the same session is still in flight.
    #[error("A request for this session is already in progress")]
    Busy,

    #[error("Session store error: {0}")]
    SessionStore(#[from] tower_sessions::session::Error),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::LocalValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::RequestFailed { .. } => StatusCode::BAD_GATEWAY,
            ChatError::Transport {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            ChatError::Transport { .. } => StatusCode::BAD_GATEWAY,
            ChatError::NotReady(_) | ChatError::Busy => StatusCode::CONFLICT,
            ChatError::SessionStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::LocalValidation(_) => "validation",
            ChatError::BackendUnavailable => "backend_unavailable",
            ChatError::RequestFailed { .. } => "request_failed",
            ChatError::Transport {
                timed_out: true, ..
            } => "timeout",
            ChatError::Transport { .. } => "transport",
            ChatError::NotReady(_) => "not_ready",
            ChatError::Busy => "busy",
            ChatError::SessionStore(_) => "session_store",
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let status = self.status_code();
        let kind = self.kind();

        let (error, details) = match self {
            ChatError::LocalValidation(msg) => (msg, None),
            ChatError::BackendUnavailable => (
                "Backend not connected. Make sure the backend server is running.".to_string(),
                None,
            ),
            ChatError::RequestFailed { status, message } => {
                (message, Some(format!("backend status {}", status)))
            }
            ChatError::Transport { message, .. } => {
                ("Could not reach the backend".to_string(), Some(message))
            }
            ChatError::NotReady(msg) => (msg.to_string(), None),
            ChatError::Busy => (
                "A request for this session is already in progress".to_string(),
                None,
            ),
            ChatError::SessionStore(err) => {
                tracing::error!(error = %err, "Session store failure");
                ("Internal server error".to_string(), None)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error,
                kind,
                details,
            }),
        )
            .into_response()
    }
}
