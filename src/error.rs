//! Error layering: `ServiceError` for business operations, `AppError` for the
//! inbound HTTP surface. Chat transport failures and ledger invariant
//! violations convert upward via `From`.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::chat::ChatError;
use crate::round::AlreadySettled;
use crate::scoreboard::ScoreError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The chat platform call failed.
    #[error(transparent)]
    Chat(#[from] ChatError),
    /// Actor lacks the rights for the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the user.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current round state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A scoreboard mutation violated the ledger invariants.
    #[error(transparent)]
    Score(#[from] ScoreError),
}

impl From<AlreadySettled> for ServiceError {
    fn from(err: AlreadySettled) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl ServiceError {
    /// Short notice shown to the user where a response surface exists.
    /// Transport details stay in the logs.
    pub fn user_notice(&self) -> String {
        match self {
            ServiceError::Chat(_) => "Something went wrong talking to the chat platform.".into(),
            ServiceError::Unauthorized(message)
            | ServiceError::InvalidInput(message)
            | ServiceError::InvalidState(message)
            | ServiceError::NotFound(message) => message.clone(),
            ServiceError::Score(err) => err.to_string(),
        }
    }
}

/// Application-level errors that are converted to HTTP responses on the
/// webhook surface.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed inbound payload.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Anything the handler could not recover from.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
