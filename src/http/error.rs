//! API error responses.
//!
//! Every error leaves the service as `{"error": "<message>"}`. Internal
//! details are logged here and never returned to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::{StoreError, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Candidate rejected; the reason goes back verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Request body must be valid JSON")]
    MalformedBody,

    /// Stored mode is not one this service can project.
    #[error("Mode not valid")]
    InvalidMode,

    #[error("Endpoint not found")]
    NotFound,

    #[error("Request timed out")]
    Timeout,

    /// Store failure (usually a failed write).
    #[error("store error: {0}")]
    Store(StoreError),

    #[error("Internal server error")]
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidMode(_) => ApiError::InvalidMode,
            other => ApiError::Store(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::InvalidMode | ApiError::Store(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Error during configuration update");
            }
            ApiError::InvalidMode => {
                tracing::error!("Active mode is not valid");
            }
            _ => {}
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
