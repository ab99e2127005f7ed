//! HTTP error responses.
//!
//! Every failure renders as `{"success": false, "error": "<message>"}`.
//! Unexpected failures are logged in full and reported with a generic
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finguard_agents::QueryError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred while processing the query";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Credential checkout failed; the message is shown to the client.
    #[error("{0}")]
    Provisioning(String),

    #[error("{}", UNEXPECTED_MESSAGE)]
    Internal,
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidRequest(message) => ApiError::BadRequest(message),
            QueryError::CredentialProvisioning(_) => ApiError::Provisioning(e.to_string()),
            QueryError::Unexpected(inner) => {
                error!(error = %inner, "Query failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Provisioning(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
