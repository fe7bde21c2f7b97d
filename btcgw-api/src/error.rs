//! Caller-facing API errors.
//!
//! Every error body is `{ "error": "btcgw::<code>", "error_description":
//! "<human>" }`. Internal causes are logged, never echoed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors the HTTP surface reports to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// A path ID is not a 64-char lowercase hex string.
    #[error("btcgw::invalid_id")]
    InvalidId,

    /// The request body is not the expected JSON.
    #[error("btcgw::invalid_request_body")]
    InvalidRequestBody,

    /// A body parameter is malformed.
    #[error("btcgw::invalid_param")]
    InvalidParam,

    /// No record for the given ids.
    #[error("btcgw::tx_not_found")]
    TxNotFound,

    /// A record for the given ids already exists.
    #[error("btcgw::tx_already_exists")]
    TxAlreadyExists,

    /// Registration failed somewhere behind the gateway.
    #[error("btcgw::register_failed")]
    RegisterFailed,

    /// An API key could not be created.
    #[error("btcgw::apikey_creation_failed")]
    ApiKeyCreationFailed,

    /// An API key could not be deleted.
    #[error("btcgw::apikey_deletion_failed")]
    ApiKeyDeletionFailed,
}

impl ServiceError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidId
            | ServiceError::InvalidRequestBody
            | ServiceError::InvalidParam => StatusCode::BAD_REQUEST,
            ServiceError::TxNotFound => StatusCode::NOT_FOUND,
            ServiceError::TxAlreadyExists => StatusCode::CONFLICT,
            ServiceError::RegisterFailed
            | ServiceError::ApiKeyCreationFailed
            | ServiceError::ApiKeyDeletionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable description for the response body.
    pub fn description(&self) -> &'static str {
        match self {
            ServiceError::InvalidId => "ID should be a 32 bytes binary in hexadecimal string.",
            ServiceError::InvalidRequestBody => "Request body should be a JSON.",
            ServiceError::InvalidParam => "Parameter is invalid.",
            ServiceError::TxNotFound => "Transaction not found.",
            ServiceError::TxAlreadyExists => "Transaction already exists.",
            ServiceError::RegisterFailed => "Could not register. There may be a system error.",
            ServiceError::ApiKeyCreationFailed => {
                "Could not create API Key. There may be a system error."
            }
            ServiceError::ApiKeyDeletionFailed => {
                "Could not delete API Key. There may be a system error."
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    error_description: &'static str,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            error_description: self.description(),
        };
        (self.status(), Json(body)).into_response()
    }
}
