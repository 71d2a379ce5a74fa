//! API error types with HTTP response mapping.
//!
//! Error bodies are `{"message": …}` JSON carrying the Spanish business
//! messages the storefront displays verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use stores::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Caller lacks an identity or assignment for the operation.
    Forbidden(String),
    /// Checkout workflow error.
    Checkout(CheckoutError),
    /// Store access error outside the workflow.
    Store(StoreError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::NoProjectAssigned => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::CartNotFound | CheckoutError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::EmptyCart
        | CheckoutError::InvalidTotal
        | CheckoutError::ProjectDetailNotFound(_)
        | CheckoutError::InvalidQuantity(_)
        | CheckoutError::InsufficientStock(_)
        | CheckoutError::InvalidSaleState(_)
        | CheckoutError::Domain(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Store(_)
        | CheckoutError::Directory(_)
        | CheckoutError::Gateway(_)
        | CheckoutError::Serialization(_) => {
            tracing::error!(error = %err, "checkout infrastructure error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::CartNotFound | StoreError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        StoreError::ProjectDetailNotFound { .. }
        | StoreError::InsufficientStock { .. }
        | StoreError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            tracing::error!(error = %err, "store error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
