// src/routes/mod.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::store::StoreError;

pub mod customers;
pub mod employees;
pub mod health;
pub mod marketing;
pub mod products;

/// Error body every route answers with: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

// Error mappers for `.map_err(..)?`. Store messages pass through unchanged.

/// 400 for a refused query, 500 when the backend itself answered 5xx.
pub fn client_error(e: StoreError) -> ApiError {
    if e.is_backend_fault() {
        return internal_error(e);
    }
    tracing::warn!(error = %e, "store request failed");
    ApiError::bad_request(e.to_string())
}

pub fn internal_error<E: std::fmt::Display>(e: E) -> ApiError {
    tracing::error!(error = %e, "store request failed");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// `?q=` search box shared by the directory routes.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQ {
    pub q: Option<String>,
}

/// Trimmed, non-empty value of an optional query parameter.
pub fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
