//! # error
//!
//! Centralised error types.
//!
//! Each pipeline stage has its own `thiserror` enum so callers can tell a bad
//! download from a bad archive from a bad number.  Every handler returns
//! `Result<_, AppError>`; Axum's `IntoResponse` impl turns that into a JSON
//! error body so the front end always gets a machine-readable response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ─── Pipeline Errors ──────────────────────────────────────────────────────────

/// Both the dated archive and the fallback archive could not be downloaded.
#[derive(Debug, Error)]
#[error("bhav copy download failed: primary {primary} ({primary_reason}); fallback {fallback} ({fallback_reason})")]
pub struct FetchError {
    pub primary: String,
    pub primary_reason: String,
    pub fallback: String,
    pub fallback_reason: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The downloaded bytes are not a readable ZIP archive.
    #[error("malformed archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The archive does not contain `{resource}.CSV`.
    #[error("archive member {0} not found")]
    MissingMember(String),

    #[error("failed to read archive member: {0}")]
    Io(#[from] std::io::Error),

    /// A CSV record could not be tokenised.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A data row is narrower than the fixed column contract.
    #[error("row at line {line} has {fields} fields, expected at least {expected}")]
    ShortRow {
        line: u64,
        fields: usize,
        expected: usize,
    },
}

/// A field that must be numeric is not.
#[derive(Debug, Error, PartialEq)]
#[error("{field}: cannot parse {value:?} as a number")]
pub struct ParseError {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored hash is missing a field or holds an unreadable value.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

// ─── AppError ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Fetch(_) | AppError::Decode(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        tracing::error!(%status, error = %self, "request failed");

        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
