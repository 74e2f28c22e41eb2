//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup errors: schema document and settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid identifier: {kind} '{name}'")]
    InvalidIdentifier { kind: &'static str, name: String },
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("invalid primary key: table {table} column {column}")]
    InvalidPrimaryKey { table: String, column: String },
    #[error("unknown column type '{type_name}' for {table}.{column}")]
    UnknownColumnType {
        table: String,
        column: String,
        type_name: String,
    },
    #[error("reserved table name: {0}")]
    ReservedName(String),
    #[error("schema load: {0}")]
    Load(String),
    #[error("setting {name}: {message}")]
    Setting { name: &'static str, message: String },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("record not found")]
    NotFound,
    #[error("bad params: {0}")]
    BadParams(String),
    #[error("validation: {0}")]
    Validation(String),
    /// Raised by a request validator; the message is returned to the client as is.
    #[error("{0}")]
    Rejected(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    /// Server-side failure unrelated to the request; details stay in the logs.
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Message exposed in the error body. Database details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Db(sqlx::Error::RowNotFound) => AppError::NotFound.to_string(),
            AppError::Db(_) => "database error".to_string(),
            AppError::Config(_) => "configuration error".to_string(),
            AppError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Db(sqlx::Error::RowNotFound) | AppError::NotFound => {
                tracing::debug!("record not found")
            }
            AppError::Db(e) => tracing::error!(error = %e, "database failure"),
            AppError::Config(e) => tracing::error!(error = %e, "configuration failure"),
            AppError::Internal(m) => tracing::error!(error = %m, "internal failure"),
            AppError::Rejected(m) => tracing::debug!(message = %m, "request rejected"),
            _ => tracing::debug!(error = %self, "bad request"),
        }
        let status = StatusCode::BAD_REQUEST;
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
