use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A member with ID {0} already exists")]
    DuplicateId(String),

    #[error("Member {member_id} already has a payment for {month}/{year}")]
    DuplicatePayment {
        member_id: String,
        month: u32,
        year: i32,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Could not process image: {0}")]
    ImageProcessing(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Storage failures may succeed on a second attempt; everything else is
    /// a problem with the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateId(_) => StatusCode::CONFLICT,
            AppError::DuplicatePayment { .. } => StatusCode::CONFLICT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ImageProcessing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to a user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                "The database is unavailable right now. Please try again.".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.user_message(),
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

/// True when a sqlx error is a UNIQUE or PRIMARY KEY violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// Maps SQLite's "integer overflow" from an aggregate to a Validation error,
/// since retrying the same SUM will not help.
pub fn sum_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.message().contains("integer overflow") => {
            AppError::Validation("Total is too large".to_string())
        }
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_database_errors_are_retryable() {
        assert!(AppError::Database("locked".into()).is_retryable());
        assert!(!AppError::Validation("bad".into()).is_retryable());
        assert!(!AppError::DuplicateId("1234567".into()).is_retryable());
    }

    #[test]
    fn duplicate_errors_map_to_conflict() {
        let err = AppError::DuplicatePayment {
            member_id: "1234567".into(),
            month: 3,
            year: 2025,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Member 1234567 already has a payment for 3/2025");
    }
}
