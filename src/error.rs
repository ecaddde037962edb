use crate::db::models::api::{ApiResponse, ErrorDetail, error_codes};
use axum::{Json, http::StatusCode, response::IntoResponse};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<ErrorDetail>,
    },

    #[error("Bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        field: Option<String>,
        code: Option<String>,
    },

    #[error("Cannot delete {resource}: dependent records exist")]
    DependentRecords { resource: String },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, response) = match self {
            AppError::Database(DieselError::NotFound) => (
                StatusCode::NOT_FOUND,
                ApiResponse::<()>::not_found("Record not found"),
            ),
            AppError::Database(DieselError::DatabaseError(kind, ref info)) => {
                match kind {
                    DatabaseErrorKind::ForeignKeyViolation => {
                        tracing::warn!(constraint = ?info.constraint_name(), "Foreign key violation");
                        (
                            StatusCode::BAD_REQUEST,
                            ApiResponse::<()>::error(
                                400,
                                "Referenced record is missing or dependent records exist",
                                error_codes::DEPENDENT_RECORDS,
                            )
                            .with_detail(info.message().to_string()),
                        )
                    }
                    DatabaseErrorKind::UniqueViolation => {
                        tracing::warn!(constraint = ?info.constraint_name(), "Unique violation");
                        (
                            StatusCode::CONFLICT,
                            ApiResponse::<()>::conflict(
                                "Record already exists",
                                info.column_name().map(str::to_string),
                                error_codes::NAME_EXISTS,
                            ),
                        )
                    }
                    DatabaseErrorKind::CheckViolation => (
                        StatusCode::BAD_REQUEST,
                        ApiResponse::<()>::bad_request("Value violates a check constraint")
                            .with_detail(info.message().to_string()),
                    ),
                    _ => {
                        tracing::error!("Database error: {}", info.message());
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            ApiResponse::<()>::internal_error("Database error"),
                        )
                    }
                }
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Database error"),
                )
            }
            AppError::Pool(ref e) => {
                tracing::error!("Connection pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Connection error"),
                )
            }
            AppError::Validation {
                ref message,
                errors,
            } => (
                StatusCode::BAD_REQUEST,
                if errors.is_empty() {
                    ApiResponse::<()>::validation_error(
                        message,
                        vec![ErrorDetail {
                            field: None,
                            code: error_codes::VALIDATION_FAILED.to_string(),
                            message: message.clone(),
                        }],
                    )
                } else {
                    ApiResponse::<()>::validation_error(message, errors)
                },
            ),
            AppError::BadRequest {
                ref message,
                ref code,
            } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::error(400, message, code),
            ),
            AppError::NotFound { ref resource } => (
                StatusCode::NOT_FOUND,
                ApiResponse::<()>::not_found(&format!("{} not found", resource)),
            ),
            AppError::Conflict {
                ref message,
                ref field,
                ref code,
            } => (
                StatusCode::CONFLICT,
                ApiResponse::<()>::conflict(message, field.clone(), code.as_deref().unwrap_or("")),
            ),
            AppError::DependentRecords { ref resource } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::error(
                    400,
                    &format!("Cannot delete {}: dependent records exist", resource),
                    error_codes::DEPENDENT_RECORDS,
                ),
            ),
            AppError::ServiceUnavailable(ref message) => {
                tracing::warn!("Service unavailable: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiResponse::<()>::service_unavailable(message),
                )
            }
            AppError::Upstream(ref message) => {
                tracing::error!("Upstream error: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiResponse::<()>::bad_gateway("Upstream service failed")
                        .with_detail(message.clone()),
                )
            }
            AppError::Config(ref e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Configuration error"),
                )
            }
            AppError::Bcrypt(ref e) => {
                tracing::error!("Bcrypt error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Password processing error"),
                )
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("File system error"),
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// 便捷的错误创建函数
impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn bad_request_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict_with_code(
        message: impl Into<String>,
        field: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            message: message.into(),
            field,
            code: Some(code.into()),
        }
    }

    pub fn dependent_records(resource: impl Into<String>) -> Self {
        Self::DependentRecords {
            resource: resource.into(),
        }
    }

    /// Maps a foreign-key failure on delete to a client error, everything else to `Database`.
    pub fn from_delete(err: diesel::result::Error, resource: &str) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                Self::dependent_records(resource)
            }
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = vec![
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (AppError::not_found("Project"), StatusCode::NOT_FOUND),
            (
                AppError::conflict_with_code("dup", Some("name".into()), error_codes::NAME_EXISTS),
                StatusCode::CONFLICT,
            ),
            (AppError::dependent_records("Project"), StatusCode::BAD_REQUEST),
            (
                AppError::ServiceUnavailable("speech not configured".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Upstream("boom".into()), StatusCode::BAD_GATEWAY),
            (
                AppError::Database(DieselError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Config("missing key".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn delete_mapping_leaves_other_errors_alone() {
        let err = AppError::from_delete(DieselError::NotFound, "Meeting");
        assert!(matches!(err, AppError::Database(DieselError::NotFound)));
    }
}
