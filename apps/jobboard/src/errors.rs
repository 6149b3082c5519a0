use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not verified")]
    NotVerified,

    #[error("User not found")]
    UserNotFound,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "DUPLICATE_EMAIL",
                "Email already exists".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::BAD_REQUEST,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            AppError::NotVerified => (
                StatusCode::FORBIDDEN,
                "NOT_VERIFIED",
                "Please verify your email first".to_string(),
            ),
            AppError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Sign in required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Admin only".to_string(),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        assert_eq!(AppError::DuplicateEmail.parts().0, StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidToken.parts().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidCredentials.parts().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NotVerified.parts().0, StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthenticated.parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.parts().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_storage_error_hides_details() {
        let err = AppError::Storage(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/srv/data/users.json",
        )));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "STORAGE_ERROR");
        assert!(!message.contains("users.json"));
    }
}
