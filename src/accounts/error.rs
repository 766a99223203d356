use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Tagged outcomes of account operations. The HTTP layer maps each
/// variant to a status code; storage failures stay generic on the wire.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username or email already exists")]
    Duplicate,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Self::Duplicate => (StatusCode::BAD_REQUEST, "Username or email already exists"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            Self::NotFound => (StatusCode::NOT_FOUND, "Account not found"),
            Self::Storage(e) => {
                error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_expected_status_codes() {
        assert_eq!(
            AccountError::Duplicate.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AccountError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AccountError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AccountError::Storage(sqlx::Error::PoolClosed)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
