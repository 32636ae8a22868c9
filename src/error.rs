use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::token::TokenError;

/// Failure taxonomy for the auth service. Infrastructure failures are
/// collapsed into `Internal` and never leak detail to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email")]
    InvalidEmail,

    #[error("password must be set")]
    PasswordNotSet,

    #[error("email already registered")]
    EmailTaken,

    /// Single outward value for both unknown email and wrong password,
    /// so responses do not reveal which accounts exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Token(#[from] TokenError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::InvalidEmail | AuthError::PasswordNotSet => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AuthError::EmailTaken => (StatusCode::CONFLICT, self.to_string()),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::Token(e) => {
                error!(error = %e, "token rejected");
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::InvalidEmail.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::PasswordNotSet.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::EmailTaken.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Token(TokenError::Expired).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("pool exhausted"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_error_body_is_generic() {
        let resp = AuthError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3:5432"))
            .into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("internal server error"));
        assert!(!body.contains("10.0.0.3"));
    }
}
