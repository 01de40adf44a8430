//! Application error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notify_login_core::login::LoginError;
use thiserror::Error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login rejected. The cause is kept for logging only.
    #[error("Forbidden: {0}")]
    Forbidden(#[from] LoginError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every rejection looks the same to the client.
        match self {
            AppError::Forbidden(_) => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use notify_login_core::notify::NotifyError;

    use super::*;

    #[tokio::test]
    async fn rejections_are_uniform() {
        let errors = [
            LoginError::UnknownUser,
            LoginError::LookupFailed(NotifyError::Decode("bad".into())),
            LoginError::ProvisioningFailed(NotifyError::Transport("reset".into())),
            LoginError::TokenIssuanceFailed(NotifyError::Status {
                status: 500,
                body: "secret detail".into(),
            }),
        ];

        for e in errors {
            let resp = AppError::from(e).into_response();
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(body.is_empty());
        }
    }
}
