//! Notify service — the downstream identity and token store.
//!
//! The login flow talks to it through the [`NotifyService`] trait so tests can
//! substitute an in-memory fake. [`http::HttpNotifyClient`] is the production
//! implementation over the service's JSON:API endpoints.
//!
//! # Endpoints
//!
//! - `GET /users?filter[internalID]=<id>` — find the account for an internal id
//! - `POST /users` — provision an account
//! - `POST /tokens` — issue an access token linked to an account

pub mod config;
pub mod http;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use config::NotifyConfig;
pub use self::http::HttpNotifyClient;
pub use models::{AccessToken, NewAccessToken, NewNotifyUser, NotifyUser};

/// Errors returned by a notify service call.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notify service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl NotifyError {
    /// The service rejected a create because the resource already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, NotifyError::Status { status: 409, .. })
    }

    /// Worth retrying: the request never got an answer, or the service failed.
    pub fn is_transient(&self) -> bool {
        match self {
            NotifyError::Transport(_) => true,
            NotifyError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Operations the login flow needs from the notify service.
#[async_trait]
pub trait NotifyService: Send + Sync {
    /// Find the account linked to `internal_id`. `Ok(None)` when there is none.
    async fn find_user(&self, internal_id: i64) -> Result<Option<NotifyUser>, NotifyError>;

    /// Provision a new account.
    async fn create_user(&self, user: &NewNotifyUser) -> Result<NotifyUser, NotifyError>;

    /// Issue an access token linked to an existing account.
    async fn create_token(&self, token: &NewAccessToken) -> Result<AccessToken, NotifyError>;
}
