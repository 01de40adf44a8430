//! # notify_login_api
//!
//! HTTP API library for the notify login gateway.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use http::Method;
use notify_login_core::login::LoginOrchestrator;
use tower_http::cors::CorsLayer;

use crate::config::ApiConfig;
use crate::handlers::login;

/// Route for the login endpoint.
pub const GET_LOGIN: &str = "/login";

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Login flow shared by all requests.
    pub login: Arc<LoginOrchestrator>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.allowed_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET]);

    Router::new()
        .route(GET_LOGIN, get(login::login_handler))
        .layer(cors)
        .with_state(state)
}
