//! Login request handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppResult;
use crate::services::cookies::token_cookie;

/// Query string of `GET /login`.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub username: Option<String>,
}

/// `GET /login?username=<name>` — exchange a known username for a token cookie.
///
/// 200 with the cookie on success, 403 with an empty body otherwise. A missing
/// or unparsable query counts as an unknown user.
pub async fn login_handler(
    State(state): State<AppState>,
    query: Result<Query<LoginQuery>, QueryRejection>,
    jar: CookieJar,
) -> AppResult<CookieJar> {
    let username = query
        .ok()
        .and_then(|Query(q)| q.username)
        .unwrap_or_default();

    match state.login.login(&username).await {
        Ok(token) => {
            info!(username = %username, "login succeeded");
            let cookie = token_cookie(
                &state.config.cookie_name,
                &token,
                state.config.cookie_max_age_secs,
            );
            Ok(jar.add(cookie))
        }
        Err(e) => {
            warn!(username = %username, kind = e.kind(), error = %e, "login rejected");
            Err(e.into())
        }
    }
}
