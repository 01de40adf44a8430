//! Cookie service — builds the token cookie handed to the browser.

use axum_extra::extract::cookie::Cookie;
use time::Duration;

/// Build the cookie carrying an issued access token.
///
/// Not httpOnly: the web client reads it to authenticate against the notify
/// service directly.
pub fn token_cookie(name: &str, token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), token.to_string()))
        .path("/".to_string())
        .max_age(Duration::seconds(max_age_secs))
        .build()
}
