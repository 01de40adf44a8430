//! Opaque access token generation.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{Rng, rng};

/// Generate a random opaque token: 128 random bits as 32 lowercase hex chars.
pub fn generate_token() -> String {
    let bits: u128 = rng().random();
    format!("{bits:032x}")
}

/// Format a timestamp the way the notify service stores `created`.
pub fn format_created(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
