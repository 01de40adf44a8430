//! # notify_login_core
//!
//! Core login logic for the notify login gateway.
//!
//! A login resolves a username through an [`identity::IdentityDirectory`],
//! makes sure the matching notify account exists through a
//! [`notify::NotifyService`], and mints an access token for it. See
//! [`login::LoginOrchestrator`].

pub mod identity;
pub mod login;
pub mod notify;
pub mod token;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
