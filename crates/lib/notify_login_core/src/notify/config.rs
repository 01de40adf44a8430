//! Notify service client configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

use super::NotifyError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of attempts for the account lookup.
pub const DEFAULT_LOOKUP_ATTEMPTS: u32 = 3;
/// Delay before the first lookup retry; doubled on each further retry.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Connection settings for the notify service.
#[derive(Clone)]
pub struct NotifyConfig {
    /// Service base URL. Always ends with `/` so endpoints join beneath it.
    pub base_url: Url,
    /// Shared secret sent in the `x-notify-token` header.
    pub service_token: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Attempts for the lookup call (at least one is always made).
    pub lookup_attempts: u32,
    pub retry_backoff: Duration,
}

impl NotifyConfig {
    /// Build a config with default timeout and retry policy.
    pub fn new(base_url: &str, service_token: impl Into<String>) -> Result<Self, NotifyError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| NotifyError::Config(format!("invalid notify base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(NotifyError::Config(format!(
                "notify base URL '{base_url}' cannot be a base"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            service_token: service_token.into(),
            timeout: DEFAULT_TIMEOUT,
            lookup_attempts: DEFAULT_LOOKUP_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_lookup_attempts(mut self, attempts: u32) -> Self {
        self.lookup_attempts = attempts;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Resolve an endpoint path (e.g. `"users"`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, NotifyError> {
        self.base_url
            .join(path)
            .map_err(|e| NotifyError::Config(format!("invalid endpoint '{path}': {e}")))
    }
}

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("base_url", &self.base_url.as_str())
            .field("service_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("lookup_attempts", &self.lookup_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}
