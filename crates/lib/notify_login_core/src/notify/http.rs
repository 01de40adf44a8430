//! HTTP client for the notify service.
//!
//! Every request carries the shared-secret header and the configured timeout.
//! The account lookup is retried on transient failures with exponential
//! backoff; creates are attempted once so a retry can never mint a second
//! account or token.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::config::NotifyConfig;
use super::models::{AccessToken, Document, NewAccessToken, NewNotifyUser, NotifyUser};
use super::{NotifyError, NotifyService};

/// Header carrying the shared secret.
pub const NOTIFY_TOKEN_HEADER: &str = "x-notify-token";
/// Content type for JSON:API request bodies.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// [`NotifyService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotifyClient {
    client: Client,
    config: NotifyConfig,
}

impl HttpNotifyClient {
    pub fn new(config: NotifyConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn find_user_once(&self, internal_id: i64) -> Result<Option<NotifyUser>, NotifyError> {
        let resp = self
            .client
            .get(self.config.endpoint("users")?)
            .header(NOTIFY_TOKEN_HEADER, &self.config.service_token)
            .query(&[("filter[internalID]", internal_id)])
            .send()
            .await
            .map_err(transport_error)?;

        let doc: Document<Vec<NotifyUser>> = read_json(resp).await?;
        Ok(doc.data.into_iter().next())
    }

    async fn post_document<B, T>(&self, path: &str, body: &B) -> Result<T, NotifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)
            .map_err(|e| NotifyError::Encode(format!("{path} request body: {e}")))?;

        let resp = self
            .client
            .post(self.config.endpoint(path)?)
            .header(NOTIFY_TOKEN_HEADER, &self.config.service_token)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let doc: Document<T> = read_json(resp).await?;
        Ok(doc.data)
    }
}

#[async_trait]
impl NotifyService for HttpNotifyClient {
    async fn find_user(&self, internal_id: i64) -> Result<Option<NotifyUser>, NotifyError> {
        let attempts = self.config.lookup_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.find_user_once(internal_id).await {
                Ok(user) => return Ok(user),
                Err(e) if e.is_transient() => {
                    warn!(
                        internal_id,
                        attempt = attempt + 1,
                        attempts,
                        error = %e,
                        "notify user lookup failed"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }

            // Exponential backoff before retry
            if attempt + 1 < attempts {
                sleep(self.config.retry_backoff * 2u32.saturating_pow(attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            NotifyError::Transport(format!("lookup failed after {attempts} attempts"))
        }))
    }

    async fn create_user(&self, user: &NewNotifyUser) -> Result<NotifyUser, NotifyError> {
        debug!(internal_id = user.internal_id, "creating notify user");
        self.post_document("users", &user.to_document()).await
    }

    async fn create_token(&self, token: &NewAccessToken) -> Result<AccessToken, NotifyError> {
        debug!(user_id = %token.user_id, "creating access token");
        self.post_document("tokens", &token.to_document()).await
    }
}

fn transport_error(e: reqwest::Error) -> NotifyError {
    if e.is_timeout() {
        NotifyError::Transport(format!("request timed out: {e}"))
    } else {
        NotifyError::Transport(e.to_string())
    }
}

/// Check the status, then decode the body as JSON.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, NotifyError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(NotifyError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| NotifyError::Decode(format!("notify response parse error: {e}")))
}
