//! Login orchestration.
//!
//! `login(username)` runs a strictly sequential pipeline and stops at the first
//! failure:
//!
//! 1. resolve the username through the identity directory (no network call)
//! 2. fetch the notify account for the internal id, provisioning it if absent
//! 3. issue a fresh access token linked to that account
//!
//! Each failure keeps its own [`LoginError`] kind so it can be logged; the HTTP
//! layer collapses them into one uniform rejection.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::identity::IdentityDirectory;
use crate::notify::{NewAccessToken, NewNotifyUser, NotifyError, NotifyService, NotifyUser};
use crate::token::generate_token;

/// Origin recorded on issued tokens unless configured otherwise.
pub const DEFAULT_TOKEN_ORIGIN: &str = "http://localhost:4200";
/// Username given to provisioned notify accounts.
pub const DEFAULT_PROVISIONED_USERNAME: &str = "test";

/// Why a login was rejected.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Unknown user")]
    UnknownUser,

    #[error("Notify user lookup failed: {0}")]
    LookupFailed(#[source] NotifyError),

    #[error("Notify user provisioning failed: {0}")]
    ProvisioningFailed(#[source] NotifyError),

    #[error("Access token issuance failed: {0}")]
    TokenIssuanceFailed(#[source] NotifyError),
}

impl LoginError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LoginError::UnknownUser => "unknown_user",
            LoginError::LookupFailed(_) => "lookup_failed",
            LoginError::ProvisioningFailed(_) => "provisioning_failed",
            LoginError::TokenIssuanceFailed(_) => "token_issuance_failed",
        }
    }
}

/// Values written into downstream records.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    /// `origin` attribute of issued tokens.
    pub origin: String,
    /// `username` attribute of provisioned accounts.
    pub provisioned_username: String,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_TOKEN_ORIGIN.to_string(),
            provisioned_username: DEFAULT_PROVISIONED_USERNAME.to_string(),
        }
    }
}

/// Turns a username into an access token.
#[derive(Clone)]
pub struct LoginOrchestrator {
    directory: Arc<dyn IdentityDirectory>,
    notify: Arc<dyn NotifyService>,
    settings: LoginSettings,
}

impl LoginOrchestrator {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        notify: Arc<dyn NotifyService>,
        settings: LoginSettings,
    ) -> Self {
        Self {
            directory,
            notify,
            settings,
        }
    }

    /// Log `username` in and return the issued token string.
    pub async fn login(&self, username: &str) -> Result<String, LoginError> {
        let Some(internal_id) = self.directory.internal_id(username) else {
            debug!(username, "unknown username");
            return Err(LoginError::UnknownUser);
        };

        let user = self.fetch_or_provision(internal_id).await?;
        self.issue_token(&user).await
    }

    async fn fetch_or_provision(&self, internal_id: i64) -> Result<NotifyUser, LoginError> {
        let found = self
            .notify
            .find_user(internal_id)
            .await
            .map_err(LoginError::LookupFailed)?;

        match found {
            Some(user) => {
                debug!(internal_id, user_id = %user.id, "notify user found");
                Ok(user)
            }
            None => self.provision(internal_id).await,
        }
    }

    async fn provision(&self, internal_id: i64) -> Result<NotifyUser, LoginError> {
        let new_user = NewNotifyUser {
            username: self.settings.provisioned_username.clone(),
            internal_id,
            bot: false,
        };

        match self.notify.create_user(&new_user).await {
            Ok(user) => {
                info!(internal_id, user_id = %user.id, "notify user provisioned");
                Ok(user)
            }
            // A concurrent login provisioned the account first.
            Err(e) if e.is_conflict() => {
                warn!(internal_id, "notify user already exists, re-fetching");
                match self.notify.find_user(internal_id).await {
                    Ok(Some(user)) => Ok(user),
                    Ok(None) => Err(LoginError::ProvisioningFailed(e)),
                    Err(refetch) => Err(LoginError::ProvisioningFailed(refetch)),
                }
            }
            Err(e) => Err(LoginError::ProvisioningFailed(e)),
        }
    }

    async fn issue_token(&self, user: &NotifyUser) -> Result<String, LoginError> {
        let new_token = NewAccessToken {
            token: generate_token(),
            created: Utc::now(),
            origin: self.settings.origin.clone(),
            user_id: user.id.clone(),
        };

        let record = self
            .notify
            .create_token(&new_token)
            .await
            .map_err(LoginError::TokenIssuanceFailed)?;

        info!(user_id = %user.id, "access token issued");
        Ok(record.attributes.token)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::identity::StaticDirectory;
    use crate::notify::AccessToken;
    use crate::notify::models::{TokenAttributes, UserAttributes};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        FindUser(i64),
        CreateUser(NewNotifyUser),
        CreateToken(NewAccessToken),
    }

    /// Scripted notify service that records every call.
    #[derive(Default)]
    struct FakeNotify {
        calls: Mutex<Vec<Call>>,
        lookups: Mutex<VecDeque<Result<Option<NotifyUser>, NotifyError>>>,
        create_user: Mutex<Option<Result<NotifyUser, NotifyError>>>,
        token_error: Mutex<Option<NotifyError>>,
    }

    impl FakeNotify {
        fn with_lookup(self, result: Result<Option<NotifyUser>, NotifyError>) -> Self {
            self.lookups.lock().unwrap().push_back(result);
            self
        }

        fn with_create_user(self, result: Result<NotifyUser, NotifyError>) -> Self {
            *self.create_user.lock().unwrap() = Some(result);
            self
        }

        fn with_token_error(self, error: NotifyError) -> Self {
            *self.token_error.lock().unwrap() = Some(error);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotifyService for FakeNotify {
        async fn find_user(&self, internal_id: i64) -> Result<Option<NotifyUser>, NotifyError> {
            self.calls.lock().unwrap().push(Call::FindUser(internal_id));
            self.lookups.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }

        async fn create_user(&self, user: &NewNotifyUser) -> Result<NotifyUser, NotifyError> {
            self.calls.lock().unwrap().push(Call::CreateUser(user.clone()));
            self.create_user
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(notify_user("new")))
        }

        async fn create_token(&self, token: &NewAccessToken) -> Result<AccessToken, NotifyError> {
            self.calls.lock().unwrap().push(Call::CreateToken(token.clone()));
            if let Some(e) = self.token_error.lock().unwrap().take() {
                return Err(e);
            }
            Ok(AccessToken {
                id: Some("t-1".into()),
                attributes: TokenAttributes {
                    token: token.token.clone(),
                    created: None,
                    origin: Some(token.origin.clone()),
                },
            })
        }
    }

    fn notify_user(id: &str) -> NotifyUser {
        NotifyUser {
            id: id.to_string(),
            attributes: UserAttributes::default(),
        }
    }

    fn status(status: u16) -> NotifyError {
        NotifyError::Status {
            status,
            body: String::new(),
        }
    }

    fn orchestrator(fake: &Arc<FakeNotify>) -> LoginOrchestrator {
        LoginOrchestrator::new(
            Arc::new(StaticDirectory::builtin()),
            fake.clone(),
            LoginSettings::default(),
        )
    }

    fn issued(call: &Call) -> &NewAccessToken {
        match call {
            Call::CreateToken(t) => t,
            other => panic!("expected CreateToken, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn existing_user_skips_provisioning() {
        let fake = Arc::new(FakeNotify::default().with_lookup(Ok(Some(notify_user("42")))));

        let token = orchestrator(&fake).login("tabone").await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::FindUser(0));
        let sent = issued(&calls[1]);
        assert_eq!(sent.user_id, "42");
        assert_eq!(sent.origin, DEFAULT_TOKEN_ORIGIN);
        assert_eq!(sent.token, token);
    }

    #[tokio::test]
    async fn missing_user_is_provisioned_once() {
        let fake = Arc::new(
            FakeNotify::default()
                .with_lookup(Ok(None))
                .with_create_user(Ok(notify_user("77"))),
        );

        let token = orchestrator(&fake).login("lorenzo").await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Call::FindUser(25));
        assert_eq!(
            calls[1],
            Call::CreateUser(NewNotifyUser {
                username: DEFAULT_PROVISIONED_USERNAME.into(),
                internal_id: 25,
                bot: false,
            })
        );
        let sent = issued(&calls[2]);
        assert_eq!(sent.user_id, "77");
        assert_eq!(sent.token, token);
    }

    #[tokio::test]
    async fn unknown_user_makes_no_calls() {
        let fake = Arc::new(FakeNotify::default());

        let err = orchestrator(&fake).login("unknown").await.unwrap_err();

        assert!(matches!(err, LoginError::UnknownUser));
        assert_eq!(err.kind(), "unknown_user");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_rejects_without_provisioning() {
        let fake = Arc::new(
            FakeNotify::default().with_lookup(Err(NotifyError::Decode("bad json".into()))),
        );

        let err = orchestrator(&fake).login("tabone").await.unwrap_err();

        assert!(matches!(err, LoginError::LookupFailed(_)));
        assert_eq!(fake.calls(), vec![Call::FindUser(0)]);
    }

    #[tokio::test]
    async fn provisioning_failure_rejects_before_token() {
        let fake = Arc::new(
            FakeNotify::default()
                .with_lookup(Ok(None))
                .with_create_user(Err(status(500))),
        );

        let err = orchestrator(&fake).login("lorenzo").await.unwrap_err();

        assert!(matches!(err, LoginError::ProvisioningFailed(_)));
        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[1], Call::CreateUser(_)));
    }

    #[tokio::test]
    async fn token_failure_rejects_after_successful_lookup() {
        let fake = Arc::new(
            FakeNotify::default()
                .with_lookup(Ok(Some(notify_user("42"))))
                .with_token_error(NotifyError::Transport("connection reset".into())),
        );

        let err = orchestrator(&fake).login("tabone").await.unwrap_err();

        assert!(matches!(err, LoginError::TokenIssuanceFailed(_)));
        assert_eq!(err.kind(), "token_issuance_failed");
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn conflict_on_provision_refetches_once() {
        let fake = Arc::new(
            FakeNotify::default()
                .with_lookup(Ok(None))
                .with_lookup(Ok(Some(notify_user("88"))))
                .with_create_user(Err(status(409))),
        );

        orchestrator(&fake).login("lorenzo").await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::FindUser(25));
        assert!(matches!(calls[1], Call::CreateUser(_)));
        assert_eq!(calls[2], Call::FindUser(25));
        assert_eq!(issued(&calls[3]).user_id, "88");
    }

    #[tokio::test]
    async fn conflict_with_empty_refetch_is_provisioning_failure() {
        let fake = Arc::new(
            FakeNotify::default()
                .with_lookup(Ok(None))
                .with_lookup(Ok(None))
                .with_create_user(Err(status(409))),
        );

        let err = orchestrator(&fake).login("lorenzo").await.unwrap_err();

        assert!(matches!(err, LoginError::ProvisioningFailed(ref e) if e.is_conflict()));
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test]
    async fn settings_flow_into_records() {
        let fake = Arc::new(FakeNotify::default().with_lookup(Ok(None)));
        let login = LoginOrchestrator::new(
            Arc::new(StaticDirectory::new(HashMap::from([("ada".to_string(), 9)]))),
            fake.clone(),
            LoginSettings {
                origin: "https://app.example".into(),
                provisioned_username: "placeholder".into(),
            },
        );

        login.login("ada").await.unwrap();

        let calls = fake.calls();
        assert!(
            matches!(&calls[1], Call::CreateUser(u) if u.username == "placeholder" && u.internal_id == 9)
        );
        assert_eq!(issued(&calls[2]).origin, "https://app.example");
    }

    #[tokio::test]
    async fn each_login_mints_a_fresh_token() {
        let fake = Arc::new(
            FakeNotify::default()
                .with_lookup(Ok(Some(notify_user("42"))))
                .with_lookup(Ok(Some(notify_user("42")))),
        );
        let login = orchestrator(&fake);

        let first = login.login("tabone").await.unwrap();
        let second = login.login("tabone").await.unwrap();

        assert_ne!(first, second);
    }
}
