//! Authenticated-session state machine.
//!
//! `SessionManager` owns the only mutable view of "who is logged in". State
//! moves `Unauthenticated -> Authenticating -> Authenticated` and falls back
//! to `Unauthenticated` on logout, on any login failure, or when the gateway
//! broadcasts that the backend rejected the credential. Consumers observe the
//! state through a `watch` channel; nothing else in the crate mutates it.

use std::sync::{Arc, LazyLock, Weak};

use regex::Regex;
use tokio::sync::{broadcast, watch};

use crate::contract::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, User,
};
use crate::errors::{ApiError, ApiResult};
use crate::gateway::ApiGateway;
use crate::token::TokenStore;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable session snapshot: the lifecycle stage plus the profile once
/// authenticated.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub auth: AuthState,
    pub user: Option<User>,
}

impl SessionState {
    fn unauthenticated() -> Self {
        Self {
            auth: AuthState::Unauthenticated,
            user: None,
        }
    }
}

/// Owns login/register/logout/restore and the invalidation listener.
pub struct SessionManager {
    gateway: Arc<ApiGateway>,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Builds the manager and spawns the background task that drops the
    /// session whenever the gateway reports a rejected credential. Requires a
    /// tokio runtime.
    pub fn new(gateway: Arc<ApiGateway>, tokens: Arc<dyn TokenStore>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::unauthenticated());
        let manager = Arc::new(Self {
            gateway,
            tokens,
            state,
        });
        manager.spawn_invalidation_listener();
        manager
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Authenticates and loads the user profile. Credential validation
    /// happens before any state change or network call; any failure after
    /// that clears the stored token and returns to `Unauthenticated`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        validate_credentials(email, password)?;

        self.state.send_modify(|state| {
            state.auth = AuthState::Authenticating;
            state.user = None;
        });

        match self.try_login(email.trim(), password).await {
            Ok(user) => {
                self.state.send_modify(|state| {
                    state.auth = AuthState::Authenticated;
                    state.user = Some(user.clone());
                });
                tracing::info!(user = %user.email, "authenticated");
                Ok(user)
            }
            Err(err) => {
                self.tokens.clear();
                self.force_unauthenticated();
                Err(err)
            }
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> ApiResult<User> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth = self.gateway.login(&request).await?;
        self.tokens.set(&auth.access_token);
        // The login echo is partial at best; /users/me is authoritative.
        self.gateway.current_user().await
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> ApiResult<User> {
        validate_credentials(email, password)?;
        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            username: username.map(|u| u.to_string()),
        };
        let registered = self.gateway.register(&request).await?;
        tracing::info!(user = %registered.email, "registered");
        self.login(email, password).await
    }

    /// Synchronous and idempotent; never touches the network.
    pub fn logout(&self) {
        self.tokens.clear();
        self.force_unauthenticated();
    }

    /// Startup hydration: when a credential is already stored, fetch the
    /// profile and enter `Authenticated`. `Ok(None)` when nothing is stored;
    /// a failed profile fetch clears the credential and surfaces the error.
    pub async fn restore(&self) -> ApiResult<Option<User>> {
        if self.tokens.get().is_none() {
            return Ok(None);
        }

        self.state
            .send_modify(|state| state.auth = AuthState::Authenticating);

        match self.gateway.current_user().await {
            Ok(user) => {
                self.state.send_modify(|state| {
                    state.auth = AuthState::Authenticated;
                    state.user = Some(user.clone());
                });
                tracing::info!(user = %user.email, "session restored");
                Ok(Some(user))
            }
            Err(err) => {
                self.tokens.clear();
                self.force_unauthenticated();
                Err(err)
            }
        }
    }

    /// Rotates the bearer token in place. The session state is untouched.
    pub async fn refresh_token(&self) -> ApiResult<()> {
        if self.tokens.get().is_none() {
            return Err(ApiError::Auth("no session to refresh".to_string()));
        }
        let rotated = self.gateway.refresh_token().await?;
        self.tokens.set(&rotated.access_token);
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(ApiError::validation(format!(
                "'{email}' does not look like an email address"
            )));
        }
        let response = self
            .gateway
            .forgot_password(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .await?;
        Ok(response.message)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<String> {
        if token.trim().is_empty() {
            return Err(ApiError::validation("reset token must not be empty"));
        }
        if new_password.is_empty() {
            return Err(ApiError::validation("new password must not be empty"));
        }
        let response = self
            .gateway
            .reset_password(&ResetPasswordRequest {
                token: token.trim().to_string(),
                new_password: new_password.to_string(),
            })
            .await?;
        Ok(response.message)
    }

    fn force_unauthenticated(&self) {
        self.state.send_if_modified(|state| {
            if state.auth == AuthState::Unauthenticated && state.user.is_none() {
                return false;
            }
            *state = SessionState::unauthenticated();
            true
        });
    }

    fn spawn_invalidation_listener(self: &Arc<Self>) {
        let mut events = self.gateway.subscribe_invalidations();
        let weak: Weak<SessionManager> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(manager) = weak.upgrade() else { break };
                        tracing::info!(reason = %event.message, "session invalidated by backend");
                        manager.force_unauthenticated();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed events all collapse to the same outcome.
                        tracing::debug!(skipped, "invalidation listener lagged");
                        let Some(manager) = weak.upgrade() else { break };
                        manager.force_unauthenticated();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

fn validate_credentials(email: &str, password: &str) -> ApiResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("email must not be empty"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::validation(format!(
            "'{email}' does not look like an email address"
        )));
    }
    if password.is_empty() {
        return Err(ApiError::validation("password must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;
    use std::time::Duration;

    fn manager_with_tokens() -> (Arc<SessionManager>, Arc<MemoryTokenStore>) {
        let tokens = Arc::new(MemoryTokenStore::new());
        // Closed port: any request would fail fast, but these tests never
        // reach the network.
        let gateway = Arc::new(
            ApiGateway::from_url(
                "http://127.0.0.1:9",
                Duration::from_millis(200),
                tokens.clone() as Arc<dyn TokenStore>,
            )
            .unwrap(),
        );
        let manager = SessionManager::new(gateway, tokens.clone() as Arc<dyn TokenStore>);
        (manager, tokens)
    }

    #[test]
    fn credential_validation_rejects_bad_input() {
        assert!(matches!(
            validate_credentials("", "pw"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_credentials("not-an-email", "pw"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_credentials("a@b", "pw"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_credentials("a@b.com", ""),
            Err(ApiError::Validation(_))
        ));
        assert!(validate_credentials("a@b.com", "pw").is_ok());
        assert!(validate_credentials("  a@b.com  ", "pw").is_ok());
    }

    #[tokio::test]
    async fn login_rejects_invalid_email_without_state_change() {
        let (manager, tokens) = manager_with_tokens();
        let err = manager.login("nope", "secret").await.err().unwrap();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(manager.state().auth, AuthState::Unauthenticated);
        assert_eq!(tokens.get(), None);
    }

    #[tokio::test]
    async fn logout_is_idempotent_and_offline() {
        let (manager, tokens) = manager_with_tokens();
        tokens.set("tok1");

        manager.logout();
        assert_eq!(tokens.get(), None);
        assert_eq!(manager.state().auth, AuthState::Unauthenticated);
        assert!(manager.state().user.is_none());

        manager.logout();
        assert_eq!(manager.state().auth, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn restore_without_stored_token_is_a_noop() {
        let (manager, _tokens) = manager_with_tokens();
        let restored = manager.restore().await.unwrap();
        assert!(restored.is_none());
        assert_eq!(manager.state().auth, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn refresh_without_session_is_an_auth_error() {
        let (manager, _tokens) = manager_with_tokens();
        let err = manager.refresh_token().await.err().unwrap();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn failed_login_clears_token_and_notifies_subscribers() {
        let (manager, tokens) = manager_with_tokens();
        let mut rx = manager.subscribe();

        // Nothing is listening on the port, so the request itself fails.
        let err = manager.login("a@b.com", "secret").await.err().unwrap();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(tokens.get(), None);

        // At least one notification fired; the latest value is the rollback.
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().auth, AuthState::Unauthenticated);
        assert_eq!(manager.state().auth, AuthState::Unauthenticated);
    }
}
