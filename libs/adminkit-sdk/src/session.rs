use std::sync::Arc;

use adminkit_auth::{IDENTITY_KEY, SecretString, SessionStorage, TOKEN_KEY};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::api::{ApiClient, EmptyBody};
use crate::error::ApiError;
use crate::identity::Identity;

/// Minimum length for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub identity: Option<Identity>,
    /// A login request is in flight.
    pub loading: bool,
    /// Message of the last failed login, cleared by the next attempt.
    pub error: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    admin: Identity,
    #[serde(deserialize_with = "secret")]
    token: SecretString,
}

fn secret<'de, D: serde::Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

struct SessionInner {
    api: ApiClient,
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<AuthState>,
}

/// The admin's authenticated session.
///
/// Identity and token are persisted together in [`SessionStorage`]; the
/// bearer layer of the [`ApiClient`] reads the token from the same storage on
/// every request, so logging in or out takes effect on the next call.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Create an unauthenticated session. Call [`init`](Self::init) to
    /// restore a persisted one.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                storage,
                state: watch::Sender::new(AuthState::default()),
            }),
        }
    }

    /// Restore the persisted identity.
    ///
    /// An unreadable or inconsistent persisted session is wiped and treated as
    /// logged out.
    pub fn init(&self) {
        let restored = match self.read_persisted() {
            Ok(identity) => identity,
            Err(reason) => {
                tracing::warn!(%reason, "discarding persisted session");
                self.clear_storage();
                None
            }
        };
        self.inner.state.send_modify(|s| s.identity = restored);
    }

    fn read_persisted(&self) -> Result<Option<Identity>, String> {
        let storage = &self.inner.storage;
        let identity = storage.get(IDENTITY_KEY).map_err(|e| e.to_string())?;
        let token = storage
            .get(TOKEN_KEY)
            .map_err(|e| e.to_string())?
            .filter(|t| !t.trim().is_empty());

        match (identity, token) {
            (None, None) => Ok(None),
            (Some(raw), Some(_)) => serde_json::from_str::<Identity>(&raw)
                .map(Some)
                .map_err(|e| format!("corrupt identity: {e}")),
            (Some(_), None) => Err("identity without token".to_owned()),
            (None, Some(_)) => Err("token without identity".to_owned()),
        }
    }

    /// Authenticate and persist the session.
    ///
    /// On failure the previous session (if any) is left as it was.
    ///
    /// # Errors
    /// The server's message (e.g. "Invalid credentials"), or "Login failed".
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.try_login(email.trim(), password).await;

        self.inner.state.send_modify(|s| {
            s.loading = false;
            match &result {
                Ok(identity) => s.identity = Some(identity.clone()),
                Err(err) => s.error = Some(err.to_string()),
            }
        });
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        let response: LoginResponse = self
            .inner
            .api
            .post_anonymous("/admin/auth/login", &LoginRequest { email, password }, "Login failed")
            .await?;
        if response.token.is_blank() {
            return Err(ApiError::validation("Login failed"));
        }

        let raw_identity = serde_json::to_string(&response.admin)
            .map_err(|e| ApiError::validation(format!("Login failed: {e}")))?;
        let storage = &self.inner.storage;
        storage.set(IDENTITY_KEY, &raw_identity)?;
        if let Err(err) = storage.set(TOKEN_KEY, response.token.expose()) {
            self.clear_storage();
            return Err(err.into());
        }

        tracing::info!(admin_id = %response.admin.id, "admin logged in");
        Ok(response.admin)
    }

    /// End the session.
    ///
    /// The server is told on a best-effort basis; the local session is cleared
    /// whether or not that call succeeds.
    pub async fn logout(&self) {
        if let Err(err) = self
            .inner
            .api
            .post("/auth/logout", &EmptyBody {}, "Logout failed")
            .await
        {
            tracing::debug!(error = %err, "logout call failed; clearing local session anyway");
        }
        self.clear_local();
        tracing::info!("admin logged out");
    }

    /// Drop the local session without contacting the server.
    pub fn invalidate(&self) {
        self.clear_local();
        tracing::info!("session invalidated");
    }

    /// Change the admin's password.
    ///
    /// # Errors
    /// [`ApiError::Validation`] if `new` is shorter than [`MIN_PASSWORD_LEN`]
    /// (nothing is sent), otherwise the server's message or
    /// "Failed to change password". The session is kept either way.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.inner
            .api
            .post(
                "/admin/auth/change-password",
                &ChangePasswordRequest {
                    current_password: current,
                    new_password: new,
                },
                "Failed to change password",
            )
            .await
    }

    /// [`change_password`](Self::change_password) with a confirmation field.
    ///
    /// # Errors
    /// "New passwords do not match" when `confirm` differs from `new`.
    pub async fn change_password_confirmed(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ApiError> {
        if new != confirm {
            return Err(ApiError::validation("New passwords do not match"));
        }
        self.change_password(current, new).await
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().identity.is_some()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    fn clear_local(&self) {
        self.clear_storage();
        self.inner.state.send_modify(|s| {
            s.identity = None;
            s.error = None;
        });
    }

    fn clear_storage(&self) {
        for key in [TOKEN_KEY, IDENTITY_KEY] {
            if let Err(err) = self.inner.storage.remove(key) {
                tracing::warn!(key, error = %err, "failed to clear persisted session key");
            }
        }
    }
}
