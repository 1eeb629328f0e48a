//! crates/bookstore_core/src/session.rs
//!
//! Authentication state for the catalog client.
//!
//! `Session` is the one place that decides the user is logged out: it owns the
//! token store writes and the `AuthStatus` broadcast. `AuthSession` drives the
//! login/signup/logout flows over a `CatalogApi`.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::Credentials;
use crate::ports::{ApiError, ApiResult, CatalogApi, UnauthorizedHandler};
use crate::token::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticating,
    Authenticated,
}

//=========================================================================================
// Session (shared state)
//=========================================================================================

#[derive(Debug)]
pub struct Session {
    tokens: TokenStore,
    status: watch::Sender<AuthStatus>,
}

impl Session {
    /// Starts `Authenticated` if the store already holds a token, `Anonymous` otherwise.
    pub fn new(tokens: TokenStore) -> Self {
        let initial = if tokens.is_set() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        };
        let (status, _) = watch::channel(initial);
        Self { tokens, status }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Observes every status transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Drops the token and returns to `Anonymous`.
    pub fn invalidate(&self) {
        self.tokens.clear();
        self.transition(AuthStatus::Anonymous);
    }

    fn establish(&self, token: String) {
        self.tokens.set(token);
        self.transition(AuthStatus::Authenticated);
    }

    fn transition(&self, next: AuthStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            info!(from = ?*current, to = ?next, "auth status changed");
            *current = next;
            true
        });
    }
}

impl UnauthorizedHandler for Session {
    fn on_unauthorized(&self) {
        warn!("Remote service rejected the session; logging out");
        self.invalidate();
    }
}

//=========================================================================================
// AuthSession (flows)
//=========================================================================================

pub struct AuthSession {
    api: Arc<dyn CatalogApi>,
    session: Arc<Session>,
}

impl AuthSession {
    pub fn new(api: Arc<dyn CatalogApi>, session: Arc<Session>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn status(&self) -> AuthStatus {
        self.session.status()
    }

    /// Exchanges credentials for a token. On failure the session is `Anonymous`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let credentials = credentials(email, password)?;
        self.session.transition(AuthStatus::Authenticating);

        match self.api.login(&credentials).await {
            Ok(token) => {
                self.session.establish(token);
                info!(email = %credentials.email, "logged in");
                Ok(())
            }
            Err(e) => {
                warn!(email = %credentials.email, error = %e, "login failed");
                self.session.invalidate();
                Err(e)
            }
        }
    }

    /// Registers an account. Does not log in.
    pub async fn signup(&self, email: &str, password: &str) -> ApiResult<()> {
        let credentials = credentials(email, password)?;
        self.api.signup(&credentials).await?;
        info!(email = %credentials.email, "account created");
        Ok(())
    }

    /// Local only; there is no server-side revocation.
    pub fn logout(&self) {
        self.session.invalidate();
        info!("logged out");
    }
}

fn credentials(email: &str, password: &str) -> ApiResult<Credentials> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
