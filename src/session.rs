//! Authenticated identity and on-demand bearer tokens.
//!
//! The session starts out `Initializing` until the identity provider has
//! reported in. `token()` parks on the state cell until that happens instead
//! of failing early, so requests may be issued before sign-in resolves.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{CreateUserRequest, User};

// ── Identity ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Initializing,
    SignedIn(Identity),
    SignedOut,
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn(_))
    }
}

/// The third-party identity provider (OAuth popup, email/password, ...).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// A fresh bearer token for the signed-in identity.
    async fn id_token(&self) -> Result<String, ClientError>;

    /// Remove the identity on the provider side. Used to roll back a
    /// sign-up whose backend profile could not be created.
    async fn delete_identity(&self) -> Result<(), ClientError>;
}

/// Provider with a fixed token, for the CLI and tests.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    token: String,
    deleted: AtomicBool,
}

impl StaticIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        StaticIdentity {
            token: token.into(),
            deleted: AtomicBool::new(false),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn id_token(&self) -> Result<String, ClientError> {
        if self.is_deleted() {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(self.token.clone())
    }

    async fn delete_identity(&self) -> Result<(), ClientError> {
        self.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ── Session ────────────────────────────────────────────────────

struct Inner {
    state: watch::Sender<AuthState>,
    provider: RwLock<Option<Arc<dyn IdentityProvider>>>,
    user: RwLock<Option<User>>,
}

/// Cheap to clone; all clones share one identity.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Initializing);
        Session {
            inner: Arc::new(Inner {
                state,
                provider: RwLock::new(None),
                user: RwLock::new(None),
            }),
        }
    }

    /// A session that is already signed in. No backend profile is loaded.
    pub fn signed_in(identity: Identity, provider: Arc<dyn IdentityProvider>) -> Self {
        let session = Session::new();
        session.establish(identity, provider);
        session
    }

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// The backend profile of the signed-in user, once loaded.
    pub fn user(&self) -> Option<User> {
        self.inner.user.read().ok().and_then(|u| u.clone())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|u| u.id)
    }

    pub fn set_user(&self, user: Option<User>) {
        if let Ok(mut slot) = self.inner.user.write() {
            *slot = user;
        }
    }

    fn provider(&self) -> Option<Arc<dyn IdentityProvider>> {
        self.inner.provider.read().ok().and_then(|p| p.clone())
    }

    /// Current bearer token. Waits while the identity is still initializing.
    pub async fn token(&self) -> Result<String, ClientError> {
        let mut rx = self.inner.state.subscribe();
        let signed_in = {
            let state = rx
                .wait_for(|s| *s != AuthState::Initializing)
                .await
                .map_err(|_| ClientError::NotAuthenticated)?;
            state.is_signed_in()
        };
        if !signed_in {
            return Err(ClientError::NotAuthenticated);
        }
        let provider = self.provider().ok_or(ClientError::NotAuthenticated)?;
        provider.id_token().await
    }

    /// Provider reported that nobody is signed in.
    pub fn resolve_signed_out(&self) {
        self.sign_out();
    }

    /// Install an identity without touching the backend.
    pub fn establish(&self, identity: Identity, provider: Arc<dyn IdentityProvider>) {
        if let Ok(mut slot) = self.inner.provider.write() {
            *slot = Some(provider);
        }
        info!(uid = %identity.uid, "identity established");
        self.inner.state.send_replace(AuthState::SignedIn(identity));
    }

    /// Sign in and load the backend profile.
    ///
    /// On a first-time sign-in the backend profile is created first. If that
    /// fails, the provider identity is deleted and the session rolls back to
    /// signed out, so no client-only identity is left behind.
    pub async fn sign_in(
        &self,
        api: &ApiClient,
        identity: Identity,
        provider: Arc<dyn IdentityProvider>,
        first_time: bool,
    ) -> Result<User, ClientError> {
        self.establish(identity.clone(), provider.clone());

        if first_time {
            let request = CreateUserRequest {
                firebase_uid: identity.uid.clone(),
                name: identity.display_name.clone().unwrap_or_default(),
                email: identity.email.clone().unwrap_or_default(),
            };
            if let Err(e) = api.users().create(&request).await {
                error!(uid = %identity.uid, error = %e, "profile creation failed, rolling back identity");
                if let Err(del) = provider.delete_identity().await {
                    warn!(error = %del, "could not delete provider identity");
                }
                self.sign_out();
                return Err(e);
            }
        }

        let user = api.users().current().await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&self) {
        if let Ok(mut slot) = self.inner.provider.write() {
            *slot = None;
        }
        self.set_user(None);
        self.inner.state.send_replace(AuthState::SignedOut);
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn identity() -> Identity {
        Identity {
            uid: "uid-1".into(),
            display_name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
        }
    }

    #[tokio::test]
    async fn token_waits_for_identity() {
        let session = Session::new();
        let waiter = tokio::spawn({
            let session = session.clone();
            async move { session.token().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        session.establish(identity(), Arc::new(StaticIdentity::new("tok")));
        assert_eq!(waiter.await.unwrap().unwrap(), "tok");
    }

    #[tokio::test]
    async fn token_fails_when_resolved_signed_out() {
        let session = Session::new();
        let waiter = tokio::spawn({
            let session = session.clone();
            async move { session.token().await }
        });
        session.resolve_signed_out();
        assert!(matches!(
            waiter.await.unwrap(),
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn sign_out_drops_identity() {
        let session = Session::signed_in(identity(), Arc::new(StaticIdentity::new("tok")));
        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_signed_in());

        session.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), AuthState::SignedOut);
        assert!(session.token().await.is_err());
        assert!(session.user().is_none());
    }
}
