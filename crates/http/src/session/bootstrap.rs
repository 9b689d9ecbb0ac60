use super::{LogoutScope, SessionObserver, SessionTeardown, TeardownReason};
use crate::client::{auth::AuthBackend, error::ClientError};
use crate::refresh::{RefreshCoordinator, RefreshError};
use sessionguard_core::{AccessToken, SessionStore, User};
use std::sync::Arc;

/// What startup found
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// No session was stored
    Unauthenticated,
    /// The stored session is valid (possibly after a refresh)
    Restored(User),
    /// The stored session could not be recovered and was torn down
    Ended(TeardownReason),
}

impl BootstrapOutcome {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Restored(user) => Some(user),
            _ => None,
        }
    }
}

/// Validates a persisted session once at startup.
///
/// The stored access token is verified first. If the server rejects it the
/// token is refreshed through the coordinator and verified again; only when
/// that also fails is the session torn down. A network failure leaves the
/// session in place and is returned as an error.
#[derive(Clone)]
pub struct SessionBootstrapper {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    coordinator: RefreshCoordinator,
    teardown: SessionTeardown,
    observer: Arc<dyn SessionObserver>,
}

impl SessionBootstrapper {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn AuthBackend>,
        coordinator: RefreshCoordinator,
        teardown: SessionTeardown,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            store,
            backend,
            coordinator,
            teardown,
            observer,
        }
    }

    pub async fn run(&self) -> Result<BootstrapOutcome, ClientError> {
        let Some(session) = self.store.load().await? else {
            debug!("No stored session");
            return Ok(BootstrapOutcome::Unauthenticated);
        };

        if let Some(user) = self.verify(&session.access_token, &session.user).await? {
            return self.restore(user).await;
        }

        info!("Stored access token rejected, refreshing");
        let fresh = match self
            .coordinator
            .acquire_fresh_token(Some(session.access_token.clone()))
            .await
        {
            Ok(token) => token,
            Err(RefreshError::NoSession) => {
                debug!("Session ended during bootstrap");
                return Ok(BootstrapOutcome::Unauthenticated);
            }
            Err(e) => {
                return match e.teardown_reason() {
                    // The coordinator has already torn the session down
                    Some(reason) => Ok(BootstrapOutcome::Ended(reason)),
                    None => Err(e.into()),
                };
            }
        };

        if let Some(user) = self.verify(&fresh, &session.user).await? {
            return self.restore(user).await;
        }

        warn!("Refreshed access token failed verification");
        self.teardown
            .run(TeardownReason::VerificationFailed, LogoutScope::Current)
            .await?;
        Ok(BootstrapOutcome::Ended(TeardownReason::VerificationFailed))
    }

    /// The verified user, falling back to `stored` when the server omits it
    async fn verify(
        &self,
        token: &AccessToken,
        stored: &User,
    ) -> Result<Option<User>, ClientError> {
        let response = self.backend.verify(token).await?;
        if !response.valid {
            return Ok(None);
        }
        Ok(Some(response.user.unwrap_or_else(|| stored.clone())))
    }

    async fn restore(&self, user: User) -> Result<BootstrapOutcome, ClientError> {
        let Some(session) = self.store.update_user(user).await? else {
            debug!("Session ended during bootstrap");
            return Ok(BootstrapOutcome::Unauthenticated);
        };

        info!(user = %session.user.id, "Session restored");
        self.observer.on_authenticated(&session.user);
        Ok(BootstrapOutcome::Restored(session.user))
    }
}
