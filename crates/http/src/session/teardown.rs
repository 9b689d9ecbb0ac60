use super::SessionObserver;
use crate::client::auth::AuthBackend;
use sessionguard_core::{Session, SessionStore, StoreError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long a server-side revocation may take before it is abandoned
pub const REVOKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// The user signed out
    Logout,
    /// The server refused the refresh token
    RefreshRejected,
    /// A refresh was needed but no session existed
    NoSession,
    /// Even a freshly refreshed token failed verification at startup
    VerificationFailed,
    /// Rotated tokens could not be persisted
    StorageFailure,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Logout => "signed out",
            Self::RefreshRejected => "session expired",
            Self::NoSession => "no session",
            Self::VerificationFailed => "session could not be verified",
            Self::StorageFailure => "session could not be saved",
        };
        f.write_str(reason)
    }
}

/// Which server-side sessions a logout revokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoutScope {
    #[default]
    Current,
    All,
}

/// Ends the session: clears the store, revokes on the server, notifies the observer.
///
/// Idempotent; a run against an empty store does nothing.
#[derive(Clone)]
pub struct SessionTeardown {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    observer: Arc<dyn SessionObserver>,
}

impl SessionTeardown {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn AuthBackend>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            store,
            backend,
            observer,
        }
    }

    /// Returns whether a session was actually torn down
    pub async fn run(&self, reason: TeardownReason, scope: LogoutScope) -> Result<bool, StoreError> {
        let Some(session) = self.end(reason).await? else {
            return Ok(false);
        };

        self.revoke(&session, scope).await;
        Ok(true)
    }

    /// Clear the store and notify the observer. Revocation is left to the caller.
    ///
    /// Returns the session that was ended, if there was one.
    pub async fn end(&self, reason: TeardownReason) -> Result<Option<Session>, StoreError> {
        let Some(session) = self.store.clear().await? else {
            debug!(?reason, "No session to tear down");
            return Ok(None);
        };

        info!(?reason, user = %session.user.id, "Ending session");
        self.observer.on_session_ended(reason);
        Ok(Some(session))
    }

    /// Ask the server to revoke `session`, giving up after [`REVOKE_TIMEOUT`]
    pub async fn revoke(&self, session: &Session, scope: LogoutScope) {
        // Local state is already gone; a failed revocation only leaves a token
        // for the server to expire on its own
        match tokio::time::timeout(REVOKE_TIMEOUT, self.backend.logout(session, scope)).await {
            Ok(Ok(())) => debug!(?scope, "Session revoked on server"),
            Ok(Err(e)) => warn!("Failed to revoke session on server: {e}"),
            Err(_) => warn!(timeout = ?REVOKE_TIMEOUT, "Gave up revoking session on server"),
        }
    }

    /// Revoke on a separate task so the caller never waits on the server
    pub fn revoke_in_background(&self, session: Session, scope: LogoutScope) {
        let teardown = self.clone();
        tokio::spawn(async move { teardown.revoke(&session, scope).await });
    }
}
