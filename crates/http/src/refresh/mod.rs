//! Single-flight token refresh
//!
//! Every request that fails with an expired access token asks the
//! [`RefreshCoordinator`] for a fresh one. The coordinator is a handle to an
//! actor task that owns the refresh state, so "is a refresh running?" and
//! "join it" happen in one step and concurrent failures share one exchange.

pub mod actor;
pub mod rpc;

use self::actor::RefreshActor;
use self::rpc::RefreshRequest;
use crate::client::auth::AuthBackend;
use crate::session::{SessionTeardown, TeardownReason};
use sessionguard_core::{AccessToken, SessionStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

const REQUEST_BUFFER: usize = 64;

/// Outcome of a failed refresh, shared by every caller waiting on it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// Nothing to refresh; the user has to sign in
    #[error("no active session, please sign in")]
    NoSession,

    /// The server refused the refresh token
    #[error("session expired, please re-authenticate")]
    Rejected,

    /// The refresh endpoint could not be reached; the session is kept
    #[error("refresh endpoint unavailable: {0}")]
    NetworkUnavailable(String),

    /// The rotated tokens could not be persisted
    #[error("failed to persist rotated session: {0}")]
    Storage(String),

    /// The coordinator task is gone
    #[error("refresh coordinator has shut down")]
    CoordinatorClosed,
}

impl RefreshError {
    /// Whether the session has been (or must be) torn down
    pub fn is_session_fatal(&self) -> bool {
        self.teardown_reason().is_some()
    }

    pub fn teardown_reason(&self) -> Option<TeardownReason> {
        match self {
            Self::NoSession => Some(TeardownReason::NoSession),
            Self::Rejected => Some(TeardownReason::RefreshRejected),
            Self::Storage(_) => Some(TeardownReason::StorageFailure),
            Self::NetworkUnavailable(_) | Self::CoordinatorClosed => None,
        }
    }
}

impl From<mpsc::error::SendError<RefreshRequest>> for RefreshError {
    fn from(_: mpsc::error::SendError<RefreshRequest>) -> Self {
        Self::CoordinatorClosed
    }
}

impl From<oneshot::error::RecvError> for RefreshError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::CoordinatorClosed
    }
}

/// Snapshot of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshStatus {
    pub refreshing: bool,
    /// Callers waiting on the running exchange, including the one that started it
    pub waiting: usize,
    /// Exchanges started since the coordinator was spawned
    pub rounds: u64,
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    tx: mpsc::Sender<RefreshRequest>,
}

impl RefreshCoordinator {
    /// Spawn the coordinator task on the current Tokio runtime.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn AuthBackend>,
        teardown: SessionTeardown,
    ) -> Self {
        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);
        let actor = RefreshActor::new(store, backend, teardown, rx);
        tokio::spawn(actor.run());
        Self { tx }
    }

    /// Get an access token newer than `stale`.
    ///
    /// Starts an exchange if none is running, or waits for the running one.
    /// When the store already holds a different token than `stale`, that
    /// token is returned without contacting the server.
    pub async fn acquire_fresh_token(
        &self,
        stale: Option<AccessToken>,
    ) -> Result<AccessToken, RefreshError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RefreshRequest::AcquireFreshToken { stale, reply })
            .await?;
        rx.await?
    }

    pub async fn status(&self) -> Result<RefreshStatus, RefreshError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RefreshRequest::GetStatus { reply }).await?;
        Ok(rx.await?)
    }
}
