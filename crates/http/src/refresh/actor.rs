use super::rpc::{RefreshOutcome, RefreshRequest};
use super::{RefreshError, RefreshStatus};
use crate::client::{auth::AuthBackend, classify::classify_refresh_failure};
use crate::session::{LogoutScope, SessionTeardown, TeardownReason};
use futures::future::{BoxFuture, OptionFuture};
use sessionguard_core::{AccessToken, RefreshToken, Session, SessionStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Round = BoxFuture<'static, RefreshOutcome>;

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Owns the refresh state. At most one exchange is in flight; callers that
/// arrive while it runs are parked as waiters and all receive its outcome.
pub struct RefreshActor {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    teardown: SessionTeardown,
    rx: mpsc::Receiver<RefreshRequest>,
    state: RefreshState,
    rounds: u64,
    /// Access token of the last session a round tore down, with the error it ended on
    ended: Option<(AccessToken, RefreshError)>,
}

impl RefreshActor {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn AuthBackend>,
        teardown: SessionTeardown,
        rx: mpsc::Receiver<RefreshRequest>,
    ) -> Self {
        Self {
            store,
            backend,
            teardown,
            rx,
            state: RefreshState::Idle,
            rounds: 0,
            ended: None,
        }
    }

    pub async fn run(mut self) {
        let mut in_flight: Option<Round> = None;

        loop {
            tokio::select! {
                Some(outcome) = OptionFuture::from(in_flight.as_mut()) => {
                    in_flight = None;
                    self.settle(outcome).await;
                }
                request = self.rx.recv() => match request {
                    Some(request) => {
                        if let Some(round) = self.handle(request).await {
                            in_flight = Some(round);
                        }
                    }
                    None => break,
                },
            }
        }

        // Every handle is gone; let a running round finish so the store is left consistent
        if let Some(round) = in_flight {
            let outcome = round.await;
            self.settle(outcome).await;
        }
        debug!("Refresh coordinator stopped");
    }

    async fn handle(&mut self, request: RefreshRequest) -> Option<Round> {
        match request {
            RefreshRequest::GetStatus { reply } => {
                let _ = reply.send(self.status());
                None
            }
            RefreshRequest::AcquireFreshToken { stale, reply } => match &mut self.state {
                RefreshState::Refreshing { waiters } => {
                    waiters.push(reply);
                    debug!(waiting = waiters.len(), "Joining in-flight refresh");
                    None
                }
                RefreshState::Idle => self.start_round(stale, reply).await,
            },
        }
    }

    async fn start_round(
        &mut self,
        stale: Option<AccessToken>,
        reply: oneshot::Sender<RefreshOutcome>,
    ) -> Option<Round> {
        let session = match self.store.load().await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to read session before refresh: {e}");
                let _ = reply.send(Err(RefreshError::Storage(e.to_string())));
                return None;
            }
        };

        let Some(session) = session else {
            // A caller that failed with the token an earlier round tore down
            // gets the same error as that round's waiters
            let error = self
                .ended
                .as_ref()
                .filter(|(token, _)| stale.as_ref() == Some(token))
                .map_or(RefreshError::NoSession, |(_, error)| error.clone());
            debug!("No session to refresh: {error}");

            let ended = self.end_session(TeardownReason::NoSession).await;
            let _ = reply.send(Err(error));
            self.revoke(ended);
            return None;
        };

        if stale.as_ref() != Some(&session.access_token) {
            // Another round already rotated past the token that failed
            debug!("Access token changed since the request was sent, reusing it");
            let _ = reply.send(Ok(session.access_token));
            return None;
        }

        self.rounds += 1;
        self.state = RefreshState::Refreshing {
            waiters: vec![reply],
        };
        info!(round = self.rounds, "Refreshing access token");

        Some(Box::pin(exchange(
            self.store.clone(),
            self.backend.clone(),
            session.refresh_token,
        )))
    }

    async fn settle(&mut self, outcome: RefreshOutcome) {
        let waiters = match std::mem::replace(&mut self.state, RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };

        let mut ended = None;
        match &outcome {
            Ok(_) => {
                self.ended = None;
                info!(
                    round = self.rounds,
                    waiters = waiters.len(),
                    "Access token refreshed"
                );
            }
            Err(e) => {
                warn!(round = self.rounds, waiters = waiters.len(), "Refresh failed: {e}");
                if let Some(reason) = e.teardown_reason() {
                    ended = self.end_session(reason).await;
                    if let Some(session) = &ended {
                        self.ended = Some((session.access_token.clone(), e.clone()));
                    }
                }
            }
        }

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        self.revoke(ended);
    }

    /// Clear the store and notify the observer; the server is not contacted
    async fn end_session(&self, reason: TeardownReason) -> Option<Session> {
        match self.teardown.end(reason).await {
            Ok(session) => session,
            Err(e) => {
                error!(?reason, "Failed to tear down session: {e}");
                None
            }
        }
    }

    fn revoke(&self, ended: Option<Session>) {
        if let Some(session) = ended {
            self.teardown.revoke_in_background(session, LogoutScope::Current);
        }
    }

    fn status(&self) -> RefreshStatus {
        let waiting = match &self.state {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        };

        RefreshStatus {
            refreshing: waiting > 0,
            waiting,
            rounds: self.rounds,
        }
    }
}

/// One refresh exchange: trade the refresh token, then persist the new pair
async fn exchange(
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    refresh_token: RefreshToken,
) -> RefreshOutcome {
    let tokens = backend
        .refresh(&refresh_token)
        .await
        .map_err(|e| {
            debug!("Refresh exchange failed: {e}");
            classify_refresh_failure(&e)
        })?;

    match store.rotate(tokens).await {
        Ok(Some(session)) => Ok(session.access_token),
        Ok(None) => {
            warn!("Session ended while refreshing, discarding rotated tokens");
            Err(RefreshError::NoSession)
        }
        Err(e) => {
            error!("Failed to persist rotated tokens: {e}");
            Err(RefreshError::Storage(e.to_string()))
        }
    }
}
