use sessionguard_http::{SessionObserver, TeardownReason, User};
use std::sync::OnceLock;
use tracing::info;

/// Remembers why the session ended so `main` can tell the user what to do
#[derive(Debug, Default)]
pub struct TerminalObserver {
    ended: OnceLock<TeardownReason>,
}

impl TerminalObserver {
    pub fn ended(&self) -> Option<TeardownReason> {
        self.ended.get().copied()
    }

    /// Whether the session ended for any reason other than an explicit logout
    pub fn session_expired(&self) -> bool {
        self.ended()
            .is_some_and(|reason| reason != TeardownReason::Logout)
    }
}

impl SessionObserver for TerminalObserver {
    fn on_authenticated(&self, user: &User) {
        info!(user = %user.id, "Authenticated");
    }

    fn on_session_ended(&self, reason: TeardownReason) {
        info!(%reason, "Session ended");
        let _ = self.ended.set(reason);
    }
}
