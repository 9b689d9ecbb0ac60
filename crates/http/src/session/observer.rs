use super::TeardownReason;
use sessionguard_core::User;

/// Receives session lifecycle events, e.g. to send the user back to a login prompt
pub trait SessionObserver: Send + Sync {
    /// A session was established by login or restored at startup
    fn on_authenticated(&self, _user: &User) {}

    /// The session was torn down
    fn on_session_ended(&self, reason: TeardownReason);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_session_ended(&self, _reason: TeardownReason) {}
}
