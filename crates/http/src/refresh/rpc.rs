use super::{RefreshError, RefreshStatus};
use sessionguard_core::AccessToken;
use tokio::sync::oneshot;

pub type RefreshOutcome = Result<AccessToken, RefreshError>;

pub enum RefreshRequest {
    AcquireFreshToken {
        /// Access token the failed request carried
        stale: Option<AccessToken>,
        reply: oneshot::Sender<RefreshOutcome>,
    },
    GetStatus {
        reply: oneshot::Sender<RefreshStatus>,
    },
}
