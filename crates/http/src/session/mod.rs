//! Session lifecycle: startup validation, teardown and observer notifications

mod bootstrap;
mod observer;
mod teardown;

pub use bootstrap::{BootstrapOutcome, SessionBootstrapper};
pub use observer::{NoopObserver, SessionObserver};
pub use teardown::{LogoutScope, SessionTeardown, TeardownReason};
