//! SessionGuard HTTP client
//!
//! Keeps outbound requests authenticated against a backend that issues
//! short-lived access tokens and rotating refresh tokens. Callers hand a
//! [`RequestDescriptor`] to [`SessionClient::send`]; expired access tokens are
//! refreshed behind their back, with concurrent failures sharing a single
//! refresh exchange.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod refresh;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{
    ClientConfig, SessionClient, SessionClientBuilder,
    auth::{AuthApi, AuthBackend},
    classify::{FailureClassifier, FailureKind},
    config::AuthPaths,
    error::ClientError,
    executor::{Executed, RequestExecutor},
    request::RequestDescriptor,
};
pub use refresh::{RefreshCoordinator, RefreshError, RefreshStatus};
pub use session::{
    BootstrapOutcome, LogoutScope, NoopObserver, SessionBootstrapper, SessionObserver,
    SessionTeardown, TeardownReason,
};

pub use reqwest::{Method, StatusCode};
pub use sessionguard_core::{AccessToken, RefreshToken, Session, SessionStore, TokenPair, User};
