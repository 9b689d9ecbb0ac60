//! SessionGuard core types and utilities

pub mod error;
pub mod session;
pub mod store;

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(any(test, feature = "tests"))]
pub mod tests;

pub use error::{StoreError, StoreResult};
pub use session::{AccessToken, RefreshToken, Session, TokenPair, User, UserId};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StorageKeys};
