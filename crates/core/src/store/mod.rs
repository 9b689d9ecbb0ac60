//! Durable holder of the current session
//!
//! Every implementation guards the whole [`Session`] behind one lock so the
//! token pair is always replaced as a unit: a reader never sees a refresh token
//! from one rotation next to an access token from another.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::{AccessToken, Session, StoreResult, TokenPair, User};
use async_trait::async_trait;

/// Fixed key names of the persisted session document
pub struct StorageKeys;

impl StorageKeys {
    pub const ACCESS_TOKEN: &'static str = "accessToken";
    pub const REFRESH_TOKEN: &'static str = "refreshToken";
    pub const USER: &'static str = "user";
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot of the current session
    async fn load(&self) -> StoreResult<Option<Session>>;

    /// Access token to attach to a request being built right now
    async fn access_token(&self) -> StoreResult<Option<AccessToken>> {
        Ok(self.load().await?.map(|session| session.access_token))
    }

    /// Replace the session wholesale
    async fn save(&self, session: Session) -> StoreResult<()>;

    /// Swap in a freshly rotated token pair.
    ///
    /// Returns `None` without writing anything when no session exists, so a
    /// rotation finishing after a teardown cannot bring the session back.
    async fn rotate(&self, tokens: TokenPair) -> StoreResult<Option<Session>>;

    /// Replace the stored user record, keeping the tokens
    async fn update_user(&self, user: User) -> StoreResult<Option<Session>>;

    /// Remove the session, returning what was stored
    async fn clear(&self) -> StoreResult<Option<Session>>;
}

// Mock implementation for testing
#[cfg(any(test, feature = "tests"))]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub SessionStore {}

        #[async_trait]
        impl SessionStore for SessionStore {
            async fn load(&self) -> StoreResult<Option<Session>>;
            async fn access_token(&self) -> StoreResult<Option<AccessToken>>;
            async fn save(&self, session: Session) -> StoreResult<()>;
            async fn rotate(&self, tokens: TokenPair) -> StoreResult<Option<Session>>;
            async fn update_user(&self, user: User) -> StoreResult<Option<Session>>;
            async fn clear(&self) -> StoreResult<Option<Session>>;
        }
    }
}
