//! In-process session store

use crate::{Session, SessionStore, StoreResult, TokenPair, User};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Session store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> StoreResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: Session) -> StoreResult<()> {
        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn rotate(&self, tokens: TokenPair) -> StoreResult<Option<Session>> {
        let mut guard = self.session.write().await;
        let Some(current) = guard.take() else {
            return Ok(None);
        };
        let rotated = current.rotated(tokens);
        *guard = Some(rotated.clone());
        Ok(Some(rotated))
    }

    async fn update_user(&self, user: User) -> StoreResult<Option<Session>> {
        let mut guard = self.session.write().await;
        Ok(guard.as_mut().map(|session| {
            session.user = user;
            session.clone()
        }))
    }

    async fn clear(&self) -> StoreResult<Option<Session>> {
        Ok(self.session.write().await.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::SessionStoreTestSuite;

    #[tokio::test]
    async fn test_memory_store_suite() {
        SessionStoreTestSuite::new(MemorySessionStore::new())
            .run_all_tests()
            .await
            .unwrap();
    }
}
