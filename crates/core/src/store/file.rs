//! File-backed session store
//!
//! The session is kept as one small JSON document with the fixed keys from
//! [`StorageKeys`]. Every write goes to a temporary file that is then renamed
//! over the document, so a crash mid-write leaves either the old or the new
//! session on disk.

use crate::{Session, SessionStore, StorageKeys, StoreError, StoreResult, TokenPair, User};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Session store persisted to a JSON file
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    session: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Open the store, loading any session already persisted at `path`.
    ///
    /// A document that is unreadable as JSON or that lacks one of the session
    /// keys is discarded: partial sessions are never restored.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let session = match read_document(&path).await? {
            Some(document) => match parse_document(document) {
                Ok(session) => session,
                Err(e) => {
                    warn!(path = %path.display(), "Discarding unusable session document: {e}");
                    remove_document(&path).await?;
                    None
                }
            },
            None => None,
        };

        debug!(
            path = %path.display(),
            restored = session.is_some(),
            "Opened session store"
        );

        Ok(Self {
            path,
            session: RwLock::new(session),
        })
    }

    /// Location of the session document
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, session: &Session) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut document = Map::new();
        document.insert(
            StorageKeys::ACCESS_TOKEN.to_string(),
            Value::String(session.access_token.as_str().to_string()),
        );
        document.insert(
            StorageKeys::REFRESH_TOKEN.to_string(),
            Value::String(session.refresh_token.as_str().to_string()),
        );
        document.insert(
            StorageKeys::USER.to_string(),
            serde_json::to_value(&session.user)?,
        );
        let bytes = serde_json::to_vec_pretty(&Value::Object(document))?;

        let tmp_path = self.path.with_extension("tmp");
        let mut options = fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

async fn read_document(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io_error(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

async fn remove_document(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io_error(format!(
            "failed to remove {}: {e}",
            path.display()
        ))),
    }
}

fn parse_document(bytes: Vec<u8>) -> StoreResult<Option<Session>> {
    let mut document: Map<String, Value> = serde_json::from_slice(&bytes)?;

    let keys = [
        StorageKeys::ACCESS_TOKEN,
        StorageKeys::REFRESH_TOKEN,
        StorageKeys::USER,
    ];
    let present = keys.iter().filter(|key| document.contains_key(**key)).count();
    if present == 0 {
        return Ok(None);
    }
    if present < keys.len() {
        return Err(StoreError::serialization_error(
            "session document is missing required keys",
        ));
    }

    let access_token = document.remove(StorageKeys::ACCESS_TOKEN).unwrap_or_default();
    let refresh_token = document.remove(StorageKeys::REFRESH_TOKEN).unwrap_or_default();
    let user = document.remove(StorageKeys::USER).unwrap_or_default();

    Ok(Some(Session {
        access_token: serde_json::from_value(access_token)?,
        refresh_token: serde_json::from_value(refresh_token)?,
        user: serde_json::from_value(user)?,
    }))
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> StoreResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: Session) -> StoreResult<()> {
        let mut guard = self.session.write().await;
        self.persist(&session).await?;
        *guard = Some(session);
        Ok(())
    }

    async fn rotate(&self, tokens: TokenPair) -> StoreResult<Option<Session>> {
        let mut guard = self.session.write().await;
        let Some(current) = guard.as_ref() else {
            return Ok(None);
        };
        let rotated = current.clone().rotated(tokens);
        self.persist(&rotated).await?;
        *guard = Some(rotated.clone());
        Ok(Some(rotated))
    }

    async fn update_user(&self, user: User) -> StoreResult<Option<Session>> {
        let mut guard = self.session.write().await;
        let Some(current) = guard.as_ref() else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.user = user;
        self.persist(&updated).await?;
        *guard = Some(updated.clone());
        Ok(Some(updated))
    }

    async fn clear(&self) -> StoreResult<Option<Session>> {
        let mut guard = self.session.write().await;
        // The document goes first so a failed removal leaves memory and disk in step
        remove_document(&self.path).await?;
        Ok(guard.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{SessionStoreTestSuite, sample_session};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_suite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::open(temp_dir.path().join("session.json"))
            .await
            .unwrap();

        SessionStoreTestSuite::new(store)
            .run_all_tests()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path).await.unwrap();
        store.save(sample_session(1)).await.unwrap();
        store
            .rotate(TokenPair::new("access-2", "refresh-2"))
            .await
            .unwrap();
        drop(store);

        let reopened = FileSessionStore::open(&path).await.unwrap();
        let session = reopened.load().await.unwrap().unwrap();
        assert_eq!(session.access_token.as_str(), "access-2");
        assert_eq!(session.refresh_token.as_str(), "refresh-2");
        assert_eq!(session.user, sample_session(1).user);
    }

    #[tokio::test]
    async fn test_document_uses_fixed_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let store = FileSessionStore::open(&path).await.unwrap();
        store.save(sample_session(1)).await.unwrap();

        let raw: Map<String, Value> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["accessToken"], "access-1");
        assert_eq!(raw["refreshToken"], "refresh-1");
        assert_eq!(raw["user"]["id"], "user-1");
    }

    #[tokio::test]
    async fn test_partial_document_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, r#"{"accessToken": "orphan"}"#).unwrap();

        let store = FileSessionStore::open(&path).await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_garbage_document_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::open(&path).await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let store = FileSessionStore::open(&path).await.unwrap();
        store.save(sample_session(1)).await.unwrap();
        assert!(path.exists());

        store.clear().await.unwrap();
        assert!(!path.exists());

        let reopened = FileSessionStore::open(&path).await.unwrap();
        assert!(reopened.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_session() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let store = FileSessionStore::open(&path).await.unwrap();
        store.save(sample_session(1)).await.unwrap();

        // A directory in place of the document cannot be removed as a file
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        assert!(store.clear().await.is_err());
        assert_eq!(store.load().await.unwrap(), Some(sample_session(1)));
    }
}
