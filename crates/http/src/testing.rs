//! Fakes shared by the unit tests

use crate::client::{auth::AuthBackend, error::ClientError};
use crate::session::{LogoutScope, SessionObserver, TeardownReason};
use crate::types::{LoginRequest, LoginResponse, VerifyResponse};
use async_trait::async_trait;
use sessionguard_core::{AccessToken, RefreshToken, Session, TokenPair, User};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

type RefreshScript = Box<dyn Fn() -> Result<TokenPair, ClientError> + Send + Sync>;

/// Backend whose refresh answers come from a closure, optionally held back
/// until [`ScriptedBackend::release`] is called
pub struct ScriptedBackend {
    script: RefreshScript,
    gate: Option<Semaphore>,
    logout_delay: Option<Duration>,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(
        script: impl Fn() -> Result<TokenPair, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            gate: None,
            logout_delay: None,
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(
        script: impl Fn() -> Result<TokenPair, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(script)
        }
    }

    /// Issues `access-N` / `refresh-N` with a new N on every call
    pub fn rotating() -> Self {
        let generation = AtomicUsize::new(1);
        Self::new(move || {
            let n = generation.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TokenPair::new(format!("access-{n}"), format!("refresh-{n}")))
        })
    }

    /// Logout calls hang for `delay` before succeeding
    pub fn with_slow_logout(mut self, delay: Duration) -> Self {
        self.logout_delay = Some(delay);
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        Err(ClientError::Configuration("login is not scripted".into()))
    }

    async fn refresh(&self, _refresh_token: &RefreshToken) -> Result<TokenPair, ClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| ClientError::Configuration(e.to_string()))?;
        }
        (self.script)()
    }

    async fn verify(&self, _access_token: &AccessToken) -> Result<VerifyResponse, ClientError> {
        Ok(VerifyResponse::invalid())
    }

    async fn logout(&self, _session: &Session, _scope: LogoutScope) -> Result<(), ClientError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.logout_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

/// Observer that remembers every notification
#[derive(Default)]
pub struct RecordingObserver {
    ended: Mutex<Vec<TeardownReason>>,
    authenticated: Mutex<Vec<User>>,
}

impl RecordingObserver {
    pub fn ended(&self) -> Vec<TeardownReason> {
        self.ended.lock().unwrap().clone()
    }

    pub fn authenticated(&self) -> Vec<User> {
        self.authenticated.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_authenticated(&self, user: &User) {
        self.authenticated.lock().unwrap().push(user.clone());
    }

    fn on_session_ended(&self, reason: TeardownReason) {
        self.ended.lock().unwrap().push(reason);
    }
}
