//! SessionGuard HTTP client

pub mod auth;
pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod request;

pub use config::ClientConfig;

use crate::refresh::{RefreshCoordinator, RefreshStatus};
use crate::session::{
    BootstrapOutcome, LogoutScope, NoopObserver, SessionBootstrapper, SessionObserver,
    SessionTeardown, TeardownReason,
};
use crate::types::LoginRequest;
use auth::{AuthApi, AuthBackend};
use classify::{FailureClassifier, FailureKind};
use config::{AuthPaths, DEFAULT_USER_AGENT};
use error::{ClientError, response_message};
use executor::RequestExecutor;
use request::RequestDescriptor;
use reqwest::{Client, ClientBuilder};
use serde::{Serialize, de::DeserializeOwned};
use sessionguard_core::{MemorySessionStore, Session, SessionStore, User};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client that keeps its requests authenticated.
///
/// Cloning is cheap; clones share the store and the refresh coordinator.
#[derive(Clone)]
pub struct SessionClient {
    base_url: String,
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    observer: Arc<dyn SessionObserver>,
    executor: RequestExecutor,
    classifier: FailureClassifier,
    coordinator: RefreshCoordinator,
    teardown: SessionTeardown,
    bootstrapper: SessionBootstrapper,
}

impl SessionClient {
    /// Create a client with an in-memory session store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    /// Build a client from configuration and a session store
    pub fn from_config(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(config.base_url)
            .user_agent(config.user_agent)
            .paths(config.paths)
            .store(store);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub async fn refresh_status(&self) -> Result<RefreshStatus, ClientError> {
        Ok(self.coordinator.status().await?)
    }

    /// Send a request, refreshing the access token and replaying once if it was rejected
    #[tracing::instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn send(&self, request: RequestDescriptor) -> Result<reqwest::Response, ClientError> {
        let first = self.executor.execute(&request).await?;
        let status = first.response.status();
        if status.is_success() {
            return Ok(first.response);
        }

        if self.classifier.classify(&request, status) != FailureKind::Retryable {
            return Err(self.failure(&request, first.response).await);
        }

        debug!("Access token rejected, acquiring a fresh one");
        let token = self.coordinator.acquire_fresh_token(first.token).await?;

        let replay = request.as_replay();
        let second = self.executor.execute_with_token(&replay, Some(token)).await?;
        if second.response.status().is_success() {
            return Ok(second.response);
        }

        Err(self.failure(&replay, second.response).await)
    }

    /// Send a request and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send_json(RequestDescriptor::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(RequestDescriptor::post(path).json(body)?).await
    }

    async fn failure(&self, request: &RequestDescriptor, response: reqwest::Response) -> ClientError {
        let status = response.status();
        let message = response_message(response).await;

        match self.classifier.classify(request, status) {
            FailureKind::FatalUnauthorized => {
                warn!(path = request.path(), "Request still unauthorized after refresh");
                ClientError::AuthenticationFailed(message)
            }
            FailureKind::AccountLocked => ClientError::AccountLocked(message),
            FailureKind::Retryable | FailureKind::Unrelated => {
                ClientError::from_status(status, message)
            }
        }
    }

    /// Sign in and persist the new session
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, ClientError> {
        let request = LoginRequest {
            username: username.into(),
            password: password.into(),
        };
        let session = Session::from(self.backend.login(&request).await?);
        self.store.save(session.clone()).await?;

        info!(user = %session.user.id, "Signed in");
        self.observer.on_authenticated(&session.user);
        Ok(session.user)
    }

    /// Sign out. Returns whether there was a session to end.
    pub async fn logout(&self, scope: LogoutScope) -> Result<bool, ClientError> {
        Ok(self.teardown.run(TeardownReason::Logout, scope).await?)
    }

    /// Validate the persisted session; call once at startup
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, ClientError> {
        self.bootstrapper.run().await
    }

    pub async fn current_user(&self) -> Result<Option<User>, ClientError> {
        Ok(self.store.load().await?.map(|session| session.user))
    }

    pub async fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.store.load().await?.is_some())
    }
}

/// Builder for SessionClient
#[derive(Default)]
pub struct SessionClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    paths: Option<AuthPaths>,
    store: Option<Arc<dyn SessionStore>>,
    observer: Option<Arc<dyn SessionObserver>>,
    backend: Option<Arc<dyn AuthBackend>>,
}

impl SessionClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the authentication endpoint paths
    pub fn paths(mut self, paths: AuthPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Where the session lives; defaults to an in-memory store
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the HTTP implementation of the authentication endpoints
    pub fn backend(mut self, backend: Arc<dyn AuthBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the client.
    ///
    /// Spawns the refresh coordinator, so this must run inside a Tokio runtime.
    pub fn build(self) -> Result<SessionClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url}: {e}")))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ClientError::Configuration(
                "SessionClient must be built inside a Tokio runtime".into(),
            ));
        }

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder =
            client_builder.user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        let client: Client = client_builder.build()?;
        let paths = self.paths.unwrap_or_default();

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));
        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopObserver));
        let backend = self.backend.unwrap_or_else(|| {
            Arc::new(AuthApi::new(client.clone(), base_url.clone(), paths.clone()))
        });

        let teardown = SessionTeardown::new(store.clone(), backend.clone(), observer.clone());
        let coordinator =
            RefreshCoordinator::spawn(store.clone(), backend.clone(), teardown.clone());
        let bootstrapper = SessionBootstrapper::new(
            store.clone(),
            backend.clone(),
            coordinator.clone(),
            teardown.clone(),
            observer.clone(),
        );

        Ok(SessionClient {
            executor: RequestExecutor::new(client, base_url.clone(), store.clone()),
            classifier: FailureClassifier::new(paths),
            base_url,
            store,
            backend,
            observer,
            coordinator,
            teardown,
            bootstrapper,
        })
    }
}
