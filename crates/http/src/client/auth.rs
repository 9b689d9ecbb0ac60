//! Authentication endpoints
//!
//! [`AuthBackend`] is the seam between session management and the wire: the
//! refresh coordinator, bootstrap and teardown only ever talk to the server
//! through it. [`AuthApi`] is the reqwest implementation.

use super::{config::AuthPaths, error::ClientError};
use crate::session::LogoutScope;
use crate::types::{LoginRequest, LoginResponse, LogoutRequest, RefreshRequest, VerifyResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header};
use serde::de::DeserializeOwned;
use sessionguard_core::{AccessToken, RefreshToken, Session, TokenPair};

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;

    /// Exchange a refresh token for a new pair. No access token is attached.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenPair, ClientError>;

    /// Ask the server whether an access token is still good
    async fn verify(&self, access_token: &AccessToken) -> Result<VerifyResponse, ClientError>;

    /// Revoke the session on the server
    async fn logout(&self, session: &Session, scope: LogoutScope) -> Result<(), ClientError>;
}

/// HTTP implementation of [`AuthBackend`]
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    base_url: String,
    paths: AuthPaths,
}

impl AuthApi {
    pub fn new(client: Client, base_url: impl Into<String>, paths: AuthPaths) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            paths,
        }
    }

    pub fn paths(&self) -> &AuthPaths {
        &self.paths
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    #[tracing::instrument(skip_all)]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let req = self.request(Method::POST, &self.paths.login).json(request);
        self.execute(req).await
    }

    #[tracing::instrument(skip_all)]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenPair, ClientError> {
        let req = self
            .request(Method::POST, &self.paths.refresh)
            .json(&RefreshRequest {
                refresh_token: refresh_token.as_str().to_string(),
            });
        self.execute(req).await
    }

    #[tracing::instrument(skip_all)]
    async fn verify(&self, access_token: &AccessToken) -> Result<VerifyResponse, ClientError> {
        let response = self
            .request(Method::GET, &self.paths.verify)
            .header(header::AUTHORIZATION, access_token.bearer())
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Ok(VerifyResponse::invalid());
        }
        if !status.is_success() {
            return Err(ClientError::from_response(response).await);
        }

        Ok(response.json().await?)
    }

    #[tracing::instrument(skip_all)]
    async fn logout(&self, session: &Session, scope: LogoutScope) -> Result<(), ClientError> {
        let response = self
            .request(Method::POST, &self.paths.logout)
            .header(header::AUTHORIZATION, session.access_token.bearer())
            .json(&LogoutRequest {
                refresh_token: session.refresh_token.as_str().to_string(),
                logout_all: scope == LogoutScope::All,
            })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::from_response(response).await)
        }
    }
}
