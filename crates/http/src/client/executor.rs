//! Request execution
//!
//! The executor reads the access token from the store at the moment a request
//! is built, so a request started after a rotation always carries the rotated
//! token. The token actually sent is returned alongside the response; the
//! refresh coordinator compares it with the store to spot stale failures.

use super::{error::ClientError, request::RequestDescriptor};
use reqwest::{Client, header};
use sessionguard_core::{AccessToken, SessionStore};
use std::sync::Arc;

/// Response plus the access token it was sent with
#[derive(Debug)]
pub struct Executed {
    pub response: reqwest::Response,
    pub token: Option<AccessToken>,
}

#[derive(Clone)]
pub struct RequestExecutor {
    client: Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
}

impl RequestExecutor {
    pub fn new(client: Client, base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send with whatever access token the store holds right now
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<Executed, ClientError> {
        let token = self.store.access_token().await?;
        self.execute_with_token(request, token).await
    }

    /// Send with an explicit access token, or none
    pub async fn execute_with_token(
        &self,
        request: &RequestDescriptor,
        token: Option<AccessToken>,
    ) -> Result<Executed, ClientError> {
        let mut builder = self
            .client
            .request(request.method().clone(), self.url(request.path()))
            .headers(request.headers().clone());

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(token) = &token {
            builder = builder.header(header::AUTHORIZATION, token.bearer());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        trace!(
            method = %request.method(),
            path = request.path(),
            replay = request.is_replay(),
            authenticated = token.is_some(),
            "Sending request"
        );

        let response = builder.send().await?;
        debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status().as_u16(),
            "Received response"
        );

        Ok(Executed { response, token })
    }
}
