//! Client error types

use crate::refresh::RefreshError;
use sessionguard_core::StoreError;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed and could not be recovered by a refresh
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Account locked by the server (HTTP 423)
    #[error("Account locked: {0}")]
    AccountLocked(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The access token could not be renewed
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// The session store failed
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            423 => Self::AccountLocked(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Consume an unsuccessful response into an error, using its body as the message
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let message = response_message(response).await;
        Self::from_status(status, message)
    }

    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|status| status.as_u16()),
            Self::ServerError { status, .. } => Some(*status),
            Self::AuthenticationFailed(_) => Some(401),
            Self::AccountLocked(_) => Some(423),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Forbidden(_) => Some(403),
            _ => None,
        }
    }

    /// Whether the server could not be reached at all
    pub fn is_network(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Refresh(RefreshError::NetworkUnavailable(_)) => true,
            _ => false,
        }
    }

    /// Whether the session is gone and the user has to sign in again
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Refresh(e) if e.is_session_fatal())
    }
}

/// Response body as text, falling back to the status line
pub(crate) async fn response_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => status.to_string(),
    }
}
