//! Failure classification
//!
//! Decides what an unsuccessful response means for the session. Only a 401 on
//! a first attempt against an ordinary endpoint is worth a refresh; everything
//! else is handed back to the caller.

use super::{config::AuthPaths, error::ClientError, request::RequestDescriptor};
use crate::refresh::RefreshError;
use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Access token rejected; refresh and replay once
    Retryable,
    /// 401 that a refresh cannot fix: the refresh endpoint itself, or a replay
    FatalUnauthorized,
    /// The account is locked (423)
    AccountLocked,
    /// Not a session problem
    Unrelated,
}

#[derive(Debug, Clone)]
pub struct FailureClassifier {
    paths: AuthPaths,
}

impl FailureClassifier {
    pub fn new(paths: AuthPaths) -> Self {
        Self { paths }
    }

    pub fn classify(&self, request: &RequestDescriptor, status: StatusCode) -> FailureKind {
        match status {
            StatusCode::UNAUTHORIZED => {
                let path = request.path();
                if self.paths.is_refresh(path) || request.is_replay() {
                    FailureKind::FatalUnauthorized
                } else if self.paths.is_credential_exchange(path) {
                    // Wrong credentials, not an expired token
                    FailureKind::Unrelated
                } else {
                    FailureKind::Retryable
                }
            }
            StatusCode::LOCKED => FailureKind::AccountLocked,
            _ => FailureKind::Unrelated,
        }
    }
}

/// Map a failed refresh exchange onto the outcome shared with every waiter.
///
/// Only transport failures, timeouts and 5xx responses keep the session; a
/// rejection or an unreadable success body means the refresh token is unusable.
pub fn classify_refresh_failure(error: &ClientError) -> RefreshError {
    match error {
        ClientError::Request(e) if e.is_decode() => RefreshError::Rejected,
        ClientError::Request(e) => RefreshError::NetworkUnavailable(e.to_string()),
        ClientError::ServerError { status, message } if *status >= 500 => {
            RefreshError::NetworkUnavailable(format!("server returned {status}: {message}"))
        }
        ClientError::Store(e) => RefreshError::Storage(e.to_string()),
        ClientError::Refresh(e) => e.clone(),
        _ => RefreshError::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FailureClassifier {
        FailureClassifier::new(AuthPaths::default())
    }

    #[test]
    fn test_first_401_is_retryable() {
        let request = RequestDescriptor::get("/products");
        assert_eq!(
            classifier().classify(&request, StatusCode::UNAUTHORIZED),
            FailureKind::Retryable
        );
    }

    #[test]
    fn test_replayed_401_is_fatal() {
        let request = RequestDescriptor::get("/products").as_replay();
        assert_eq!(
            classifier().classify(&request, StatusCode::UNAUTHORIZED),
            FailureKind::FatalUnauthorized
        );
    }

    #[test]
    fn test_refresh_endpoint_401_is_fatal_even_with_query() {
        let request = RequestDescriptor::post("/auth/refresh?reason=expired");
        assert_eq!(
            classifier().classify(&request, StatusCode::UNAUTHORIZED),
            FailureKind::FatalUnauthorized
        );
    }

    #[test]
    fn test_login_401_is_not_a_session_failure() {
        let request = RequestDescriptor::post("/auth/login");
        assert_eq!(
            classifier().classify(&request, StatusCode::UNAUTHORIZED),
            FailureKind::Unrelated
        );
    }

    #[test]
    fn test_423_and_other_statuses() {
        let request = RequestDescriptor::get("/products");
        assert_eq!(
            classifier().classify(&request, StatusCode::LOCKED),
            FailureKind::AccountLocked
        );
        assert_eq!(
            classifier().classify(&request, StatusCode::FORBIDDEN),
            FailureKind::Unrelated
        );
        assert_eq!(
            classifier().classify(&request, StatusCode::INTERNAL_SERVER_ERROR),
            FailureKind::Unrelated
        );
    }

    #[test]
    fn test_refresh_failure_mapping() {
        let server_down = ClientError::ServerError {
            status: 503,
            message: "maintenance".into(),
        };
        assert!(matches!(
            classify_refresh_failure(&server_down),
            RefreshError::NetworkUnavailable(_)
        ));

        let rejected = ClientError::AuthenticationFailed("invalid refresh token".into());
        assert_eq!(classify_refresh_failure(&rejected), RefreshError::Rejected);

        let bad_request = ClientError::BadRequest("missing token".into());
        assert_eq!(classify_refresh_failure(&bad_request), RefreshError::Rejected);

        let locked = ClientError::AccountLocked("locked".into());
        assert_eq!(classify_refresh_failure(&locked), RefreshError::Rejected);
    }
}
