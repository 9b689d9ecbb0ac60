//! Client configuration and the backend's authentication routes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("sessionguard/", env!("CARGO_PKG_VERSION"));

/// Paths of the authentication endpoints, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthPaths {
    pub login: String,
    pub register: String,
    pub refresh: String,
    pub verify: String,
    pub logout: String,
}

impl Default for AuthPaths {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            refresh: "/auth/refresh".to_string(),
            verify: "/auth/verify".to_string(),
            logout: "/auth/logout".to_string(),
        }
    }
}

impl AuthPaths {
    /// Whether `path` targets the refresh endpoint
    pub fn is_refresh(&self, path: &str) -> bool {
        same_route(&self.refresh, path)
    }

    /// Whether `path` exchanges credentials for a session (login or register)
    pub fn is_credential_exchange(&self, path: &str) -> bool {
        same_route(&self.login, path) || same_route(&self.register, path)
    }
}

/// Compare routes ignoring the query string and a trailing slash
fn same_route(route: &str, path: &str) -> bool {
    fn normalize(path: &str) -> &str {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        path.trim_end_matches('/')
    }

    normalize(route) == normalize(path)
}

/// Settings used to build a [`SessionClient`](crate::SessionClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL every request path is appended to
    pub base_url: String,
    /// Per-request timeout, applied to refresh exchanges too
    #[serde(default, with = "optional_secs")]
    pub timeout: Option<Duration>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub paths: AuthPaths,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            user_agent: default_user_agent(),
            paths: AuthPaths::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = AuthPaths::default();
        assert_eq!(paths.refresh, "/auth/refresh");
        assert_eq!(paths.verify, "/auth/verify");
        assert_eq!(paths.logout, "/auth/logout");
    }

    #[test]
    fn test_route_matching_ignores_query_and_trailing_slash() {
        let paths = AuthPaths::default();
        assert!(paths.is_refresh("/auth/refresh"));
        assert!(paths.is_refresh("/auth/refresh/"));
        assert!(paths.is_refresh("/auth/refresh?source=cli"));
        assert!(!paths.is_refresh("/auth/refresh-history"));
        assert!(paths.is_credential_exchange("/auth/login?next=/home"));
        assert!(paths.is_credential_exchange("/auth/register"));
        assert!(!paths.is_credential_exchange("/auth/verify"));
    }

    #[test]
    fn test_config_timeout_in_seconds() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "http://localhost:3000",
            "timeout": 10
        }))
        .unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.paths, AuthPaths::default());
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
