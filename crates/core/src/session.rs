//! Session data model
//!
//! Tokens are opaque to the client: they are never parsed, only stored and
//! attached to requests. Their `Debug` output is redacted so sessions can be
//! logged safely.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Short-lived bearer credential attached to ordinary requests
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Long-lived credential, exchanged for a new pair on every refresh
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(***)")
    }
}

impl From<&str> for RefreshToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Access and refresh token issued together by one rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            refresh_token: RefreshToken::new(refresh_token),
        }
    }
}

/// User identifier as returned by the backend
///
/// Backends send either a string or a number; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => UserId(id),
            RawId::Number(id) => UserId(id.to_string()),
        })
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimal record of the authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Any further fields the backend sends, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            name: None,
            email: None,
            role: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Credentials plus the user they belong to
///
/// A session is always complete; an absent session is represented by `None`
/// at the store level, never by a session with missing parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user: User,
}

impl Session {
    pub fn new(tokens: TokenPair, user: User) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        }
    }

    /// Copy of the current token pair
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Replace both tokens, keeping the user
    pub fn rotated(self, tokens: TokenPair) -> Self {
        Self::new(tokens, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_debug_is_redacted() {
        let tokens = TokenPair::new("secret-access", "secret-refresh");
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn test_token_pair_wire_format() {
        let tokens: TokenPair = serde_json::from_value(json!({
            "accessToken": "a-1",
            "refreshToken": "r-1"
        }))
        .unwrap();
        assert_eq!(tokens.access_token.as_str(), "a-1");
        assert_eq!(tokens.refresh_token.as_str(), "r-1");
    }

    #[test]
    fn test_user_accepts_numeric_id_and_keeps_extra_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 42,
            "name": "Ada",
            "permissions": ["products.read"]
        }))
        .unwrap();
        assert_eq!(user.id, UserId("42".to_string()));
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert_eq!(user.extra["permissions"], json!(["products.read"]));
    }

    #[test]
    fn test_rotated_keeps_user() {
        let session = Session::new(TokenPair::new("a-1", "r-1"), User::new("u-1"));
        let rotated = session.rotated(TokenPair::new("a-2", "r-2"));
        assert_eq!(rotated.access_token.as_str(), "a-2");
        assert_eq!(rotated.refresh_token.as_str(), "r-2");
        assert_eq!(rotated.user.id.0, "u-1");
    }
}
