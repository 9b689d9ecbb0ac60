//! Description of an outbound request
//!
//! A descriptor is plain data so the pipeline can send it twice: once with the
//! token found in the store, and at most once more after a refresh.

use crate::client::error::ClientError;
use reqwest::{
    Method,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Value>,
    replay: bool,
}

impl RequestDescriptor {
    /// `path` is relative to the client's base URL; a leading `/` is added if missing
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Self {
            method,
            path,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            replay: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set an extra header.
    ///
    /// `Authorization` is owned by the client and is ignored here.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if name == header::AUTHORIZATION {
            warn!(path = %self.path, "Ignoring caller supplied Authorization header");
            return self;
        }
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as the JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Use an already built JSON value as the request body
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Whether this is the single replay after a refresh
    pub fn is_replay(&self) -> bool {
        self.replay
    }

    /// Copy of this request marked as the post-refresh replay
    pub(crate) fn as_replay(&self) -> Self {
        Self {
            replay: true,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_gets_leading_slash() {
        assert_eq!(RequestDescriptor::get("products").path(), "/products");
        assert_eq!(RequestDescriptor::get("/products").path(), "/products");
    }

    #[test]
    fn test_authorization_header_is_ignored() {
        let request = RequestDescriptor::get("/products")
            .header(header::AUTHORIZATION, HeaderValue::from_static("Bearer mine"))
            .header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            );

        assert!(request.headers().get(header::AUTHORIZATION).is_none());
        assert_eq!(request.headers()["x-request-id"], "abc");
    }

    #[test]
    fn test_replay_copy_keeps_request() {
        let request = RequestDescriptor::post("/orders")
            .query("dry_run", "true")
            .json(&json!({ "sku": "A-1" }))
            .unwrap();
        let replay = request.as_replay();

        assert!(!request.is_replay());
        assert!(replay.is_replay());
        assert_eq!(replay.method(), &Method::POST);
        assert_eq!(replay.query_pairs(), request.query_pairs());
        assert_eq!(replay.body(), Some(&json!({ "sku": "A-1" })));
    }
}
