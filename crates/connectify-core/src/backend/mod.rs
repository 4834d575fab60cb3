//! HTTP client for the hosted backend.
//!
//! One `BackendClient` talks to all three surfaces of the project:
//! - `/auth/v1` (sessions and users), see [`auth`]
//! - `/rest/v1` (posts, profiles, follows), see [`rest`] and [`tables`]
//! - `/storage/v1` (post media), see [`storage`]
//!
//! Every request carries the project `apikey` header plus a bearer token:
//! the signed-in user's access token when one is set, the anon key otherwise.

pub mod auth;
pub mod rest;
pub mod storage;
pub mod tables;

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use reqwest::{Method, RequestBuilder, Response};

use crate::config::Config;

pub use auth::SignUpOutcome;
pub use rest::Query;

/// Standard User-Agent header for backend requests.
pub const USER_AGENT: &str = concat!("connectify/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key: anon_key.into(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Builds a client from the resolved backend URL and anon key.
    ///
    /// # Errors
    /// Returns an error if either value is missing or the URL is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.effective_backend_url()?,
            config.effective_anon_key()?,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces the bearer token used for subsequent requests.
    ///
    /// Clones of this client share the token.
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = token;
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a request with project headers and the current bearer token.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_with_token(method, path, &self.bearer())
    }

    /// Starts a request authorized with an explicit token.
    pub(crate) fn request_with_token(
        &self,
        method: Method,
        path: &str,
        token: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {token}"))
            .header("User-Agent", USER_AGENT)
    }
}

/// Extracts the status and a readable message from a failed response.
///
/// The three backend surfaces report errors with different field names,
/// so the first non-empty one wins and the raw body is the fallback.
pub(crate) async fn error_parts(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, error_message(&body))
}

fn error_message(body: &str) -> String {
    const FIELDS: [&str; 5] = ["msg", "message", "error_description", "error", "hint"];

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in FIELDS {
            if let Some(text) = value.get(field).and_then(serde_json::Value::as_str)
                && !text.trim().is_empty()
            {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_known_fields() {
        assert_eq!(
            error_message(r#"{"code":400,"msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(r#"{"code":"42501","message":"permission denied","details":null}"#),
            "permission denied"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Refresh Token Not Found"}"#),
            "Refresh Token Not Found"
        );
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(""), "empty response");
    }

    #[test]
    fn test_access_token_shared_between_clones() {
        let client = BackendClient::new("http://localhost:1/", "anon");
        let clone = client.clone();
        assert_eq!(clone.base_url(), "http://localhost:1");
        assert_eq!(clone.bearer(), "anon");

        client.set_access_token(Some("user-token".to_string()));
        assert!(clone.has_access_token());
        assert_eq!(clone.bearer(), "user-token");

        clone.set_access_token(None);
        assert_eq!(client.bearer(), "anon");
    }
}
