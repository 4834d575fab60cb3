//! Auth endpoints (`/auth/v1`).

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{BackendClient, error_parts};
use crate::error::{ClientError, ClientResult};
use crate::models::{Session, User};
use crate::oauth::Pkce;

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The project auto-confirms accounts; the user is signed in.
    SignedIn(Session),
    /// The account exists but must be confirmed by email first.
    ConfirmationRequired(User),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(User),
}

impl BackendClient {
    /// Creates an account with email and password.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the backend rejects the sign-up.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ClientResult<SignUpOutcome> {
        let mut data = serde_json::Map::new();
        if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
            data.insert("full_name".to_string(), json!(name));
        }
        let body = json!({ "email": email, "password": password, "data": data });

        tracing::debug!("POST /auth/v1/signup");
        let response = self
            .request_with_token(Method::POST, "/auth/v1/signup", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let response = check_auth(response).await?;

        match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(session) => Ok(SignUpOutcome::SignedIn(session.normalized())),
            SignUpResponse::User(user) => Ok(SignUpOutcome::ConfirmationRequired(user)),
        }
    }

    /// Password grant.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` for bad credentials.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<Session> {
        self.token_grant("password", &json!({ "email": email, "password": password }))
            .await
    }

    /// Trades a refresh token for a fresh session.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the refresh token was revoked or expired.
    pub async fn refresh_session(&self, refresh_token: &str) -> ClientResult<Session> {
        self.token_grant("refresh_token", &json!({ "refresh_token": refresh_token }))
            .await
    }

    /// Trades an OAuth authorization code (PKCE flow) for a session.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the code or verifier is rejected.
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> ClientResult<Session> {
        self.token_grant(
            "pkce",
            &json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn token_grant(&self, grant_type: &str, body: &serde_json::Value) -> ClientResult<Session> {
        tracing::debug!(grant_type, "POST /auth/v1/token");
        let response = self
            .request_with_token(Method::POST, "/auth/v1/token", &self.anon_key)
            .query(&[("grant_type", grant_type)])
            .json(body)
            .send()
            .await?;
        let response = check_auth(response).await?;
        let session: Session = response.json().await?;
        Ok(session.normalized())
    }

    /// Fetches the user that owns `access_token`.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the token is invalid.
    pub async fn get_user(&self, access_token: &str) -> ClientResult<User> {
        tracing::debug!("GET /auth/v1/user");
        let response = self
            .request_with_token(Method::GET, "/auth/v1/user", access_token)
            .send()
            .await?;
        let response = check_auth(response).await?;
        Ok(response.json().await?)
    }

    /// Revokes the session that owns `access_token`.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the backend refuses the logout.
    pub async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        tracing::debug!("POST /auth/v1/logout");
        let response = self
            .request_with_token(Method::POST, "/auth/v1/logout", access_token)
            .send()
            .await?;
        // An already-invalid token is as signed out as it gets.
        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::NOT_FOUND
        {
            return Ok(());
        }
        check_auth(response).await?;
        Ok(())
    }

    /// Builds the browser URL that starts an OAuth sign-in.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, pkce: &Pkce) -> String {
        let params = [
            ("provider", provider),
            ("redirect_to", redirect_to),
            ("code_challenge", &pkce.challenge),
            ("code_challenge_method", "s256"),
        ];

        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        format!("{}/auth/v1/authorize?{query}", self.base_url)
    }
}

async fn check_auth(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = error_parts(response).await;
    tracing::warn!(status, %message, "auth request failed");
    Err(ClientError::Auth { status, message })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::oauth::generate_pkce;

    const USER_ID: &str = "7f1d2a4e-0000-4000-8000-000000000001";

    fn session_json(access: &str) -> serde_json::Value {
        json!({
            "access_token": access,
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 4_102_444_800_i64,
            "user": { "id": USER_ID, "email": "ada@example.com", "user_metadata": {} }
        })
    }

    #[tokio::test]
    async fn test_password_sign_in_returns_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_partial_json(json!({"email": "ada@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("access-1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), "anon");
        let session = client
            .sign_in_with_password("ada@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(session.access_token, "access-1");
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_bad_credentials_map_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), "anon");
        let err = client
            .sign_in_with_password("ada@example.com", "nope")
            .await
            .unwrap_err();
        match err {
            ClientError::Auth { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_up_without_session_requires_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({"data": {"full_name": "Ada"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "ada@example.com",
                "user_metadata": {"full_name": "Ada"}
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), "anon");
        let outcome = client
            .sign_up("ada@example.com", "secret", Some(" Ada "))
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(u) if u.email.as_deref() == Some("ada@example.com")));
    }

    #[tokio::test]
    async fn test_pkce_exchange_sends_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "pkce"))
            .and(body_partial_json(json!({"auth_code": "code-1", "code_verifier": "verifier-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("access-2")))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), "anon");
        let session = client
            .exchange_code_for_session("code-1", "verifier-1")
            .await
            .unwrap();
        assert_eq!(session.access_token, "access-2");
    }

    #[tokio::test]
    async fn test_get_user_uses_given_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID, "email": "ada@example.com"
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), "anon");
        let user = client.get_user("user-token").await.unwrap();
        assert_eq!(user.id.to_string(), USER_ID);
    }

    #[tokio::test]
    async fn test_sign_out_tolerates_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), "anon");
        client.sign_out("stale").await.unwrap();
    }

    #[test]
    fn test_authorize_url_format() {
        let client = BackendClient::new("https://demo.supabase.co", "anon");
        let pkce = generate_pkce();
        let url = client.authorize_url("google", "http://localhost:50000/callback?state=s", &pkce);

        assert!(url.starts_with("https://demo.supabase.co/auth/v1/authorize?"));
        assert!(url.contains("provider=google"));
        assert!(url.contains("code_challenge_method=s256"));
        assert!(url.contains(&format!("code_challenge={}", pkce.challenge)));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A50000%2Fcallback%3Fstate%3Ds"));
    }
}
