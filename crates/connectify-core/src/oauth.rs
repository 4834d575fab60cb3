//! OAuth redirect helpers: PKCE, localhost callback and pasted-code parsing.
//!
//! The backend runs the provider dance itself; the client only needs a PKCE
//! pair, a localhost redirect that receives `?code=...`, and the verifier to
//! trade that code for a session.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::backend::BackendClient;

/// Path the browser is redirected to after sign-in.
pub const LOCAL_CALLBACK_PATH: &str = "/callback";

/// How long to wait for the browser redirect.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// PKCE code verifier and challenge
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

/// Generate PKCE code verifier and challenge
pub fn generate_pkce() -> Pkce {
    // Use two UUIDs (16 bytes each) to get 32 random bytes
    let uuid1 = uuid::Uuid::new_v4();
    let uuid2 = uuid::Uuid::new_v4();
    let mut verifier_bytes = [0u8; 32];
    verifier_bytes[..16].copy_from_slice(uuid1.as_bytes());
    verifier_bytes[16..].copy_from_slice(uuid2.as_bytes());
    let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

    Pkce {
        challenge: challenge_for(&verifier),
        verifier,
    }
}

fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generates a random high localhost port for OAuth callbacks.
pub fn random_local_port() -> u16 {
    let id = uuid::Uuid::new_v4();
    let bytes = id.as_bytes();
    let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
    49152 + (raw % 16384)
}

/// Builds the redirect URI for a given localhost port.
///
/// `state` rides along in the query so the callback can reject redirects
/// it did not start.
pub fn build_redirect_uri(port: u16, state: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("state", state)
        .finish();
    format!("http://localhost:{port}{LOCAL_CALLBACK_PATH}?{query}")
}

/// Parses a pasted authorization input into code + optional state.
///
/// Accepts a full redirect URL, a bare query string, or the code alone.
pub fn parse_authorization_input(input: &str) -> (Option<String>, Option<String>) {
    let value = input.trim();
    if value.is_empty() {
        return (None, None);
    }

    if let Ok(url) = url::Url::parse(value) {
        let code = url.query_pairs().find(|(k, _)| k == "code").map(|(_, v)| v);
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v);
        return (code.map(|v| v.to_string()), state.map(|v| v.to_string()));
    }

    if value.contains("code=") {
        let query = value.trim_start_matches('?');
        let params = url::form_urlencoded::parse(query.as_bytes()).collect::<Vec<_>>();
        let code = params.iter().find(|(k, _)| k == "code").map(|(_, v)| v);
        let state = params.iter().find(|(k, _)| k == "state").map(|(_, v)| v);
        return (
            code.map(std::string::ToString::to_string),
            state.map(std::string::ToString::to_string),
        );
    }

    (Some(value.to_string()), None)
}

/// Blocks until the browser hits the local callback or `timeout` elapses.
///
/// Returns `None` if the port cannot be bound, the wait times out, or the
/// redirect carries the wrong state.
pub fn wait_for_callback_code(port: u16, state: &str, timeout: Duration) -> Option<String> {
    wait_for_callback_code_until(port, state, timeout, || false)
}

/// Same as [`wait_for_callback_code`], giving up early once `stop` returns true.
pub fn wait_for_callback_code_until(
    port: u16,
    state: &str,
    timeout: Duration,
    stop: impl Fn() -> bool,
) -> Option<String> {
    let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{port}")) else {
        tracing::warn!(port, "OAuth callback port unavailable");
        return None;
    };
    let _ = listener.set_nonblocking(true);

    let start = Instant::now();
    loop {
        match listener.accept() {
            Ok((mut stream, _)) => {
                let _ = stream.set_nonblocking(false);
                let mut buffer = [0u8; 4096];
                let read = stream.read(&mut buffer).unwrap_or(0);
                let request = String::from_utf8_lossy(&buffer[..read]);
                let code = extract_code_from_request(&request, state);
                let response = if code.is_some() {
                    callback_success_response()
                } else {
                    callback_error_response()
                };
                let _ = stream.write_all(response.as_bytes());
                return code;
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                if stop() || start.elapsed() > timeout {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(_) => return None,
        }
    }
}

/// Pulls `code` out of a raw HTTP request line after checking path and state.
pub fn extract_code_from_request(request: &str, expected_state: &str) -> Option<String> {
    let request_line = request.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    let path = parts.next()?;

    let url = url::Url::parse(&format!("http://localhost{path}")).ok()?;
    if url.path() != LOCAL_CALLBACK_PATH {
        return None;
    }
    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())?;
    if state != expected_state {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
}

fn callback_success_response() -> String {
    let body = "<!doctype html><html><head><meta charset=\"utf-8\" /><title>Connectify</title></head><body><p>Signed in to Connectify. Return to your terminal to continue.</p></body></html>";
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn callback_error_response() -> String {
    let body = "Invalid sign-in callback";
    format!(
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// A browser sign-in waiting for its redirect.
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    pub port: u16,
    pub state: String,
    pub pkce: Pkce,
    /// Authorize URL to open in the browser.
    pub url: String,
}

impl OAuthFlow {
    /// Prepares a sign-in with `provider`, redirecting to `port` (random when unset).
    pub fn new(client: &BackendClient, provider: &str, port: Option<u16>) -> Self {
        let port = port.unwrap_or_else(random_local_port);
        let state = uuid::Uuid::new_v4().simple().to_string();
        let pkce = generate_pkce();
        let url = client.authorize_url(provider, &build_redirect_uri(port, &state), &pkce);
        Self {
            port,
            state,
            pkce,
            url,
        }
    }

    /// Blocks until the local callback delivers a code or the wait times out.
    pub fn wait_for_code(&self) -> Option<String> {
        wait_for_callback_code(self.port, &self.state, CALLBACK_TIMEOUT)
    }

    /// Like [`wait_for_code`](Self::wait_for_code), returning `None` soon after `cancel` fires.
    pub fn wait_for_code_until(&self, cancel: &CancellationToken) -> Option<String> {
        wait_for_callback_code_until(self.port, &self.state, CALLBACK_TIMEOUT, || {
            cancel.is_cancelled()
        })
    }

    /// Code from pasted input, rejecting a mismatched state.
    pub fn code_from_input(&self, input: &str) -> Option<String> {
        let (code, state) = parse_authorization_input(input);
        match state {
            Some(state) if state != self.state => None,
            _ => code,
        }
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 || !token.is_char_boundary(12) {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
