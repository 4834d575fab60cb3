//! Session handlers: initial read, sign-in, sign-up, OAuth and sign-out.
//!
//! Successful sign-ins need no navigation here: the session manager emits a
//! change that the runtime forwards to the reducer.

use std::sync::Arc;

use connectify_core::ClientError;
use connectify_core::backend::SignUpOutcome;
use connectify_core::oauth::OAuthFlow;
use connectify_core::session::SessionManager;
use tokio_util::sync::CancellationToken;

use crate::events::{LoginUiEvent, UiEvent};

fn failure(context: &str, err: &ClientError) -> Option<String> {
    tracing::warn!(error = %err, "{context}");
    Some(err.user_message())
}

pub async fn init_session(session: Arc<SessionManager>) -> UiEvent {
    let error = match session.initialize().await {
        Ok(_) => None,
        Err(err) => failure("initial session read failed", &err),
    };
    UiEvent::Login(LoginUiEvent::SessionChecked { error })
}

pub async fn sign_in(session: Arc<SessionManager>, email: String, password: String) -> UiEvent {
    let error = match session.sign_in_with_password(&email, &password).await {
        Ok(_) => None,
        Err(err) => failure("sign-in failed", &err),
    };
    UiEvent::Login(LoginUiEvent::Finished { error })
}

pub async fn sign_up(
    session: Arc<SessionManager>,
    email: String,
    password: String,
    full_name: Option<String>,
) -> UiEvent {
    match session
        .sign_up(&email, &password, full_name.as_deref())
        .await
    {
        Ok(SignUpOutcome::SignedIn(_)) => UiEvent::Login(LoginUiEvent::Finished { error: None }),
        Ok(SignUpOutcome::ConfirmationRequired(user)) => {
            UiEvent::Login(LoginUiEvent::ConfirmationRequired {
                email: user.email.unwrap_or(email),
            })
        }
        Err(err) => UiEvent::Login(LoginUiEvent::Finished {
            error: failure("sign-up failed", &err),
        }),
    }
}

/// Waits for the browser redirect of `flow`, then trades the code for a session.
pub async fn oauth_sign_in(
    session: Arc<SessionManager>,
    flow: OAuthFlow,
    cancel: Option<CancellationToken>,
) -> UiEvent {
    let verifier = flow.pkce.verifier.clone();
    let cancel = cancel.unwrap_or_default();
    let listener_cancel = cancel.clone();
    let wait = tokio::task::spawn_blocking(move || flow.wait_for_code_until(&listener_cancel));

    let code = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            return UiEvent::Login(LoginUiEvent::Finished { error: None });
        }
        joined = wait => joined.ok().flatten(),
    };
    let Some(code) = code else {
        return UiEvent::Login(LoginUiEvent::Finished {
            error: Some("No sign-in received from the browser.".to_string()),
        });
    };

    let error = match session.exchange_code(&code, &verifier).await {
        Ok(_) => None,
        Err(err) => failure("OAuth code exchange failed", &err),
    };
    UiEvent::Login(LoginUiEvent::Finished { error })
}

pub async fn sign_out(session: Arc<SessionManager>) -> UiEvent {
    match session.sign_out().await {
        Ok(_) => UiEvent::Login(LoginUiEvent::SignedOut),
        Err(err) => UiEvent::Login(LoginUiEvent::Finished {
            error: failure("sign-out failed", &err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use connectify_core::backend::BackendClient;
    use connectify_core::session::SessionStore;

    use super::*;

    fn manager(dir: &std::path::Path) -> Arc<SessionManager> {
        // Nothing listens on port 9; requests fail in transit.
        let client = BackendClient::new("http://127.0.0.1:9", "anon");
        Arc::new(SessionManager::new(
            client,
            SessionStore::new(dir.join("session.json")),
        ))
    }

    #[tokio::test]
    async fn test_init_without_cache_reports_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let event = init_session(manager(dir.path())).await;
        assert!(matches!(
            event,
            UiEvent::Login(LoginUiEvent::SessionChecked { error: None })
        ));
    }

    #[tokio::test]
    async fn test_sign_in_failure_becomes_message() {
        let dir = tempfile::tempdir().unwrap();
        let event = sign_in(manager(dir.path()), "a@b.c".to_string(), "pw".to_string()).await;
        assert!(matches!(
            event,
            UiEvent::Login(LoginUiEvent::Finished { error: Some(_) })
        ));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_still_signs_out() {
        let dir = tempfile::tempdir().unwrap();
        let event = sign_out(manager(dir.path())).await;
        assert!(matches!(event, UiEvent::Login(LoginUiEvent::SignedOut)));
    }

    #[tokio::test]
    async fn test_cancelled_oauth_returns_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let session = manager(dir.path());
        let client = BackendClient::new("http://127.0.0.1:9", "anon");
        let flow = OAuthFlow::new(&client, "google", None);
        let token = CancellationToken::new();
        token.cancel();

        let event = oauth_sign_in(session, flow, Some(token)).await;
        assert!(matches!(
            event,
            UiEvent::Login(LoginUiEvent::Finished { error: None })
        ));
    }
}
