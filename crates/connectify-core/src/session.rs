//! Session tracking and change notifications.
//!
//! `SessionManager` owns the current session, keeps the client's bearer token
//! in step with it, persists it to `session.json` (0600) and broadcasts an
//! [`AuthChange`] every time it changes. Each change carries the whole new
//! session (or none), so subscribers replace their copy of the user instead
//! of patching it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

use crate::backend::{BackendClient, SignUpOutcome};
use crate::config::paths;
use crate::error::{ClientError, ClientResult, ErrorCategory};
use crate::models::{Session, User};

/// Buffered change events per subscriber before it starts lagging.
const CHANGE_CAPACITY: usize = 16;

/// Kind of session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Emitted once when the stored session is first read.
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A session change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Registered change listener. Dropping it unregisters the listener.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    /// Waits for the next change; `None` once the manager is gone.
    ///
    /// A lagging listener skips to the newest buffered change, which is safe
    /// because every change carries the full session.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "auth listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

/// On-disk session cache.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$CONNECTIFY_HOME/session.json`.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached session; `None` when no file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> ClientResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ClientError::SessionCache(format!("read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&contents).map(Some).map_err(|e| {
            ClientError::SessionCache(format!("parse {}: {e}", self.path.display()))
        })
    }

    /// Saves the session with restricted permissions (0600).
    ///
    /// The file is written next to the target and renamed over it, so a
    /// crash mid-write leaves the previous session intact.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> ClientResult<()> {
        let cache_err = |e: std::io::Error| {
            ClientError::SessionCache(format!("write {}: {e}", self.path.display()))
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(cache_err)?;
        }

        let contents = serde_json::to_string_pretty(session)
            .map_err(|e| ClientError::SessionCache(format!("serialize session: {e}")))?;

        let tmp_path = self.tmp_path();
        // A stale temp file would keep its old permissions.
        if tmp_path.exists() {
            fs::remove_file(&tmp_path).map_err(cache_err)?;
        }
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path).map_err(cache_err)?;
        file.write_all(contents.as_bytes()).map_err(cache_err)?;
        file.sync_all().map_err(cache_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(cache_err)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    /// Removes the cached session. Returns whether one existed.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> ClientResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| {
            ClientError::SessionCache(format!("remove {}: {e}", self.path.display()))
        })?;
        Ok(true)
    }
}

/// Current-session owner and change broadcaster.
#[derive(Debug)]
pub struct SessionManager {
    client: BackendClient,
    store: SessionStore,
    current: Mutex<Option<Session>>,
    loaded: Mutex<bool>,
    changes: broadcast::Sender<AuthChange>,
}

impl SessionManager {
    pub fn new(client: BackendClient, store: SessionStore) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            client,
            store,
            current: Mutex::new(None),
            loaded: Mutex::new(false),
            changes,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Registers a change listener.
    pub fn on_auth_state_change(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.changes.subscribe(),
        }
    }

    /// Number of live listeners.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// In-memory session, without touching disk or network.
    pub fn snapshot(&self) -> Option<Session> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// User of the in-memory session.
    pub fn user(&self) -> Option<User> {
        self.snapshot().map(|s| s.user)
    }

    /// Signed-in user, loading and refreshing the session if needed.
    ///
    /// # Errors
    /// Returns `ClientError::NotSignedIn` when there is no session.
    pub async fn require_user(&self) -> ClientResult<User> {
        self.current_session()
            .await?
            .map(|s| s.user)
            .ok_or(ClientError::NotSignedIn)
    }

    /// Reads the stored session once and emits `InitialSession`.
    ///
    /// # Errors
    /// Returns an error if the cache is unreadable or a refresh hits the network and fails.
    pub async fn initialize(&self) -> ClientResult<Option<Session>> {
        let session = self.current_session().await?;
        self.emit(AuthEvent::InitialSession, session.clone());
        Ok(session)
    }

    /// Current session, loaded from the cache on first use and refreshed once
    /// if it has expired.
    ///
    /// A refresh rejected by the backend signs the user out.
    ///
    /// # Errors
    /// Returns an error if the cache is unreadable or the refresh request fails in transit.
    pub async fn current_session(&self) -> ClientResult<Option<Session>> {
        let first_load = {
            let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
            !std::mem::replace(&mut *loaded, true)
        };
        if first_load {
            let stored = self.store.load()?;
            self.replace(stored);
        }

        let Some(session) = self.snapshot() else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        tracing::info!("session expired, refreshing");
        match self.client.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                self.set_session(AuthEvent::TokenRefreshed, fresh.clone())?;
                Ok(Some(fresh))
            }
            Err(err) if err.category() == ErrorCategory::Auth => {
                tracing::warn!(error = %err, "refresh rejected, signing out");
                self.clear_session()?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches the user for the current access token from the provider.
    ///
    /// # Errors
    /// Returns `ClientError::NotSignedIn` without a session, or the provider error.
    pub async fn get_user(&self) -> ClientResult<User> {
        let session = self
            .current_session()
            .await?
            .ok_or(ClientError::NotSignedIn)?;
        self.client.get_user(&session.access_token).await
    }

    /// # Errors
    /// Returns `ClientError::Auth` for rejected credentials.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<Session> {
        let session = self.client.sign_in_with_password(email, password).await?;
        tracing::info!(user = %session.user.id, "signed in with password");
        self.set_session(AuthEvent::SignedIn, session.clone())?;
        Ok(session)
    }

    /// Creates an account; signs in when the backend returns a session.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the sign-up is rejected.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ClientResult<SignUpOutcome> {
        let outcome = self.client.sign_up(email, password, full_name).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                tracing::info!(user = %session.user.id, "signed up");
                self.set_session(AuthEvent::SignedIn, session.clone())?;
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!(user = %user.id, "sign-up awaiting confirmation");
            }
        }
        Ok(outcome)
    }

    /// Completes an OAuth redirect sign-in.
    ///
    /// # Errors
    /// Returns `ClientError::Auth` if the code exchange is rejected.
    pub async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> ClientResult<Session> {
        let session = self
            .client
            .exchange_code_for_session(auth_code, code_verifier)
            .await?;
        tracing::info!(user = %session.user.id, "signed in with OAuth");
        self.set_session(AuthEvent::SignedIn, session.clone())?;
        Ok(session)
    }

    /// Signs out. The local session is always cleared, even when the
    /// provider cannot be reached.
    ///
    /// # Errors
    /// Returns an error only if the session cache cannot be removed.
    pub async fn sign_out(&self) -> ClientResult<bool> {
        let had_session = match self.current_session().await {
            Ok(Some(session)) => {
                if let Err(err) = self.client.sign_out(&session.access_token).await {
                    tracing::warn!(error = %err, "provider sign-out failed");
                }
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "could not load session before sign-out");
                false
            }
        };
        self.clear_session()?;
        tracing::info!("signed out");
        Ok(had_session)
    }

    fn set_session(&self, event: AuthEvent, session: Session) -> ClientResult<()> {
        self.store.save(&session)?;
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.replace(Some(session.clone()));
        self.emit(event, Some(session));
        Ok(())
    }

    fn clear_session(&self) -> ClientResult<()> {
        self.replace(None);
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.emit(AuthEvent::SignedOut, None);
        self.store.clear()?;
        Ok(())
    }

    fn replace(&self, session: Option<Session>) {
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        // No listeners is fine.
        let _ = self.changes.send(AuthChange { event, session });
    }
}
