//! Wiring of the client, session manager and accessors.

use std::sync::Arc;

use anyhow::Result;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::feed::FeedAccessor;
use crate::follows::RelationshipAccessor;
use crate::media::MediaUploader;
use crate::session::{SessionManager, SessionStore};

/// Everything a front end needs, sharing one HTTP client and token slot.
#[derive(Clone)]
pub struct Services {
    pub config: Config,
    pub client: BackendClient,
    pub session: Arc<SessionManager>,
    pub feed: FeedAccessor,
    pub follows: RelationshipAccessor,
    pub media: MediaUploader,
}

impl Services {
    /// Builds services with the session cached at the default location.
    ///
    /// # Errors
    /// Returns an error if the backend URL or anon key is missing or invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_store(config, SessionStore::default_location())
    }

    /// # Errors
    /// Returns an error if the backend URL or anon key is missing or invalid.
    pub fn with_store(config: &Config, store: SessionStore) -> Result<Self> {
        let client = BackendClient::from_config(config)?;
        let session = Arc::new(SessionManager::new(client.clone(), store));
        let shared = Arc::new(client.clone());

        Ok(Self {
            config: config.clone(),
            feed: FeedAccessor::new(Arc::clone(&shared) as _, config.feed.join_profiles),
            follows: RelationshipAccessor::new(Arc::clone(&shared) as _),
            media: MediaUploader::new(shared as _, &config.storage),
            client,
            session,
        })
    }
}
