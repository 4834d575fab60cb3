//! Application state.
//!
//! ```text
//! AppState
//! ├── page: Page            (derived from session changes)
//! ├── user: Option<User>    (replaced wholesale on every session change)
//! ├── login: LoginState
//! ├── feed: FeedState       (posts, composer, follow-set, local likes/comments)
//! ├── task_seq / tasks      (async task lifecycle)
//! └── status: Option<Status>
//! ```

use connectify_core::config::Config;
use connectify_core::models::User;

use crate::common::{TaskSeq, Tasks};
use crate::features::feed::FeedState;
use crate::features::login::LoginState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Waiting for the initial session read.
    Loading,
    Login,
    /// Only reachable while a user is present.
    Feed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

pub struct AppState {
    pub page: Page,
    pub user: Option<User>,
    pub login: LoginState,
    pub feed: FeedState,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    pub status: Option<Status>,
    pub spinner_frame: usize,
    pub terminal_size: (u16, u16),
    pub should_quit: bool,
    pub oauth_provider: String,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            page: Page::Loading,
            user: None,
            login: LoginState::default(),
            feed: FeedState::default(),
            task_seq: TaskSeq::default(),
            tasks: Tasks::default(),
            status: None,
            spinner_frame: 0,
            terminal_size: (0, 0),
            should_quit: false,
            oauth_provider: config.auth.oauth_provider.clone(),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            level: StatusLevel::Info,
            text: text.into(),
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            level: StatusLevel::Error,
            text: text.into(),
        });
    }
}
