//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input,
//! timer ticks, session changes forwarded from the session manager, and the
//! results of async handlers.

use connectify_core::follows::FollowSet;
use connectify_core::models::Post;
use connectify_core::session::AuthChange;
use crossterm::event::Event;
use uuid::Uuid;

use crate::common::{TaskCompleted, TaskKind, TaskStarted};

#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (drives spinner and render cadence).
    Tick,
    /// Current terminal size, sent before other events each loop.
    Frame { width: u16, height: u16 },
    Terminal(Event),

    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },
    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },

    /// A session change from the session manager.
    Auth(AuthChange),
    Login(LoginUiEvent),
    Feed(FeedUiEvent),
}

#[derive(Debug)]
pub enum LoginUiEvent {
    /// The initial session read finished. Navigation itself follows the
    /// `InitialSession` change; this only reports failures.
    SessionChecked { error: Option<String> },
    /// Sign-in request finished. On success the session change does the rest.
    Finished { error: Option<String> },
    /// Sign-up accepted, but the account must be confirmed by email first.
    ConfirmationRequired { email: String },
    /// Browser sign-in started; `url` is shown in case the browser did not open.
    OAuthStarted { url: String },
    SignedOut,
}

#[derive(Debug)]
pub enum FeedUiEvent {
    Loaded(Result<Vec<Post>, String>),
    FollowsLoaded(Result<FollowSet, String>),
    Submitted(Result<Post, String>),
    Deleted {
        post_id: Uuid,
        result: Result<(), String>,
    },
    Followed {
        target: Uuid,
        result: Result<(), String>,
    },
    Unfollowed {
        target: Uuid,
        result: Result<(), String>,
    },
}
