//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer never talks to the
//! backend directly.

use connectify_core::feed::PostDraft;
use connectify_core::follows::FollowSet;
use uuid::Uuid;

use crate::common::TaskId;

#[derive(Debug)]
pub enum UiEffect {
    Quit,

    /// Read the cached session once (emits `InitialSession`).
    InitSession { task: TaskId },
    SignIn {
        task: TaskId,
        email: String,
        password: String,
    },
    SignUp {
        task: TaskId,
        email: String,
        password: String,
        full_name: Option<String>,
    },
    /// Browser sign-in with the configured OAuth provider.
    StartOAuth { task: TaskId },
    SignOut,

    LoadFeed { task: TaskId },
    LoadFollows { task: TaskId, user_id: Uuid },
    /// Uploads `media_path` first when set, then creates the post.
    SubmitPost {
        task: TaskId,
        author_id: Uuid,
        draft: PostDraft,
        media_path: Option<String>,
    },
    DeletePost {
        post_id: Uuid,
        author_id: Uuid,
        caller_id: Uuid,
    },
    Follow {
        follower: Uuid,
        target: Uuid,
        known: FollowSet,
    },
    Unfollow { follower: Uuid, target: Uuid },

    OpenUrl { url: String },
}
