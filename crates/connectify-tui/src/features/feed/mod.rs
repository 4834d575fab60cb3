//! Feed page: composer, post list and follow toggles.
//!
//! Likes and comments live only here. Like counts are placeholders seeded
//! from the post id, so they stay stable across reloads of the same run.

mod render;
mod update;

use std::collections::HashSet;

use connectify_core::follows::FollowSet;
use connectify_core::models::{Post, PostKind};
use uuid::Uuid;

pub use render::render_feed;
pub(crate) use update::reload;
pub use update::{handle_feed_event, handle_key, handle_paste};

use crate::common::TextField;

/// Which part of the page receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFocus {
    #[default]
    Content,
    Media,
    Posts,
    /// Typing a comment on the selected post.
    Comment,
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    pub content: TextField,
    /// Local path of a file to attach.
    pub media: TextField,
    pub kind: PostKind,
}

impl Composer {
    pub fn clear(&mut self) {
        self.content.clear();
        self.media.clear();
        self.kind = PostKind::default();
    }
}

/// A post plus its local-only interaction state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub likes: u32,
    pub liked: bool,
    pub show_comments: bool,
    pub comments: Vec<String>,
}

impl PostView {
    pub fn new(post: Post) -> Self {
        let likes = placeholder_likes(post.id);
        Self {
            post,
            likes,
            liked: false,
            show_comments: false,
            comments: Vec::new(),
        }
    }

    /// Count shown next to the heart.
    pub fn like_count(&self) -> u32 {
        self.likes + u32::from(self.liked)
    }
}

/// Placeholder like count in `0..=49`.
fn placeholder_likes(id: Uuid) -> u32 {
    u32::from(id.as_bytes()[15]) % 50
}

#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub posts: Vec<PostView>,
    pub selected: usize,
    pub focus: FeedFocus,
    pub composer: Composer,
    pub comment_draft: TextField,
    pub follows: FollowSet,
    /// Targets with a follow/unfollow request in flight.
    pub pending_follows: HashSet<Uuid>,
    pub loaded: bool,
}

impl FeedState {
    pub fn selected_post(&self) -> Option<&PostView> {
        self.posts.get(self.selected)
    }

    pub fn selected_post_mut(&mut self) -> Option<&mut PostView> {
        self.posts.get_mut(self.selected)
    }

    /// Replaces the list, carrying local likes and comments over by id.
    pub fn replace_posts(&mut self, posts: Vec<Post>) {
        let selected_id = self.selected_post().map(|p| p.post.id);
        let mut previous: Vec<PostView> = std::mem::take(&mut self.posts);
        self.posts = posts
            .into_iter()
            .map(|post| match previous.iter().position(|v| v.post.id == post.id) {
                Some(i) => {
                    let mut view = previous.swap_remove(i);
                    view.post = post;
                    view
                }
                None => PostView::new(post),
            })
            .collect();
        self.selected = selected_id
            .and_then(|id| self.posts.iter().position(|v| v.post.id == id))
            .unwrap_or(0);
        self.loaded = true;
    }

    /// Drops exactly the post with `id`.
    pub fn remove_post(&mut self, id: Uuid) {
        self.posts.retain(|v| v.post.id != id);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.posts.is_empty() {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(self.posts.len() - 1);
        }
    }
}
