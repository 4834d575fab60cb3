//! Feed reads and writes.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::models::{NewPost, Post, PostKind};
use crate::ports::PostStore;

/// What the composer submits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    pub media_url: Option<String>,
    pub kind: Option<PostKind>,
}

impl PostDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// True when there is nothing but whitespace to post.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Lists, creates and deletes posts.
#[derive(Clone)]
pub struct FeedAccessor {
    store: Arc<dyn PostStore>,
    join_profiles: bool,
}

impl FeedAccessor {
    pub fn new(store: Arc<dyn PostStore>, join_profiles: bool) -> Self {
        Self {
            store,
            join_profiles,
        }
    }

    /// Posts newest-first, with author profiles when the join succeeds.
    ///
    /// # Errors
    /// Returns the unjoined query's error if both queries fail.
    pub async fn list(&self) -> ClientResult<Vec<Post>> {
        if self.join_profiles {
            match self.store.list_posts(true).await {
                Ok(posts) => return Ok(posts),
                Err(err) => {
                    tracing::warn!(error = %err, "profile join failed, listing plain posts");
                }
            }
        }
        self.store.list_posts(false).await
    }

    /// Creates a post authored by `author_id`.
    ///
    /// Blank content is rejected before any request is made. Content is
    /// stored as typed.
    ///
    /// # Errors
    /// Returns `ClientError::EmptyContent` for blank drafts, otherwise the store's error.
    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> ClientResult<Post> {
        if draft.is_blank() {
            return Err(ClientError::EmptyContent);
        }
        let row = NewPost {
            user_id: author_id,
            content: draft.content,
            media_url: draft.media_url,
            post_type: draft.kind,
        };
        let post = self.store.insert_post(&row).await?;
        tracing::info!(post = %post.id, "post created");
        Ok(post)
    }

    /// Deletes `post` on behalf of `caller_id`.
    ///
    /// Only the author may delete; anyone else is refused without a request.
    ///
    /// # Errors
    /// Returns `ClientError::NotAuthor` for a foreign post, otherwise the store's error.
    pub async fn delete(&self, post: &Post, caller_id: Uuid) -> ClientResult<()> {
        self.delete_by_id(post.id, post.user_id, caller_id).await
    }

    /// Same as [`delete`](Self::delete) when only the id and author are known.
    ///
    /// # Errors
    /// Returns `ClientError::NotAuthor` for a foreign post, otherwise the store's error.
    pub async fn delete_by_id(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        caller_id: Uuid,
    ) -> ClientResult<()> {
        if author_id != caller_id {
            return Err(ClientError::NotAuthor);
        }
        self.store.delete_post(post_id, caller_id).await?;
        tracing::info!(post = %post_id, "post deleted");
        Ok(())
    }
}
