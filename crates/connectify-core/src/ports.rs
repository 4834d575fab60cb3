//! Storage seams used by the accessors.
//!
//! `BackendClient` implements all three; tests swap in in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ClientResult;
use crate::models::{FollowEdge, NewPost, Post};

/// Post table contract.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest-first list; `join_profiles` embeds the author profile.
    async fn list_posts(&self, join_profiles: bool) -> ClientResult<Vec<Post>>;
    /// Inserts a post and returns the stored row.
    async fn insert_post(&self, post: &NewPost) -> ClientResult<Post>;
    /// Deletes the post matching both id and author.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> ClientResult<()>;
}

/// Follower/following association contract.
#[async_trait]
pub trait FollowStore: Send + Sync {
    async fn insert_follow(&self, edge: FollowEdge) -> ClientResult<()>;
    async fn delete_follow(&self, edge: FollowEdge) -> ClientResult<()>;
    async fn follow_exists(&self, edge: FollowEdge) -> ClientResult<bool>;
    /// Ids that `follower` follows.
    async fn following_of(&self, follower: Uuid) -> ClientResult<Vec<Uuid>>;
}

/// Object storage contract.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams `file` to `bucket/key`.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        size: u64,
        file: tokio::fs::File,
    ) -> ClientResult<()>;

    /// Public URL for an uploaded object.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory stores that count calls.

    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ClientError;

    #[derive(Default)]
    pub struct FakePosts {
        pub posts: Mutex<Vec<Post>>,
        pub fail_joined: bool,
        pub list_calls: AtomicUsize,
        pub joined_calls: AtomicUsize,
        pub insert_calls: AtomicUsize,
        pub delete_calls: AtomicUsize,
    }

    impl FakePosts {
        pub fn lists(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
        pub fn inserts(&self) -> usize {
            self.insert_calls.load(Ordering::SeqCst)
        }
        pub fn deletes(&self) -> usize {
            self.delete_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PostStore for FakePosts {
        async fn list_posts(&self, join_profiles: bool) -> ClientResult<Vec<Post>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if join_profiles {
                self.joined_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_joined {
                    return Err(ClientError::Data {
                        status: 400,
                        message: "Could not find a relationship between 'posts' and 'profiles'"
                            .to_string(),
                    });
                }
            }
            let mut posts = self.posts.lock().unwrap().clone();
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(posts)
        }

        async fn insert_post(&self, post: &NewPost) -> ClientResult<Post> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            let row = Post {
                id: Uuid::new_v4(),
                user_id: post.user_id,
                content: post.content.clone(),
                media_url: post.media_url.clone(),
                post_type: post.post_type,
                created_at: chrono::Utc::now(),
                author: None,
            };
            self.posts.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn delete_post(&self, id: Uuid, author_id: Uuid) -> ClientResult<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            self.posts
                .lock()
                .unwrap()
                .retain(|p| !(p.id == id && p.user_id == author_id));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeFollows {
        pub edges: Mutex<HashSet<FollowEdge>>,
        pub insert_calls: AtomicUsize,
    }

    impl FakeFollows {
        pub fn inserts(&self) -> usize {
            self.insert_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FollowStore for FakeFollows {
        async fn insert_follow(&self, edge: FollowEdge) -> ClientResult<()> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if !self.edges.lock().unwrap().insert(edge) {
                return Err(ClientError::Data {
                    status: 409,
                    message: "duplicate key value violates unique constraint".to_string(),
                });
            }
            Ok(())
        }

        async fn delete_follow(&self, edge: FollowEdge) -> ClientResult<()> {
            self.edges.lock().unwrap().remove(&edge);
            Ok(())
        }

        async fn follow_exists(&self, edge: FollowEdge) -> ClientResult<bool> {
            Ok(self.edges.lock().unwrap().contains(&edge))
        }

        async fn following_of(&self, follower: Uuid) -> ClientResult<Vec<Uuid>> {
            Ok(self
                .edges
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.follower_id == follower)
                .map(|e| e.following_id)
                .collect())
        }
    }

    #[derive(Default)]
    pub struct FakeObjects {
        pub uploads: Mutex<Vec<(String, String, String, u64)>>,
    }

    #[async_trait]
    impl ObjectStore for FakeObjects {
        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            content_type: &str,
            size: u64,
            _file: tokio::fs::File,
        ) -> ClientResult<()> {
            self.uploads.lock().unwrap().push((
                bucket.to_string(),
                key.to_string(),
                content_type.to_string(),
                size,
            ));
            Ok(())
        }

        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("https://cdn.test/{bucket}/{key}")
        }
    }
}
