//! Table-backed implementations of the storage ports.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::{BackendClient, Query};
use crate::error::{ClientError, ClientResult};
use crate::models::{FollowEdge, NewPost, Post};
use crate::ports::{FollowStore, ObjectStore, PostStore};

pub const POSTS_TABLE: &str = "posts";
pub const FOLLOWS_TABLE: &str = "follows";

/// Columns read for every post.
const POST_COLUMNS: &str = "id,user_id,content,media_url,post_type,created_at";
/// Post columns plus the embedded author profile.
const POST_COLUMNS_WITH_PROFILE: &str =
    "id,user_id,content,media_url,post_type,created_at,profiles(username,full_name,avatar_url)";

#[async_trait]
impl PostStore for BackendClient {
    async fn list_posts(&self, join_profiles: bool) -> ClientResult<Vec<Post>> {
        let columns = if join_profiles {
            POST_COLUMNS_WITH_PROFILE
        } else {
            POST_COLUMNS
        };
        let query = Query::table(POSTS_TABLE)
            .select(columns)
            .order_desc("created_at");
        self.select(&query).await
    }

    async fn insert_post(&self, post: &NewPost) -> ClientResult<Post> {
        let query = Query::table(POSTS_TABLE).select(POST_COLUMNS);
        let rows: Vec<Post> = self.insert(&query, post).await?;
        rows.into_iter().next().ok_or_else(|| ClientError::Data {
            status: 200,
            message: "insert returned no row".to_string(),
        })
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> ClientResult<()> {
        let query = Query::table(POSTS_TABLE)
            .eq("id", id)
            .eq("user_id", author_id);
        self.delete_rows(&query).await
    }
}

#[derive(Deserialize)]
struct FollowingRow {
    following_id: Uuid,
}

fn edge_query(edge: FollowEdge) -> Query {
    Query::table(FOLLOWS_TABLE)
        .eq("follower_id", edge.follower_id)
        .eq("following_id", edge.following_id)
}

#[async_trait]
impl FollowStore for BackendClient {
    async fn insert_follow(&self, edge: FollowEdge) -> ClientResult<()> {
        self.insert_minimal(&Query::table(FOLLOWS_TABLE), &edge)
            .await
    }

    async fn delete_follow(&self, edge: FollowEdge) -> ClientResult<()> {
        self.delete_rows(&edge_query(edge)).await
    }

    async fn follow_exists(&self, edge: FollowEdge) -> ClientResult<bool> {
        let query = edge_query(edge).select("follower_id").limit(1);
        let rows: Vec<serde_json::Value> = self.select(&query).await?;
        Ok(!rows.is_empty())
    }

    async fn following_of(&self, follower: Uuid) -> ClientResult<Vec<Uuid>> {
        let query = Query::table(FOLLOWS_TABLE)
            .select("following_id")
            .eq("follower_id", follower);
        let rows: Vec<FollowingRow> = self.select(&query).await?;
        Ok(rows.into_iter().map(|r| r.following_id).collect())
    }
}

#[async_trait]
impl ObjectStore for BackendClient {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        size: u64,
        file: tokio::fs::File,
    ) -> ClientResult<()> {
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        self.upload_object(bucket, key, content_type, size, body)
            .await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.public_object_url(bucket, key)
    }
}
