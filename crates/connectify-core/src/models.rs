//! Rows and payloads exchanged with the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds before the absolute expiry at which a session counts as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Display metadata the auth provider stores next to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A signed-in identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl User {
    /// Best human-readable name: full name, provider name, email, then id.
    pub fn display_name(&self) -> String {
        self.user_metadata
            .full_name
            .as_deref()
            .or(self.user_metadata.name.as_deref())
            .or(self.email.as_deref())
            .map_or_else(|| short_id(self.id), str::to_string)
    }
}

/// Tokens for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Absolute expiry in seconds since the epoch.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Fills `expires_at` from `expires_in` when the backend omitted it.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(Utc::now().timestamp() + self.expires_in);
        }
        self
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub(crate) fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(at) => now >= at - EXPIRY_SKEW_SECS,
            None => false,
        }
    }
}

/// Public profile row joined onto posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Tag attached to a post by the composer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Post,
    Event,
    Article,
}

impl PostKind {
    pub fn all() -> &'static [PostKind] {
        &[PostKind::Post, PostKind::Event, PostKind::Article]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Post => "post",
            PostKind::Event => "event",
            PostKind::Article => "article",
        }
    }

    /// Next kind in composer cycle order.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            PostKind::Post => PostKind::Event,
            PostKind::Event => PostKind::Article,
            PostKind::Article => PostKind::Post,
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(PostKind::Post),
            "event" => Ok(PostKind::Event),
            "article" => Ok(PostKind::Article),
            other => Err(format!(
                "unknown post kind '{other}' (expected post, event or article)"
            )),
        }
    }
}

/// A feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub post_type: Option<PostKind>,
    pub created_at: DateTime<Utc>,
    /// Author profile, present only when the list query joined it.
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub author: Option<Profile>,
}

impl Post {
    /// Author label: profile name when joined, else a short id.
    pub fn author_label(&self) -> String {
        self.author
            .as_ref()
            .and_then(|p| p.full_name.as_deref().or(p.username.as_deref()))
            .map_or_else(|| short_id(self.user_id), str::to_string)
    }

    pub fn kind(&self) -> PostKind {
        self.post_type.unwrap_or_default()
    }
}

/// Insert payload for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub user_id: Uuid,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostKind>,
}

/// Row of the follower/following association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub following_id: Uuid,
}

/// First eight characters of an id, for compact display.
pub fn short_id(id: Uuid) -> String {
    let mut s = id.simple().to_string();
    s.truncate(8);
    s
}
