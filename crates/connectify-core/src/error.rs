//! Error type shared by the session observer and the data accessors.
//!
//! Backend failures are grouped into three categories (auth, data, upload).
//! Local validation failures never reach the network and carry their own
//! variants so callers can tell "rejected before sending" apart from
//! "rejected by the backend".

use thiserror::Error;

/// Broad failure category, used to pick the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Data,
    Upload,
    Validation,
}

/// Errors produced by the Connectify client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The auth endpoint rejected the request.
    #[error("auth error (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// The table endpoint rejected the request.
    #[error("data error (HTTP {status}): {message}")]
    Data { status: u16, message: String },

    /// The storage endpoint rejected the upload.
    #[error("upload error (HTTP {status}): {message}")]
    Upload { status: u16, message: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// An upload never produced a response.
    #[error("upload request failed: {0}")]
    UploadTransport(#[source] reqwest::Error),

    /// An operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// Post content was empty or whitespace only.
    #[error("post content is empty")]
    EmptyContent,

    /// Delete attempted by someone other than the author.
    #[error("only the author can delete this post")]
    NotAuthor,

    /// A user tried to follow themselves.
    #[error("cannot follow yourself")]
    SelfFollow,

    /// File is not below the configured upload ceiling.
    #[error("file is {size} bytes, uploads must be under {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// Local file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The session cache could not be read or written.
    #[error("session cache: {0}")]
    SessionCache(String),
}

impl ClientError {
    /// Returns the category used for user-facing messages.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Auth { .. } | ClientError::NotSignedIn | ClientError::SessionCache(_) => {
                ErrorCategory::Auth
            }
            ClientError::Data { .. } | ClientError::Transport(_) => ErrorCategory::Data,
            ClientError::Upload { .. }
            | ClientError::UploadTransport(_)
            | ClientError::Io { .. } => ErrorCategory::Upload,
            ClientError::EmptyContent
            | ClientError::NotAuthor
            | ClientError::SelfFollow
            | ClientError::FileTooLarge { .. } => ErrorCategory::Validation,
        }
    }

    /// Short message suitable for an inline status line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Auth { message, .. } => format!("Sign-in problem: {message}"),
            ClientError::Data { message, .. } => format!("Could not reach the feed: {message}"),
            ClientError::Upload { message, .. } => format!("Upload failed: {message}"),
            ClientError::Transport(_) => "Network error, try again.".to_string(),
            ClientError::UploadTransport(_) => {
                "Upload failed: network error, try again.".to_string()
            }
            ClientError::NotSignedIn => "You must be logged in to post".to_string(),
            ClientError::EmptyContent => "Write something first.".to_string(),
            ClientError::NotAuthor => "You can only delete your own posts.".to_string(),
            ClientError::SelfFollow => "You can't follow yourself.".to_string(),
            ClientError::FileTooLarge { limit, .. } => {
                format!("File is too large (limit {}).", format_bytes(*limit))
            }
            ClientError::Io { path, .. } => format!("Cannot read {path}."),
            ClientError::SessionCache(_) => "Could not save your session.".to_string(),
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

fn format_bytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}
