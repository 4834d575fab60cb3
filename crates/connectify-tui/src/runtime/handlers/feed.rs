//! Feed handlers: list, post, delete and follow requests.
//!
//! Each handler reads the session first, so an access token past its expiry
//! is refreshed before the request goes out. A rejected refresh emits
//! `SignedOut`, which the reducer routes back to the login page, and the
//! pending write is dropped with `NotSignedIn`.

use std::sync::Arc;

use connectify_core::feed::{FeedAccessor, PostDraft};
use connectify_core::follows::{FollowSet, RelationshipAccessor};
use connectify_core::media::MediaUploader;
use connectify_core::session::SessionManager;
use connectify_core::{ClientError, ClientResult};
use uuid::Uuid;

use crate::events::{FeedUiEvent, UiEvent};

fn to_message<T>(context: &str, result: ClientResult<T>) -> Result<T, String> {
    result.map_err(|err| {
        tracing::warn!(error = %err, "{context}");
        err.user_message()
    })
}

/// Refreshes the access token when it is about to expire.
async fn fresh_token(session: &SessionManager) -> ClientResult<()> {
    session.current_session().await.map(|_| ())
}

/// Like [`fresh_token`], but fails when no user is signed in anymore.
async fn signed_in(session: &SessionManager) -> ClientResult<()> {
    session.require_user().await.map(|_| ())
}

pub async fn load_feed(session: Arc<SessionManager>, feed: FeedAccessor) -> UiEvent {
    let result = async {
        fresh_token(&session).await?;
        feed.list().await
    }
    .await;
    UiEvent::Feed(FeedUiEvent::Loaded(to_message("feed load failed", result)))
}

pub async fn load_follows(
    session: Arc<SessionManager>,
    follows: RelationshipAccessor,
    user_id: Uuid,
) -> UiEvent {
    let result = async {
        fresh_token(&session).await?;
        follows.following_of(user_id).await
    }
    .await;
    UiEvent::Feed(FeedUiEvent::FollowsLoaded(to_message(
        "follow list failed",
        result,
    )))
}

/// Uploads the attachment (if any) and creates the post that points at it.
pub async fn submit_post(
    session: Arc<SessionManager>,
    feed: FeedAccessor,
    media: MediaUploader,
    author_id: Uuid,
    mut draft: PostDraft,
    media_path: Option<String>,
) -> UiEvent {
    let result = async {
        if draft.is_blank() {
            return Err(ClientError::EmptyContent);
        }
        signed_in(&session).await?;
        if let Some(path) = media_path {
            draft.media_url = Some(media.upload(&path).await?.public_url);
        }
        feed.create(author_id, draft).await
    }
    .await;
    UiEvent::Feed(FeedUiEvent::Submitted(to_message("post failed", result)))
}

pub async fn delete_post(
    session: Arc<SessionManager>,
    feed: FeedAccessor,
    post_id: Uuid,
    author_id: Uuid,
    caller_id: Uuid,
) -> UiEvent {
    let result = async {
        if author_id != caller_id {
            return Err(ClientError::NotAuthor);
        }
        signed_in(&session).await?;
        feed.delete_by_id(post_id, author_id, caller_id).await
    }
    .await;
    UiEvent::Feed(FeedUiEvent::Deleted {
        post_id,
        result: to_message("delete failed", result),
    })
}

pub async fn follow(
    session: Arc<SessionManager>,
    follows: RelationshipAccessor,
    follower: Uuid,
    target: Uuid,
    known: FollowSet,
) -> UiEvent {
    let result = async {
        signed_in(&session).await?;
        follows.follow(follower, target, &known).await.map(|_| ())
    }
    .await;
    UiEvent::Feed(FeedUiEvent::Followed {
        target,
        result: to_message("follow failed", result),
    })
}

pub async fn unfollow(
    session: Arc<SessionManager>,
    follows: RelationshipAccessor,
    follower: Uuid,
    target: Uuid,
) -> UiEvent {
    let result = async {
        signed_in(&session).await?;
        follows.unfollow(follower, target).await
    }
    .await;
    UiEvent::Feed(FeedUiEvent::Unfollowed {
        target,
        result: to_message("unfollow failed", result),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use connectify_core::Services;
    use connectify_core::config::Config;
    use connectify_core::models::{Session, User, UserMetadata};
    use connectify_core::session::SessionStore;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const ALICE: &str = "7f1d2a4e-0000-4000-8000-000000000001";

    fn services_at(dir: &std::path::Path, backend_url: &str) -> Services {
        let config = Config {
            backend_url: Some(backend_url.to_string()),
            anon_key: Some("anon".to_string()),
            ..Config::default()
        };
        Services::with_store(&config, SessionStore::new(dir.join("session.json"))).unwrap()
    }

    fn services(dir: &std::path::Path) -> Services {
        // Nothing listens on port 9; any request that is sent fails.
        services_at(dir, "http://127.0.0.1:9")
    }

    /// Caches a session for Alice expiring at `expires_at`.
    fn cache_session(dir: &std::path::Path, expires_at: i64) {
        let session = Session {
            access_token: "stale".to_string(),
            refresh_token: "refresh-1".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some(expires_at),
            user: User {
                id: Uuid::parse_str(ALICE).unwrap(),
                email: Some("ada@example.com".to_string()),
                user_metadata: UserMetadata::default(),
            },
        };
        SessionStore::new(dir.join("session.json"))
            .save(&session)
            .unwrap();
    }

    /// Alice's session is already inside the expiry skew.
    fn cache_expiring_session(dir: &std::path::Path) {
        cache_session(dir, chrono::Utc::now().timestamp() + 30);
    }

    fn cache_valid_session(dir: &std::path::Path) {
        cache_session(dir, chrono::Utc::now().timestamp() + 86_400);
    }

    fn submitted_error(event: UiEvent) -> String {
        match event {
            UiEvent::Feed(FeedUiEvent::Submitted(Err(message))) => message,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_blank_draft_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let s = services(dir.path());
        let event = submit_post(
            s.session,
            s.feed,
            s.media,
            Uuid::from_u128(1),
            PostDraft::text("  "),
            None,
        )
        .await;
        assert_eq!(
            submitted_error(event),
            ClientError::EmptyContent.user_message()
        );
    }

    #[tokio::test]
    async fn test_oversized_media_stops_the_post() {
        let dir = tempfile::tempdir().unwrap();
        cache_valid_session(dir.path());
        let s = services(dir.path());
        let path = dir.path().join("big.png");
        let mut file = std::fs::File::create(&path).unwrap();
        let limit = s.media.max_bytes();
        file.write_all(&vec![0u8; usize::try_from(limit + 1).unwrap()])
            .unwrap();

        let event = submit_post(
            s.session,
            s.feed,
            s.media,
            Uuid::from_u128(1),
            PostDraft::text("look"),
            Some(path.display().to_string()),
        )
        .await;
        let message = submitted_error(event);
        assert!(message.contains("too large"), "{message}");
    }

    #[tokio::test]
    async fn test_delete_foreign_post_reports_not_author() {
        let dir = tempfile::tempdir().unwrap();
        let s = services(dir.path());
        let post_id = Uuid::from_u128(7);
        let event = delete_post(s.session, s.feed, post_id, Uuid::from_u128(1), Uuid::from_u128(2)).await;
        match event {
            UiEvent::Feed(FeedUiEvent::Deleted { post_id: id, result }) => {
                assert_eq!(id, post_id);
                assert_eq!(result, Err(ClientError::NotAuthor.user_message()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_known_target_succeeds_without_request() {
        let dir = tempfile::tempdir().unwrap();
        cache_valid_session(dir.path());
        let s = services(dir.path());
        let target = Uuid::from_u128(2);
        let known: FollowSet = [target].into_iter().collect();
        let event = follow(s.session, s.follows, Uuid::from_u128(1), target, known).await;
        assert!(matches!(
            event,
            UiEvent::Feed(FeedUiEvent::Followed { result: Ok(()), .. })
        ));
    }

    #[tokio::test]
    async fn test_load_feed_refreshes_expiring_token_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "refresh_token": "refresh-2",
                "token_type": "bearer",
                "expires_in": 3600,
                "user": { "id": ALICE, "email": "ada@example.com" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/posts"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        cache_expiring_session(dir.path());
        let s = services_at(dir.path(), &server.uri());
        let mut changes = s.session.on_auth_state_change();

        let event = load_feed(Arc::clone(&s.session), s.feed.clone()).await;
        match event {
            UiEvent::Feed(FeedUiEvent::Loaded(Ok(posts))) => assert!(posts.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
        let change = changes.try_recv().unwrap();
        assert_eq!(
            change.event,
            connectify_core::session::AuthEvent::TokenRefreshed
        );

        // The refreshed token is reused; no second refresh.
        load_feed(Arc::clone(&s.session), s.feed.clone()).await;
    }

    #[tokio::test]
    async fn test_rejected_refresh_signs_out_before_follow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/follows"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        cache_expiring_session(dir.path());
        let s = services_at(dir.path(), &server.uri());
        let mut changes = s.session.on_auth_state_change();

        let event = follow(
            Arc::clone(&s.session),
            s.follows.clone(),
            Uuid::parse_str(ALICE).unwrap(),
            Uuid::from_u128(2),
            FollowSet::default(),
        )
        .await;
        assert!(matches!(
            event,
            UiEvent::Feed(FeedUiEvent::Followed { result: Err(message), .. })
                if message == ClientError::NotSignedIn.user_message()
        ));
        let change = changes.try_recv().unwrap();
        assert_eq!(change.event, connectify_core::session::AuthEvent::SignedOut);
        assert!(s.session.snapshot().is_none());
    }
}
