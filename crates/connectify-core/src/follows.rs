//! Follow relationships.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::models::FollowEdge;
use crate::ports::FollowStore;

/// Which action a target currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowToggle {
    Follow,
    Unfollow,
}

impl FollowToggle {
    pub fn label(self) -> &'static str {
        match self {
            FollowToggle::Follow => "Follow",
            FollowToggle::Unfollow => "Unfollow",
        }
    }
}

/// Ids the signed-in user follows, as known locally.
///
/// A target is either in the set (offer Unfollow) or not (offer Follow),
/// so the two toggles can never both apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSet {
    ids: HashSet<Uuid>,
}

impl FollowSet {
    pub fn contains(&self, target: Uuid) -> bool {
        self.ids.contains(&target)
    }

    pub fn toggle_for(&self, target: Uuid) -> FollowToggle {
        if self.contains(target) {
            FollowToggle::Unfollow
        } else {
            FollowToggle::Follow
        }
    }

    /// Returns false if already present.
    pub fn insert(&mut self, target: Uuid) -> bool {
        self.ids.insert(target)
    }

    /// Returns false if absent.
    pub fn remove(&mut self, target: Uuid) -> bool {
        self.ids.remove(&target)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.ids.iter()
    }
}

impl FromIterator<Uuid> for FollowSet {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    /// The local set already had the target; nothing was sent.
    AlreadyFollowing,
}

/// Reads and writes the follower/following association.
#[derive(Clone)]
pub struct RelationshipAccessor {
    store: Arc<dyn FollowStore>,
}

impl RelationshipAccessor {
    pub fn new(store: Arc<dyn FollowStore>) -> Self {
        Self { store }
    }

    /// Follows `target`, skipping the request when `known` already has it.
    ///
    /// # Errors
    /// Returns `ClientError::SelfFollow` for `follower == target`, otherwise the store's error.
    pub async fn follow(
        &self,
        follower: Uuid,
        target: Uuid,
        known: &FollowSet,
    ) -> ClientResult<FollowOutcome> {
        if follower == target {
            return Err(ClientError::SelfFollow);
        }
        if known.contains(target) {
            tracing::debug!(%target, "already following, skipping insert");
            return Ok(FollowOutcome::AlreadyFollowing);
        }
        self.store
            .insert_follow(FollowEdge {
                follower_id: follower,
                following_id: target,
            })
            .await?;
        tracing::info!(%target, "followed");
        Ok(FollowOutcome::Created)
    }

    /// # Errors
    /// Returns the store's error.
    pub async fn unfollow(&self, follower: Uuid, target: Uuid) -> ClientResult<()> {
        self.store
            .delete_follow(FollowEdge {
                follower_id: follower,
                following_id: target,
            })
            .await?;
        tracing::info!(%target, "unfollowed");
        Ok(())
    }

    /// # Errors
    /// Returns the store's error.
    pub async fn is_following(&self, follower: Uuid, target: Uuid) -> ClientResult<bool> {
        self.store
            .follow_exists(FollowEdge {
                follower_id: follower,
                following_id: target,
            })
            .await
    }

    /// Everyone `follower` follows.
    ///
    /// # Errors
    /// Returns the store's error.
    pub async fn following_of(&self, follower: Uuid) -> ClientResult<FollowSet> {
        Ok(self.store.following_of(follower).await?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::fakes::FakeFollows;

    fn alice() -> Uuid {
        Uuid::from_u128(1)
    }

    fn bob() -> Uuid {
        Uuid::from_u128(2)
    }

    #[test]
    fn test_toggle_is_exclusive() {
        let mut set = FollowSet::default();
        assert_eq!(set.toggle_for(bob()), FollowToggle::Follow);
        assert!(set.insert(bob()));
        assert!(!set.insert(bob()));
        assert_eq!(set.toggle_for(bob()), FollowToggle::Unfollow);
        assert_eq!(set.toggle_for(alice()), FollowToggle::Follow);
        assert!(set.remove(bob()));
        assert_eq!(set.toggle_for(bob()), FollowToggle::Follow);
        assert_eq!(FollowToggle::Unfollow.label(), "Unfollow");
    }

    #[tokio::test]
    async fn test_duplicate_follow_skips_insert() {
        let store = Arc::new(FakeFollows::default());
        let rel = RelationshipAccessor::new(Arc::clone(&store) as _);
        let mut known = FollowSet::default();

        assert_eq!(
            rel.follow(alice(), bob(), &known).await.unwrap(),
            FollowOutcome::Created
        );
        known.insert(bob());
        assert_eq!(
            rel.follow(alice(), bob(), &known).await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test]
    async fn test_self_follow_rejected_locally() {
        let store = Arc::new(FakeFollows::default());
        let rel = RelationshipAccessor::new(Arc::clone(&store) as _);
        let err = rel
            .follow(alice(), alice(), &FollowSet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::SelfFollow));
        assert_eq!(store.inserts(), 0);
    }

    #[tokio::test]
    async fn test_membership_and_unfollow() {
        let store = Arc::new(FakeFollows::default());
        let rel = RelationshipAccessor::new(Arc::clone(&store) as _);

        rel.follow(alice(), bob(), &FollowSet::default())
            .await
            .unwrap();
        assert!(rel.is_following(alice(), bob()).await.unwrap());
        assert!(!rel.is_following(bob(), alice()).await.unwrap());
        assert!(rel.following_of(alice()).await.unwrap().contains(bob()));

        rel.unfollow(alice(), bob()).await.unwrap();
        assert!(!rel.is_following(alice(), bob()).await.unwrap());
        assert!(rel.following_of(alice()).await.unwrap().is_empty());
    }
}
