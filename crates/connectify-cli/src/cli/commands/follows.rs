//! Follow command handlers.

use anyhow::Result;
use connectify_core::{ClientError, Services};
use connectify_core::follows::FollowOutcome;
use uuid::Uuid;

pub async fn follow(services: &Services, target: Uuid) -> Result<()> {
    let user = services.session.require_user().await?;
    if target == user.id {
        return Err(ClientError::SelfFollow.into());
    }
    let known = services.follows.following_of(user.id).await?;
    match services.follows.follow(user.id, target, &known).await? {
        FollowOutcome::Created => println!("✓ Following {target}"),
        FollowOutcome::AlreadyFollowing => println!("Already following {target}"),
    }
    Ok(())
}

pub async fn unfollow(services: &Services, target: Uuid) -> Result<()> {
    let user = services.session.require_user().await?;
    services.follows.unfollow(user.id, target).await?;
    println!("✓ Unfollowed {target}");
    Ok(())
}

pub async fn following(services: &Services) -> Result<()> {
    let user = services.session.require_user().await?;
    let follows = services.follows.following_of(user.id).await?;
    if follows.is_empty() {
        println!("Not following anyone yet.");
        return Ok(());
    }
    let mut ids: Vec<&Uuid> = follows.iter().collect();
    ids.sort();
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
