//! Post command handlers.

use anyhow::{Context, Result};
use chrono::Local;
use connectify_core::{ClientError, Services};
use connectify_core::feed::PostDraft;
use connectify_core::models::{Post, PostKind, short_id};

fn print_post(post: &Post) {
    let when = post.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    println!(
        "{}  {}  {}  [{}]",
        short_id(post.id),
        when,
        post.author_label(),
        post.kind()
    );
    for line in post.content.lines() {
        println!("    {line}");
    }
    if let Some(url) = &post.media_url {
        println!("    media: {url}");
    }
}

pub async fn list(services: &Services, limit: Option<usize>) -> Result<()> {
    // Reads are allowed anonymously; a cached session only changes the token.
    services.session.current_session().await?;
    let posts = services.feed.list().await?;
    if posts.is_empty() {
        println!("No posts yet.");
        return Ok(());
    }
    for post in posts.iter().take(limit.unwrap_or(usize::MAX)) {
        print_post(post);
        println!();
    }
    Ok(())
}

pub async fn create(
    services: &Services,
    content: String,
    media: Option<&str>,
    kind: &str,
) -> Result<()> {
    let kind: PostKind = kind.parse().map_err(anyhow::Error::msg)?;
    let mut draft = PostDraft {
        content,
        media_url: None,
        kind: Some(kind),
    };
    if draft.is_blank() {
        return Err(ClientError::EmptyContent.into());
    }

    let user = services.session.require_user().await?;
    if let Some(path) = media {
        let uploaded = services
            .media
            .upload(path)
            .await
            .with_context(|| format!("upload {path}"))?;
        println!("Uploaded {} ({} bytes)", uploaded.key, uploaded.size);
        draft.media_url = Some(uploaded.public_url);
    }

    let post = services.feed.create(user.id, draft).await?;
    println!("✓ Posted {} ({})", short_id(post.id), post.kind());
    Ok(())
}

/// Deletes the caller's post matching `id` (a full id or a unique prefix).
pub async fn delete(services: &Services, id: &str) -> Result<()> {
    let user = services.session.require_user().await?;
    let needle = id.trim().to_ascii_lowercase().replace('-', "");
    if needle.is_empty() {
        anyhow::bail!("Post id cannot be empty");
    }

    let posts = services.feed.list().await?;
    let mut matches = posts
        .iter()
        .filter(|p| p.id.simple().to_string().starts_with(&needle));
    let post = matches
        .next()
        .with_context(|| format!("No post matches '{id}'"))?;
    if matches.next().is_some() {
        anyhow::bail!("'{id}' matches more than one post; use a longer prefix");
    }

    services.feed.delete(post, user.id).await?;
    println!("✓ Deleted {}", short_id(post.id));
    Ok(())
}
