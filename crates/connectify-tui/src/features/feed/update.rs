//! Feed page reducer.

use connectify_core::ClientError;
use connectify_core::feed::PostDraft;
use connectify_core::follows::FollowToggle;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{FeedFocus, FeedState};
use crate::common::TaskKind;
use crate::effects::UiEffect;
use crate::events::FeedUiEvent;
use crate::state::AppState;

pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('r') if ctrl => return reload(app),
        KeyCode::Char('o') if ctrl => return vec![UiEffect::SignOut],
        KeyCode::Char('k') if ctrl => {
            let composer = &mut app.feed.composer;
            composer.kind = composer.kind.next();
            return vec![];
        }
        KeyCode::Tab if app.feed.focus != FeedFocus::Comment => {
            app.feed.focus = match app.feed.focus {
                FeedFocus::Content => FeedFocus::Media,
                FeedFocus::Media => FeedFocus::Posts,
                FeedFocus::Posts | FeedFocus::Comment => FeedFocus::Content,
            };
            return vec![];
        }
        KeyCode::BackTab if app.feed.focus != FeedFocus::Comment => {
            app.feed.focus = match app.feed.focus {
                FeedFocus::Content | FeedFocus::Comment => FeedFocus::Posts,
                FeedFocus::Media => FeedFocus::Content,
                FeedFocus::Posts => FeedFocus::Media,
            };
            return vec![];
        }
        _ => {}
    }

    match app.feed.focus {
        FeedFocus::Content | FeedFocus::Media => match key.code {
            KeyCode::Enter => submit(app),
            KeyCode::Esc => {
                app.feed.focus = FeedFocus::Posts;
                vec![]
            }
            _ => {
                let composer = &mut app.feed.composer;
                let field = if app.feed.focus == FeedFocus::Content {
                    &mut composer.content
                } else {
                    &mut composer.media
                };
                field.input(key);
                vec![]
            }
        },
        FeedFocus::Posts => handle_posts_key(app, key),
        FeedFocus::Comment => match key.code {
            KeyCode::Enter => {
                add_comment(&mut app.feed);
                vec![]
            }
            KeyCode::Esc => {
                app.feed.comment_draft.clear();
                app.feed.focus = FeedFocus::Posts;
                vec![]
            }
            _ => {
                app.feed.comment_draft.input(key);
                vec![]
            }
        },
    }
}

pub fn handle_paste(feed: &mut FeedState, text: &str) {
    match feed.focus {
        FeedFocus::Content => feed.composer.content.insert_str(text),
        FeedFocus::Media => feed.composer.media.insert_str(text),
        FeedFocus::Comment => feed.comment_draft.insert_str(text),
        FeedFocus::Posts => {}
    }
}

fn handle_posts_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => vec![UiEffect::Quit],
        KeyCode::Up | KeyCode::Char('k') => {
            app.feed.selected = app.feed.selected.saturating_sub(1);
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.feed.selected + 1 < app.feed.posts.len() {
                app.feed.selected += 1;
            }
            vec![]
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.feed.selected = 0;
            vec![]
        }
        KeyCode::End | KeyCode::Char('G') => {
            app.feed.selected = app.feed.posts.len().saturating_sub(1);
            vec![]
        }
        KeyCode::Char('r') => reload(app),
        KeyCode::Char('d') => delete_selected(app),
        KeyCode::Char('f') => toggle_follow(app),
        KeyCode::Char('l') => {
            if let Some(view) = app.feed.selected_post_mut() {
                view.liked = !view.liked;
            }
            vec![]
        }
        KeyCode::Char('c') => {
            if let Some(view) = app.feed.selected_post_mut() {
                view.show_comments = !view.show_comments;
            }
            vec![]
        }
        KeyCode::Char('a') => {
            if let Some(view) = app.feed.selected_post_mut() {
                view.show_comments = true;
                app.feed.focus = FeedFocus::Comment;
            }
            vec![]
        }
        KeyCode::Char('o') => match app
            .feed
            .selected_post()
            .and_then(|v| v.post.media_url.clone())
        {
            Some(url) => vec![UiEffect::OpenUrl { url }],
            None => vec![],
        },
        _ => vec![],
    }
}

/// Effects that load the feed and the follow-set for the signed-in user.
pub(crate) fn reload(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = vec![UiEffect::LoadFeed {
        task: app.task_seq.next_id(),
    }];
    if let Some(user) = &app.user {
        effects.push(UiEffect::LoadFollows {
            task: app.task_seq.next_id(),
            user_id: user.id,
        });
    }
    effects
}

fn submit(app: &mut AppState) -> Vec<UiEffect> {
    let Some(author_id) = app.user.as_ref().map(|u| u.id) else {
        app.error(ClientError::NotSignedIn.user_message());
        return vec![];
    };
    if app.tasks.state(TaskKind::PostSubmit).is_running() {
        return vec![];
    }

    let composer = &app.feed.composer;
    let draft = PostDraft {
        content: composer.content.text().to_string(),
        media_url: None,
        kind: Some(composer.kind),
    };
    if draft.is_blank() {
        app.error(ClientError::EmptyContent.user_message());
        return vec![];
    }
    let media_path = Some(composer.media.text().trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    app.status = None;
    vec![UiEffect::SubmitPost {
        task: app.task_seq.next_id(),
        author_id,
        draft,
        media_path,
    }]
}

fn delete_selected(app: &mut AppState) -> Vec<UiEffect> {
    let (Some(user), Some(view)) = (&app.user, app.feed.selected_post()) else {
        return vec![];
    };
    if view.post.user_id != user.id {
        let message = ClientError::NotAuthor.user_message();
        app.error(message);
        return vec![];
    }
    vec![UiEffect::DeletePost {
        post_id: view.post.id,
        author_id: view.post.user_id,
        caller_id: user.id,
    }]
}

fn toggle_follow(app: &mut AppState) -> Vec<UiEffect> {
    let (Some(user), Some(view)) = (&app.user, app.feed.selected_post()) else {
        return vec![];
    };
    let follower = user.id;
    let target = view.post.user_id;
    if target == follower {
        app.error(ClientError::SelfFollow.user_message());
        return vec![];
    }
    if !app.feed.pending_follows.insert(target) {
        return vec![];
    }
    match app.feed.follows.toggle_for(target) {
        FollowToggle::Follow => vec![UiEffect::Follow {
            follower,
            target,
            known: app.feed.follows.clone(),
        }],
        FollowToggle::Unfollow => vec![UiEffect::Unfollow { follower, target }],
    }
}

fn add_comment(feed: &mut FeedState) {
    let text = feed.comment_draft.text().trim().to_string();
    if !text.is_empty()
        && let Some(view) = feed.selected_post_mut()
    {
        view.comments.push(text);
    }
    feed.comment_draft.clear();
    feed.focus = FeedFocus::Posts;
}

pub fn handle_feed_event(app: &mut AppState, event: FeedUiEvent) -> Vec<UiEffect> {
    match event {
        FeedUiEvent::Loaded(Ok(posts)) => {
            app.feed.replace_posts(posts);
            vec![]
        }
        FeedUiEvent::FollowsLoaded(Ok(follows)) => {
            app.feed.follows = follows;
            vec![]
        }
        FeedUiEvent::Submitted(Ok(post)) => {
            app.feed.composer.clear();
            app.info(format!("Posted as {}.", post.kind()));
            vec![UiEffect::LoadFeed {
                task: app.task_seq.next_id(),
            }]
        }
        FeedUiEvent::Deleted {
            post_id,
            result: Ok(()),
        } => {
            app.feed.remove_post(post_id);
            app.info("Post deleted.");
            vec![]
        }
        FeedUiEvent::Followed { target, result } => {
            app.feed.pending_follows.remove(&target);
            match result {
                Ok(()) => {
                    app.feed.follows.insert(target);
                }
                Err(error) => app.error(error),
            }
            vec![]
        }
        FeedUiEvent::Unfollowed { target, result } => {
            app.feed.pending_follows.remove(&target);
            match result {
                Ok(()) => {
                    app.feed.follows.remove(target);
                }
                Err(error) => app.error(error),
            }
            vec![]
        }
        FeedUiEvent::Loaded(Err(error))
        | FeedUiEvent::FollowsLoaded(Err(error))
        | FeedUiEvent::Submitted(Err(error))
        | FeedUiEvent::Deleted {
            result: Err(error), ..
        } => {
            app.error(error);
            vec![]
        }
    }
}
