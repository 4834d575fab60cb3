//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use connectify_core::session::AuthChange;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::common::TaskKind;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::feed::{self, FeedState};
use crate::features::login;
use crate::state::{AppState, Page};

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            app.terminal_size = (width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::TaskStarted { kind, started } => {
            app.tasks.state_mut(kind).on_started(&started);
            vec![]
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.tasks.state_mut(kind).finish_if_active(completed.id) {
                update(app, *completed.result)
            } else {
                vec![]
            }
        }
        UiEvent::Auth(change) => handle_auth_change(app, change),
        UiEvent::Login(event) => login::handle_login_event(app, event),
        UiEvent::Feed(event) => feed::handle_feed_event(app, event),
    }
}

/// Replaces the local user with the one carried by `change` and derives the
/// page from it.
fn handle_auth_change(app: &mut AppState, change: AuthChange) -> Vec<UiEffect> {
    let previous = app.user.as_ref().map(|u| u.id);
    app.user = change.session.map(|s| s.user);

    let Some(user_id) = app.user.as_ref().map(|u| u.id) else {
        app.page = Page::Login;
        app.feed = FeedState::default();
        app.tasks.clear_all();
        return vec![];
    };

    app.login.reset_after_sign_in();
    app.tasks.state_mut(TaskKind::Auth).clear();
    if app.page == Page::Feed && previous == Some(user_id) {
        // Token refresh for the same user.
        return vec![];
    }
    app.page = Page::Feed;
    app.feed = FeedState::default();
    app.status = None;
    feed::reload(app)
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            match app.page {
                Page::Login => login::handle_paste(&mut app.login, &text),
                Page::Feed => feed::handle_paste(&mut app.feed, &text),
                Page::Loading => {}
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![UiEffect::Quit];
    }
    match app.page {
        Page::Loading => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => vec![UiEffect::Quit],
            _ => vec![],
        },
        Page::Login => login::handle_key(app, key),
        Page::Feed => feed::handle_key(app, key),
    }
}
