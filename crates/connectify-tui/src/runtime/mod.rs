//! TUI runtime: owns the terminal, runs the event loop and executes effects.
//!
//! All side effects happen here. The reducer stays pure and produces
//! effects; handlers perform the requests and report back through the inbox.
//!
//! Session changes reach the reducer the same way: a background task
//! forwards every `AuthChange` from the session manager into the inbox for
//! as long as the runtime lives.

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use connectify_core::Services;
use connectify_core::oauth::OAuthFlow;
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::{TaskCompleted, TaskId, TaskKind, TaskMeta, TaskStarted};
use crate::effects::UiEffect;
use crate::events::{LoginUiEvent, UiEvent};
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick cadence while a request is in flight (spinner animation).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    services: Services,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    /// Forwards session changes into the inbox; aborted on drop.
    auth_forwarder: JoinHandle<()>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Creates the runtime and subscribes to session changes.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(services: Services) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let state = AppState::new(&services.config);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let auth_forwarder = spawn_auth_forwarder(&services, inbox_tx.clone());

        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            services,
            inbox_tx,
            inbox_rx,
            auth_forwarder,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal input fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;

        let task = self.state.task_seq.next_id();
        self.execute_effect(UiEffect::InitSession { task });
        let result = self.event_loop();

        let _ = terminal::disable_input_features();
        // Stops any browser sign-in still listening for its callback.
        self.state.tasks.clear_all();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Only Tick triggers render; input is batched to the next Tick.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let needs_fast_poll = self.state.tasks.is_any_running()
            || !self.state.feed.pending_follows.is_empty()
            || self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns a handler whose result goes straight to the reducer.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    /// Spawns a handler with a TaskStarted/TaskCompleted lifecycle, so only
    /// the latest task of each kind is applied.
    fn spawn_task<F, Fut>(&self, kind: TaskKind, id: TaskId, meta: TaskMeta, cancelable: bool, f: F)
    where
        F: FnOnce(Option<CancellationToken>) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let cancel = cancelable.then(CancellationToken::new);
        let started = TaskStarted {
            id,
            cancel: cancel.clone(),
            meta,
        };
        let _ = tx.send(UiEvent::TaskStarted { kind, started });
        tokio::spawn(async move {
            let inner = f(cancel).await;
            let completed = TaskCompleted {
                id,
                result: Box::new(inner),
            };
            let _ = tx.send(UiEvent::TaskCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::OpenUrl { url } => {
                if let Err(err) = open::that(&url) {
                    tracing::warn!(error = %err, %url, "could not open url");
                    self.state.error(format!("Could not open {url}"));
                }
            }

            // Session effects
            UiEffect::InitSession { task } => {
                let session = Arc::clone(&self.services.session);
                self.spawn_task(
                    TaskKind::SessionInit,
                    task,
                    TaskMeta::None,
                    false,
                    move |_| handlers::auth::init_session(session),
                );
            }
            UiEffect::SignIn {
                task,
                email,
                password,
            } => {
                let session = Arc::clone(&self.services.session);
                let meta = TaskMeta::Auth {
                    label: "Signing in",
                };
                self.spawn_task(TaskKind::Auth, task, meta, false, move |_| {
                    handlers::auth::sign_in(session, email, password)
                });
            }
            UiEffect::SignUp {
                task,
                email,
                password,
                full_name,
            } => {
                let session = Arc::clone(&self.services.session);
                let meta = TaskMeta::Auth {
                    label: "Creating account",
                };
                self.spawn_task(TaskKind::Auth, task, meta, false, move |_| {
                    handlers::auth::sign_up(session, email, password, full_name)
                });
            }
            UiEffect::StartOAuth { task } => {
                let auth = &self.services.config.auth;
                let flow = OAuthFlow::new(
                    &self.services.client,
                    &auth.oauth_provider,
                    auth.callback_port,
                );
                let url = flow.url.clone();
                tracing::info!(provider = %auth.oauth_provider, port = flow.port, "starting browser sign-in");

                let session = Arc::clone(&self.services.session);
                let meta = TaskMeta::Auth {
                    label: "Waiting for browser",
                };
                self.spawn_task(TaskKind::Auth, task, meta, true, move |cancel| {
                    handlers::auth::oauth_sign_in(session, flow, cancel)
                });
                if let Err(err) = open::that(&url) {
                    tracing::warn!(error = %err, "could not open browser");
                }
                self.dispatch_event(UiEvent::Login(LoginUiEvent::OAuthStarted { url }));
            }
            UiEffect::SignOut => {
                let session = Arc::clone(&self.services.session);
                self.spawn_effect(move || handlers::auth::sign_out(session));
            }

            // Feed effects
            UiEffect::LoadFeed { task } => {
                let session = Arc::clone(&self.services.session);
                let feed = self.services.feed.clone();
                self.spawn_task(TaskKind::FeedLoad, task, TaskMeta::None, false, move |_| {
                    handlers::feed::load_feed(session, feed)
                });
            }
            UiEffect::LoadFollows { task, user_id } => {
                let session = Arc::clone(&self.services.session);
                let follows = self.services.follows.clone();
                self.spawn_task(
                    TaskKind::FollowsLoad,
                    task,
                    TaskMeta::None,
                    false,
                    move |_| handlers::feed::load_follows(session, follows, user_id),
                );
            }
            UiEffect::SubmitPost {
                task,
                author_id,
                draft,
                media_path,
            } => {
                let session = Arc::clone(&self.services.session);
                let feed = self.services.feed.clone();
                let media = self.services.media.clone();
                self.spawn_task(
                    TaskKind::PostSubmit,
                    task,
                    TaskMeta::None,
                    false,
                    move |_| {
                        handlers::feed::submit_post(
                            session, feed, media, author_id, draft, media_path,
                        )
                    },
                );
            }
            UiEffect::DeletePost {
                post_id,
                author_id,
                caller_id,
            } => {
                let session = Arc::clone(&self.services.session);
                let feed = self.services.feed.clone();
                self.spawn_effect(move || {
                    handlers::feed::delete_post(session, feed, post_id, author_id, caller_id)
                });
            }
            UiEffect::Follow {
                follower,
                target,
                known,
            } => {
                let session = Arc::clone(&self.services.session);
                let follows = self.services.follows.clone();
                self.spawn_effect(move || {
                    handlers::feed::follow(session, follows, follower, target, known)
                });
            }
            UiEffect::Unfollow { follower, target } => {
                let session = Arc::clone(&self.services.session);
                let follows = self.services.follows.clone();
                self.spawn_effect(move || {
                    handlers::feed::unfollow(session, follows, follower, target)
                });
            }
        }
    }
}

/// Forwards session changes into the inbox until the subscription ends.
fn spawn_auth_forwarder(services: &Services, tx: UiEventSender) -> JoinHandle<()> {
    let mut subscription = services.session.on_auth_state_change();
    tokio::spawn(async move {
        while let Some(change) = subscription.recv().await {
            tracing::debug!(event = ?change.event, "session change");
            if tx.send(UiEvent::Auth(change)).is_err() {
                break;
            }
        }
    })
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        // Dropping the subscription unregisters it from the session manager.
        self.auth_forwarder.abort();
        let _ = terminal::restore_terminal();
    }
}
