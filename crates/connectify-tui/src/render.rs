//! Pure view functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::common::truncate_with_ellipsis;
use crate::features::feed::{FeedFocus, render_feed};
use crate::features::login::render_login;
use crate::state::{AppState, Page, StatusLevel};

const HEADER_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 1;

/// Spinner frames for in-progress requests.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Spinner glyph for the given tick count.
pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[(frame / 4) % SPINNER_FRAMES.len()]
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    render_header(app, frame, chunks[0]);
    match app.page {
        Page::Loading => render_loading(app, frame, chunks[1]),
        Page::Login => render_login(app, frame, chunks[1]),
        Page::Feed => render_feed(app, frame, chunks[1]),
    }
    render_status_line(app, frame, chunks[2]);
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " Connectify ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(user) = &app.user {
        spans.push(Span::styled(
            format!(" {}", user.display_name()),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_loading(app: &AppState, frame: &mut Frame, area: Rect) {
    let y = area.y + area.height / 2;
    let line = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
    frame.render_widget(
        Paragraph::new(format!("{} Loading…", spinner(app.spinner_frame)))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        line,
    );
}

fn key_hints(app: &AppState) -> &'static str {
    match app.page {
        Page::Loading => "Esc quit",
        Page::Login => "",
        Page::Feed => match app.feed.focus {
            FeedFocus::Content | FeedFocus::Media => {
                "Enter post · Tab switch · Ctrl+K kind · Ctrl+R reload · Ctrl+O sign out"
            }
            FeedFocus::Posts => {
                "↑↓ select · f follow · l like · c comments · a comment · d delete · o open · r reload · q quit"
            }
            FeedFocus::Comment => "Enter add comment · Esc cancel",
        },
    }
}

fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let width = area.width as usize;
    let line = match &app.status {
        Some(status) => {
            let color = match status.level {
                StatusLevel::Info => Color::Green,
                StatusLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                truncate_with_ellipsis(&status.text, width),
                Style::default().fg(color),
            ))
        }
        None => Line::from(Span::styled(
            truncate_with_ellipsis(key_hints(app), width),
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}
