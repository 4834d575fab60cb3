//! Feed page view.

use chrono::Utc;
use connectify_core::models::PostKind;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use uuid::Uuid;

use super::{FeedFocus, FeedState, PostView};
use crate::common::{TaskKind, TextField, relative_time, truncate_with_ellipsis};
use crate::state::AppState;

const COMPOSER_HEIGHT: u16 = 5;
const LABEL_WIDTH: usize = 8;

pub fn render_feed(app: &AppState, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(COMPOSER_HEIGHT), Constraint::Min(3)])
        .split(area);

    render_composer(app, frame, chunks[0]);
    render_posts(app, frame, chunks[1]);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_composer(app: &AppState, frame: &mut Frame, area: Rect) {
    let feed = &app.feed;
    let composing = matches!(feed.focus, FeedFocus::Content | FeedFocus::Media);
    let title = if app.tasks.state(TaskKind::PostSubmit).is_running() {
        format!(" New post {} ", crate::render::spinner(app.spinner_frame))
    } else {
        " New post ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(composing))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = (inner.width as usize).saturating_sub(LABEL_WIDTH + 1);
    let kinds: Vec<Span> = PostKind::all()
        .iter()
        .map(|kind| {
            let style = if *kind == feed.composer.kind {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {kind} "), style)
        })
        .collect();

    let mut kind_line = vec![Span::styled(
        format!("{:<LABEL_WIDTH$} ", "Kind"),
        Style::default().fg(Color::Gray),
    )];
    kind_line.extend(kinds);
    kind_line.push(Span::styled(
        "  Ctrl+K",
        Style::default().fg(Color::DarkGray),
    ));

    let lines = vec![
        field_line("Post", &feed.composer.content, width, "What's on your mind?"),
        field_line("Media", &feed.composer.media, width, "optional file path"),
        Line::from(kind_line),
    ];
    frame.render_widget(Paragraph::new(lines), inner);

    let cursor = match feed.focus {
        FeedFocus::Content => Some((0, &feed.composer.content)),
        FeedFocus::Media => Some((1, &feed.composer.media)),
        FeedFocus::Posts | FeedFocus::Comment => None,
    };
    if let Some((row, field)) = cursor {
        frame.set_cursor_position(Position::new(
            inner.x + (LABEL_WIDTH + 1 + field.cursor_col().min(width)) as u16,
            inner.y + row,
        ));
    }
}

fn field_line(label: &str, field: &TextField, width: usize, placeholder: &str) -> Line<'static> {
    let value = if field.is_empty() {
        Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(truncate_with_ellipsis(&field.display(), width))
    };
    Line::from(vec![
        Span::styled(
            format!("{label:<LABEL_WIDTH$} "),
            Style::default().fg(Color::Gray),
        ),
        value,
    ])
}

fn render_posts(app: &AppState, frame: &mut Frame, area: Rect) {
    let feed = &app.feed;
    let title = if app.tasks.state(TaskKind::FeedLoad).is_running() {
        format!(" Feed {} ", crate::render::spinner(app.spinner_frame))
    } else {
        format!(" Feed ({}) ", feed.posts.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(matches!(
            feed.focus,
            FeedFocus::Posts | FeedFocus::Comment
        )))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if feed.posts.is_empty() {
        let text = if feed.loaded {
            "No posts yet. Write the first one!"
        } else {
            "Loading posts…"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
            inner,
        );
        return;
    }

    let me = app.user.as_ref().map(|u| u.id);
    let width = inner.width as usize;
    let now = Utc::now();

    // Keep the selected post on screen by skipping earlier posts as needed.
    let blocks: Vec<Vec<Line<'static>>> = feed
        .posts
        .iter()
        .enumerate()
        .map(|(i, view)| post_lines(feed, view, i == feed.selected, me, width, now))
        .collect();
    let height = inner.height as usize;
    let mut start = 0;
    while start < feed.selected
        && blocks[start..=feed.selected]
            .iter()
            .map(Vec::len)
            .sum::<usize>()
            > height
    {
        start += 1;
    }

    let lines: Vec<Line<'static>> = blocks.into_iter().skip(start).flatten().collect();
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn post_lines(
    feed: &FeedState,
    view: &PostView,
    selected: bool,
    me: Option<Uuid>,
    width: usize,
    now: chrono::DateTime<Utc>,
) -> Vec<Line<'static>> {
    let post = &view.post;
    let marker = if selected { "▌" } else { " " };
    let marker_style = Style::default().fg(Color::Cyan);

    let mut header = vec![
        Span::styled(marker, marker_style),
        Span::styled(
            post.author_label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" · {}", relative_time(post.created_at, now)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(" [{}]", post.kind()),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if me == Some(post.user_id) {
        header.push(Span::styled(" (you)", Style::default().fg(Color::DarkGray)));
    } else {
        let label = if feed.pending_follows.contains(&post.user_id) {
            "…"
        } else {
            feed.follows.toggle_for(post.user_id).label()
        };
        header.push(Span::styled(
            format!("  [{label}]"),
            Style::default().fg(Color::Green),
        ));
    }

    let mut lines = vec![Line::from(header)];
    for text_line in post.content.lines() {
        lines.push(Line::from(vec![
            Span::styled(marker, marker_style),
            Span::raw(text_line.to_string()),
        ]));
    }
    if let Some(url) = &post.media_url {
        lines.push(Line::from(vec![
            Span::styled(marker, marker_style),
            Span::styled(
                truncate_with_ellipsis(&format!("📎 {url}"), width.saturating_sub(1)),
                Style::default().fg(Color::Blue),
            ),
        ]));
    }

    let heart = if view.liked { "♥" } else { "♡" };
    let comments_hint = if view.show_comments {
        "hide comments"
    } else {
        "comments"
    };
    lines.push(Line::from(vec![
        Span::styled(marker, marker_style),
        Span::styled(
            format!("{heart} {}", view.like_count()),
            Style::default().fg(Color::Red),
        ),
        Span::styled(
            format!("  💬 {} {comments_hint}", view.comments.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    if view.show_comments {
        for comment in &view.comments {
            lines.push(Line::from(vec![
                Span::styled(marker, marker_style),
                Span::styled(format!("  › {comment}"), Style::default().fg(Color::Gray)),
            ]));
        }
        if selected && feed.focus == FeedFocus::Comment {
            lines.push(Line::from(vec![
                Span::styled(marker, marker_style),
                Span::styled("  + ", Style::default().fg(Color::Cyan)),
                Span::raw(feed.comment_draft.text().to_string()),
                Span::styled("▏", Style::default().fg(Color::Cyan)),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines
}
