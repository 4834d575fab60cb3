//! Login page view.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::{LoginField, LoginMode, LoginState};
use crate::common::{TaskKind, TaskMeta, truncate_with_ellipsis};
use crate::state::AppState;

const PANEL_WIDTH: u16 = 60;
const LABEL_WIDTH: usize = 11;

pub fn render_login(app: &AppState, frame: &mut Frame, area: Rect) {
    let login = &app.login;
    let width = PANEL_WIDTH.min(area.width);
    let fields = login.fields();
    let height = (fields.len() as u16 + 9).min(area.height);
    let panel = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + area.height.saturating_sub(height) / 3,
        width,
        height,
    );

    let title = match login.mode {
        LoginMode::SignIn => " Sign in ",
        LoginMode::SignUp => " Create account ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let value_width = (inner.width as usize).saturating_sub(LABEL_WIDTH + 1);
    let mut lines = vec![Line::from("")];
    for field in fields {
        lines.push(field_line(login, *field, value_width));
    }
    lines.push(Line::from(""));

    let auth = app.tasks.state(TaskKind::Auth);
    if let TaskMeta::Auth { label } = &auth.meta {
        let spinner = crate::render::spinner(app.spinner_frame);
        lines.push(Line::from(Span::styled(
            format!("{spinner} {label}…"),
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &login.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(notice) = &login.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(""));
    }
    if let Some(url) = &login.oauth_url {
        lines.push(Line::from(Span::styled(
            truncate_with_ellipsis(url, inner.width as usize),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let mode_hint = match login.mode {
        LoginMode::SignIn => "Ctrl+S sign up",
        LoginMode::SignUp => "Ctrl+S sign in",
    };
    lines.push(Line::from(Span::styled(
        format!(
            "Enter submit · Tab next · {mode_hint} · Ctrl+G {} · Esc quit",
            app.oauth_provider
        ),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if let Some(row) = fields.iter().position(|f| *f == login.focus) {
        let field = login.field(login.focus);
        let col = field.cursor_col().min(value_width);
        frame.set_cursor_position(Position::new(
            inner.x + (LABEL_WIDTH + 1 + col) as u16,
            inner.y + 1 + row as u16,
        ));
    }
}

fn field_line(login: &LoginState, field: LoginField, width: usize) -> Line<'static> {
    let label = match field {
        LoginField::Email => "Email",
        LoginField::Password => "Password",
        LoginField::FullName => "Full name",
    };
    let focused = login.focus == field;
    let label_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(vec![
        Span::styled(format!("{label:<LABEL_WIDTH$} "), label_style),
        Span::raw(truncate_with_ellipsis(&login.field(field).display(), width)),
    ])
}
