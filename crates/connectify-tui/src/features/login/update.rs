//! Login page reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{LoginMode, LoginState};
use crate::common::TaskKind;
use crate::effects::UiEffect;
use crate::events::LoginUiEvent;
use crate::state::{AppState, Page};

pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let busy = app.tasks.state(TaskKind::Auth).is_running();

    match key.code {
        KeyCode::Esc if busy => {
            app.tasks.state_mut(TaskKind::Auth).clear();
            app.login.oauth_url = None;
            app.login.notice = Some("Sign-in cancelled.".to_string());
            vec![]
        }
        KeyCode::Esc => vec![UiEffect::Quit],
        KeyCode::Tab | KeyCode::Down => {
            app.login.move_focus(true);
            vec![]
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login.move_focus(false);
            vec![]
        }
        KeyCode::Char('s') if ctrl => {
            app.login.toggle_mode();
            vec![]
        }
        KeyCode::Char('g') if ctrl => {
            if busy {
                return vec![];
            }
            app.login.error = None;
            app.login.notice = None;
            vec![UiEffect::StartOAuth {
                task: app.task_seq.next_id(),
            }]
        }
        KeyCode::Enter => {
            if busy {
                return vec![];
            }
            submit(app)
        }
        _ => {
            let focus = app.login.focus;
            app.login.field_mut(focus).input(key);
            vec![]
        }
    }
}

pub fn handle_paste(login: &mut LoginState, text: &str) {
    let focus = login.focus;
    login.field_mut(focus).insert_str(text);
}

fn submit(app: &mut AppState) -> Vec<UiEffect> {
    let login = &mut app.login;
    let email = login.email.text().trim().to_string();
    let password = login.password.text().to_string();
    if email.is_empty() || password.is_empty() {
        login.error = Some("Email and password are required.".to_string());
        return vec![];
    }
    login.error = None;
    login.notice = None;

    let task = app.task_seq.next_id();
    match login.mode {
        LoginMode::SignIn => vec![UiEffect::SignIn {
            task,
            email,
            password,
        }],
        LoginMode::SignUp => {
            let full_name = login.full_name.text().trim();
            vec![UiEffect::SignUp {
                task,
                email,
                password,
                full_name: (!full_name.is_empty()).then(|| full_name.to_string()),
            }]
        }
    }
}

pub fn handle_login_event(app: &mut AppState, event: LoginUiEvent) -> Vec<UiEffect> {
    match event {
        LoginUiEvent::SessionChecked { error: None } => {}
        LoginUiEvent::SessionChecked { error: Some(error) } => {
            if app.page == Page::Loading {
                app.page = Page::Login;
            }
            app.login.error = Some(error);
        }
        LoginUiEvent::Finished { error } => {
            app.login.oauth_url = None;
            app.login.error = error;
        }
        LoginUiEvent::ConfirmationRequired { email } => {
            app.login.password.clear();
            app.login.mode = LoginMode::SignIn;
            app.login.focus = super::LoginField::Password;
            app.login.notice = Some(format!(
                "Check {email} to confirm your account, then sign in."
            ));
        }
        LoginUiEvent::OAuthStarted { url } => {
            app.login.notice = Some("Finish signing in in your browser (Esc to cancel).".to_string());
            app.login.oauth_url = Some(url);
        }
        LoginUiEvent::SignedOut => {
            app.info("Signed out.");
        }
    }
    vec![]
}

#[cfg(test)]
mod tests {
    use connectify_core::config::Config;

    use super::*;
    use crate::features::login::LoginField;

    fn app() -> AppState {
        let mut app = AppState::new(&Config::default());
        app.page = Page::Login;
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            handle_key(app, key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn test_enter_signs_in() {
        let mut app = app();
        type_text(&mut app, "ada@example.com");
        handle_key(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "hunter2");

        let effects = handle_key(&mut app, key(KeyCode::Enter));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SignIn { email, password, .. }]
                if email == "ada@example.com" && password == "hunter2"
        ));
    }

    #[test]
    fn test_missing_fields_show_error() {
        let mut app = app();
        type_text(&mut app, "ada@example.com");
        assert!(handle_key(&mut app, key(KeyCode::Enter)).is_empty());
        assert!(app.login.error.is_some());
    }

    #[test]
    fn test_sign_up_mode_adds_name_field() {
        let mut app = app();
        handle_key(&mut app, ctrl('s'));
        assert_eq!(app.login.mode, LoginMode::SignUp);
        assert_eq!(app.login.fields().len(), 3);

        app.login.focus = LoginField::FullName;
        type_text(&mut app, "Ada Lovelace");
        handle_key(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "ada@example.com");
        handle_key(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "pw");

        let effects = handle_key(&mut app, key(KeyCode::Enter));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SignUp { full_name: Some(name), .. }] if name == "Ada Lovelace"
        ));

        handle_key(&mut app, ctrl('s'));
        assert_eq!(app.login.mode, LoginMode::SignIn);
        assert_ne!(app.login.focus, LoginField::FullName);
    }

    #[test]
    fn test_ctrl_g_starts_oauth() {
        let mut app = app();
        let effects = handle_key(&mut app, ctrl('g'));
        assert!(matches!(effects.as_slice(), [UiEffect::StartOAuth { .. }]));
    }

    #[test]
    fn test_confirmation_notice() {
        let mut app = app();
        app.login.mode = LoginMode::SignUp;
        handle_login_event(
            &mut app,
            LoginUiEvent::ConfirmationRequired {
                email: "ada@example.com".to_string(),
            },
        );
        assert_eq!(app.login.mode, LoginMode::SignIn);
        assert!(app.login.notice.as_deref().unwrap().contains("ada@example.com"));
    }

    #[test]
    fn test_failed_session_check_leaves_loading() {
        let mut app = AppState::new(&Config::default());
        handle_login_event(
            &mut app,
            LoginUiEvent::SessionChecked {
                error: Some("Network error, try again.".to_string()),
            },
        );
        assert_eq!(app.page, Page::Login);
        assert!(app.login.error.is_some());
    }
}
