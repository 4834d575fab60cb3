//! Login page: email/password sign-in, sign-up and browser sign-in.

mod render;
mod update;

pub use render::render_login;
pub use update::{handle_key, handle_login_event, handle_paste};

use crate::common::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
    FullName,
}

#[derive(Debug, Clone)]
pub struct LoginState {
    pub mode: LoginMode,
    pub focus: LoginField,
    pub email: TextField,
    pub password: TextField,
    pub full_name: TextField,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Authorize URL of a browser sign-in in progress.
    pub oauth_url: Option<String>,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            mode: LoginMode::SignIn,
            focus: LoginField::Email,
            email: TextField::default(),
            password: TextField::masked(),
            full_name: TextField::default(),
            error: None,
            notice: None,
            oauth_url: None,
        }
    }
}

impl LoginState {
    /// Fields shown in the current mode, in tab order.
    pub fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::SignIn => &[LoginField::Email, LoginField::Password],
            LoginMode::SignUp => &[LoginField::FullName, LoginField::Email, LoginField::Password],
        }
    }

    pub fn field_mut(&mut self, field: LoginField) -> &mut TextField {
        match field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
            LoginField::FullName => &mut self.full_name,
        }
    }

    pub fn field(&self, field: LoginField) -> &TextField {
        match field {
            LoginField::Email => &self.email,
            LoginField::Password => &self.password,
            LoginField::FullName => &self.full_name,
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::SignIn => LoginMode::SignUp,
            LoginMode::SignUp => LoginMode::SignIn,
        };
        if !self.fields().contains(&self.focus) {
            self.focus = LoginField::Email;
        }
        self.error = None;
    }

    /// Drops secrets and transient messages once a user is signed in.
    pub fn reset_after_sign_in(&mut self) {
        self.password.clear();
        self.full_name.clear();
        self.error = None;
        self.notice = None;
        self.oauth_url = None;
        self.mode = LoginMode::SignIn;
        self.focus = LoginField::Email;
    }
}
