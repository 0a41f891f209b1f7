use anyhow::Result;
use zeroize::Zeroize;

use crate::input::TextInput;
use crate::models::{LoginRequest, RegisterRequest};

const KEYRING_SERVICE: &str = "neonchat-client";
const KEYRING_USER: &str = "session";

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FAILED: &str = "Registration failed. Please try again.";
pub const LOGIN_SUCCESS: &str = "Welcome back. Redirecting to your workspace.";
pub const REGISTERED_HINT: &str = "Account created. Please sign in to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Identifier,
    Password,
    FullName,
    Email,
    NewPassword,
    ConfirmPassword,
}

impl AuthField {
    fn fields(mode: AuthMode) -> &'static [AuthField] {
        match mode {
            AuthMode::Login => &[AuthField::Identifier, AuthField::Password],
            AuthMode::Register => &[
                AuthField::FullName,
                AuthField::Email,
                AuthField::NewPassword,
                AuthField::ConfirmPassword,
            ],
        }
    }
}

/// Sign-in and create-account forms behind one mode toggle.
#[derive(Debug)]
pub struct AuthScreen {
    pub mode: AuthMode,
    pub focus: AuthField,
    pub identifier: TextInput,
    pub password: TextInput,
    pub full_name: TextInput,
    pub email: TextInput,
    pub new_password: TextInput,
    pub confirm_password: TextInput,
    pub error: String,
    pub message: String,
    pub loading: bool,
}

impl Default for AuthScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthScreen {
    pub fn new() -> Self {
        Self {
            mode: AuthMode::Login,
            focus: AuthField::Identifier,
            identifier: TextInput::new(),
            password: TextInput::masked(),
            full_name: TextInput::new(),
            email: TextInput::new(),
            new_password: TextInput::masked(),
            confirm_password: TextInput::masked(),
            error: String::new(),
            message: String::new(),
            loading: false,
        }
    }

    /// Switching modes drops any pending hint or error.
    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.focus = AuthField::fields(mode)[0];
        self.error.clear();
        self.message.clear();
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.set_mode(next);
    }

    pub fn next_field(&mut self) {
        let fields = AuthField::fields(self.mode);
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = AuthField::fields(self.mode);
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    pub fn is_last_field(&self) -> bool {
        AuthField::fields(self.mode).last() == Some(&self.focus)
    }

    pub fn focused_input_mut(&mut self) -> &mut TextInput {
        match self.focus {
            AuthField::Identifier => &mut self.identifier,
            AuthField::Password => &mut self.password,
            AuthField::FullName => &mut self.full_name,
            AuthField::Email => &mut self.email,
            AuthField::NewPassword => &mut self.new_password,
            AuthField::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn login_request(&self) -> LoginRequest {
        LoginRequest::new(self.identifier.as_str(), self.password.as_str())
    }

    /// Checks the confirmation locally before anything is sent.
    pub fn register_request(&self) -> Result<RegisterRequest, &'static str> {
        if self.new_password.as_str() != self.confirm_password.as_str() {
            return Err(PASSWORDS_DO_NOT_MATCH);
        }
        Ok(RegisterRequest {
            name: self.full_name.as_str().to_string(),
            email: self.email.as_str().to_string(),
            password: self.new_password.as_str().to_string(),
        })
    }

    /// Back to sign-in with the new email filled in. Registration does not
    /// sign the user in.
    pub fn on_registered(&mut self, email: &str) {
        self.set_mode(AuthMode::Login);
        self.identifier.set(email);
        self.password.clear();
        self.new_password.clear();
        self.confirm_password.clear();
        self.focus = AuthField::Password;
        self.message = REGISTERED_HINT.to_string();
    }

    pub fn on_login_succeeded(&mut self) {
        self.password.clear();
        self.error.clear();
        self.message = LOGIN_SUCCESS.to_string();
    }
}

// ---- Session cookie storage ----

fn keyring_entry() -> Option<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()
}

fn session_file_path() -> Result<std::path::PathBuf> {
    Ok(crate::config::config_dir()?.join(".session"))
}

/// Persists the session cookie so the next start can skip sign-in.
pub fn store_session(token: &str) -> Result<()> {
    if let Some(entry) = keyring_entry() {
        // read back through a fresh entry; builds without a native store only keep it in memory
        let persisted = entry.set_password(token).is_ok()
            && keyring_entry()
                .and_then(|e| e.get_password().ok())
                .is_some_and(|stored| stored == token);
        if persisted {
            return Ok(());
        }
    }
    // Fall back to a file in the config dir (protected by OS user permissions)
    std::fs::write(session_file_path()?, token)?;
    Ok(())
}

pub fn load_session() -> Result<Option<String>> {
    if let Some(token) = keyring_entry()
        .and_then(|e| e.get_password().ok())
        .filter(|s| !s.is_empty())
    {
        return Ok(Some(token));
    }
    let path = session_file_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let mut raw = std::fs::read_to_string(&path)?;
    let token = raw.trim().to_string();
    raw.zeroize();
    Ok(Some(token).filter(|t| !t.is_empty()))
}

pub fn clear_stored_session() -> Result<()> {
    if let Some(entry) = keyring_entry() {
        let _ = entry.delete_credential();
    }
    if let Ok(path) = session_file_path() {
        if path.exists() {
            // Overwrite before delete
            let len = std::fs::metadata(&path).map(|m| m.len() as usize).unwrap_or(0);
            let _ = std::fs::write(&path, vec![0u8; len]);
            let _ = std::fs::remove_file(&path);
        }
    }
    Ok(())
}
