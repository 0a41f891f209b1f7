//! Profile overlay: edit name, email and password, or delete the account.

use crate::input::TextInput;
use crate::models::{AuthPayload, ProfileUpdate, UserRecord};

pub const NOTHING_CHANGED: &str = "Nothing has changed.";
pub const LOAD_FAILED: &str = "Failed to load profile.";
pub const UPDATE_FAILED: &str = "Update failed, please try again.";
pub const UPDATED: &str = "Profile updated.";
pub const DELETE_FAILED: &str = "Failed to delete account.";
pub const CONFIRM_DELETE: &str =
    "Delete your account? This cannot be undone. Press Ctrl+D again to confirm.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Snapshot {
    name: String,
    email: String,
}

#[derive(Debug)]
pub struct ProfileOverlay {
    pub name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub focus: ProfileField,
    pub error: String,
    pub message: String,
    pub loading: bool,
    original: Snapshot,
    delete_armed: bool,
}

impl Default for ProfileOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileOverlay {
    pub fn new() -> Self {
        Self {
            name: TextInput::new(),
            email: TextInput::new(),
            password: TextInput::masked(),
            focus: ProfileField::Name,
            error: String::new(),
            message: String::new(),
            loading: false,
            original: Snapshot::default(),
            delete_armed: false,
        }
    }

    pub fn clear_banners(&mut self) {
        self.error.clear();
        self.message.clear();
    }

    pub fn focused_input_mut(&mut self) -> &mut TextInput {
        match self.focus {
            ProfileField::Name => &mut self.name,
            ProfileField::Email => &mut self.email,
            ProfileField::Password => &mut self.password,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            ProfileField::Name => ProfileField::Email,
            ProfileField::Email => ProfileField::Password,
            ProfileField::Password => ProfileField::Name,
        };
    }

    pub fn prev_field(&mut self) {
        self.focus = match self.focus {
            ProfileField::Name => ProfileField::Password,
            ProfileField::Email => ProfileField::Name,
            ProfileField::Password => ProfileField::Email,
        };
    }

    /// Fills the fields from `GET /api/me` and records them as the baseline.
    pub fn load(&mut self, record: &UserRecord) {
        let name = record.name.clone().unwrap_or_default();
        let email = record.email.clone().unwrap_or_default();
        self.set_fields(name, email);
    }

    fn set_fields(&mut self, name: String, email: String) {
        self.name.set(name.clone());
        self.email.set(email.clone());
        self.original = Snapshot { name, email };
    }

    /// Builds the update, or rejects it locally when nothing differs from the
    /// last loaded values.
    pub fn prepare_save(&self) -> Result<ProfileUpdate, &'static str> {
        let name = self.name.as_str().trim();
        let email = self.email.as_str().trim();
        let password = self.password.as_str().trim();

        if name == self.original.name && email == self.original.email && password.is_empty() {
            return Err(NOTHING_CHANGED);
        }

        Ok(ProfileUpdate {
            name: name.to_string(),
            email: email.to_string(),
            password: (!password.is_empty()).then(|| password.to_string()),
        })
    }

    /// Applies a successful save. The server's user record wins when present.
    pub fn apply_saved(&mut self, sent: &ProfileUpdate, payload: &AuthPayload) {
        let returned = payload.user.as_ref().filter(|u| {
            u.name.as_deref().is_some_and(|n| !n.is_empty())
                || u.email.as_deref().is_some_and(|e| !e.is_empty())
        });
        let (name, email) = match returned {
            Some(user) => (
                user.name.clone().unwrap_or_else(|| sent.name.clone()),
                user.email.clone().unwrap_or_else(|| sent.email.clone()),
            ),
            None => (sent.name.clone(), sent.email.clone()),
        };
        self.set_fields(name, email);
        self.password.clear();
        self.error.clear();
        self.message = UPDATED.to_string();
    }

    /// First call arms the confirmation and returns false; the second
    /// returns true and the caller issues the delete.
    pub fn confirm_delete(&mut self) -> bool {
        if self.delete_armed {
            self.delete_armed = false;
            return true;
        }
        self.delete_armed = true;
        self.message.clear();
        self.error = CONFIRM_DELETE.to_string();
        false
    }

    pub fn cancel_delete(&mut self) {
        if self.delete_armed {
            self.delete_armed = false;
            self.error.clear();
        }
    }

    pub fn delete_armed(&self) -> bool {
        self.delete_armed
    }
}
