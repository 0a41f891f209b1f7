use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Client-only landing channel. It never has a transport or messages.
pub const HOME_CHANNEL_ID: u64 = 0;

/// Sender name used for frames that could not be decoded.
pub const SYSTEM_SENDER: &str = "system";

pub fn is_live_channel(id: Option<u64>) -> bool {
    matches!(id, Some(id) if id != HOME_CHANNEL_ID)
}

/// The signed-in user, fixed for the lifetime of a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Synthetic identity used when authentication is bypassed in development.
    pub fn dev() -> Self {
        Self {
            name: "Dev_User".to_string(),
            email: "dev@example.com".to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "User"
        } else {
            &self.name
        }
    }
}

/// A user as the server serialises it. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    /// Returns an identity only when the record carries a name or an email.
    pub fn to_identity(&self) -> Option<Identity> {
        let name = self.name.clone().filter(|n| !n.is_empty());
        let email = self.email.clone().filter(|e| !e.is_empty());
        if name.is_none() && email.is_none() {
            return None;
        }
        Some(Identity {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
        })
    }
}

/// Body of the login, register and profile-update responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub user: Option<UserRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner_id: u64,
    #[serde(default)]
    pub owner: Option<UserRecord>,
    #[serde(rename = "ownerName", default)]
    pub owner_name: Option<String>,
}

impl ChannelRecord {
    /// Owner name from the embedded owner record, then the flat field.
    /// The server embeds a zero-valued owner when it did not preload one,
    /// so blank names count as missing.
    pub fn embedded_owner_name(&self) -> Option<&str> {
        self.owner
            .as_ref()
            .and_then(|o| o.name.as_deref())
            .filter(|n| !n.is_empty())
            .or_else(|| self.owner_name.as_deref().filter(|n| !n.is_empty()))
    }

    pub fn into_channel(self, fallback_owner: Option<&str>) -> Channel {
        let owner_name = self
            .embedded_owner_name()
            .or(fallback_owner)
            .map(str::to_string);
        Channel {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
            owner_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: u64,
    pub name: String,
    pub owner_id: u64,
    pub owner_name: Option<String>,
}

impl Channel {
    pub fn is_owned_by(&self, user_name: &str) -> bool {
        self.owner_name.as_deref() == Some(user_name)
    }

    /// `#name` for the user's own channels, `owner@name` for joined ones.
    pub fn label(&self, user_name: &str) -> String {
        if self.is_owned_by(user_name) {
            format!("#{}", self.name)
        } else {
            format!(
                "{}@{}",
                self.owner_name.as_deref().unwrap_or("unknown"),
                self.name
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub content: String,
    pub timestamp: i64,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            sender: SYSTEM_SENDER.to_string(),
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Decodes an inbound frame. Payloads that are not a message record are
    /// kept as a system message carrying the raw text.
    pub fn decode_frame(raw: &str) -> Self {
        serde_json::from_str::<Message>(raw).unwrap_or_else(|_| Message::system(raw))
    }

    pub fn is_from(&self, user_name: &str) -> bool {
        self.sender == user_name
    }

    /// Local `HH:MM`. Server timestamps are Unix seconds; values too large to
    /// be seconds are read as milliseconds.
    pub fn formatted_time(&self) -> String {
        let parsed = if self.timestamp.abs() >= 100_000_000_000 {
            chrono::DateTime::from_timestamp_millis(self.timestamp)
        } else {
            chrono::DateTime::from_timestamp(self.timestamp, 0)
        };
        parsed
            .map(|dt| dt.with_timezone(&chrono::Local).format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// `POST /api/login` body: the identifier is sent as `email` when it looks
/// like one, otherwise as `name`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub password: String,
}

impl LoginRequest {
    pub fn new(identifier: &str, password: &str) -> Self {
        let (email, name) = if identifier.contains('@') {
            (Some(identifier.to_string()), None)
        } else {
            (None, Some(identifier.to_string()))
        };
        Self {
            email,
            name,
            password: password.to_string(),
        }
    }
}

impl Drop for LoginRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Drop for RegisterRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Drop for ProfileUpdate {
    fn drop(&mut self) {
        if let Some(ref mut password) = self.password {
            password.zeroize();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateChannelRequest<'a> {
    pub name: &'a str,
}

/// Two-letter badge for the user area.
pub fn initials(name: &str) -> String {
    let mut parts = name.split_whitespace();
    let Some(first) = parts.next() else {
        return "DU".to_string();
    };
    match parts.next() {
        None => first.chars().take(2).collect::<String>().to_uppercase(),
        Some(second) => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
    }
}

/// Extracts `error` (or failing that `message`) from a JSON error body.
pub fn server_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
