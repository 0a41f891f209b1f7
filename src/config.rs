use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Origin used when no API base URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

pub const ENV_API_BASE_URL: &str = "NEONCHAT_API_BASE_URL";
pub const ENV_ORIGIN: &str = "NEONCHAT_ORIGIN";
pub const ENV_DEV_BYPASS_AUTH: &str = "NEONCHAT_DEV_BYPASS_AUTH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub dev_bypass_auth: bool,
}

impl Config {
    /// Base URL every HTTP and WebSocket path is resolved against.
    pub fn api_base(&self) -> &str {
        let trimmed = self.api_base_url.trim();
        if trimmed.is_empty() {
            DEFAULT_API_BASE_URL
        } else {
            trimmed
        }
    }

    /// Value for the WebSocket `Origin` header. The server rejects upgrades
    /// without one, so fall back to the scheme and host of the API base.
    pub fn ws_origin(&self) -> Option<String> {
        let configured = self.origin.trim();
        if !configured.is_empty() {
            return Some(configured.trim_end_matches('/').to_string());
        }
        let parsed = url::Url::parse(self.api_base()).ok()?;
        let origin = parsed.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Dev bypass is a development aid only; release builds ignore it.
    pub fn bypass_enabled(&self) -> bool {
        cfg!(debug_assertions) && self.dev_bypass_auth
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = base.trim().to_string();
        }
        if let Some(origin) = lookup(ENV_ORIGIN) {
            self.origin = origin.trim().to_string();
        }
        if let Some(flag) = lookup(ENV_DEV_BYPASS_AUTH) {
            self.dev_bypass_auth = flag.trim() == "true";
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("neonchat");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn load_config() -> Result<Config> {
    let path = config_dir()?.join("config.toml");
    if !path.exists() {
        let template = format!(
            r#"# neonchat configuration
# The session cookie is stored in your OS credential manager.
# This file contains non-sensitive settings only.

# Chat server base URL. Leave empty to use {}
api_base_url = ""

# Origin header sent on WebSocket upgrades. Leave empty to derive it from api_base_url.
# The server only accepts origins listed in its CORS_ORIGINS.
origin = ""

# Skip sign-in with a fixed development identity (debug builds only)
dev_bypass_auth = false
"#,
            DEFAULT_API_BASE_URL
        );
        std::fs::write(&path, template)?;
    }
    let content = std::fs::read_to_string(&path)?;
    let mut config = parse_config(&content)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Invalid config file format")
}

pub fn print_setup_guide() {
    eprintln!("Setup Guide:");
    eprintln!("  1. Start the chat server (it listens on :8080 by default)");
    eprintln!("  2. Set api_base_url in the config file, or export {}", ENV_API_BASE_URL);
    eprintln!("  3. Add the client origin to the server's CORS_ORIGINS,");
    eprintln!("     or set origin to one of the values it already allows");
    eprintln!("     (e.g. http://localhost:5173)");
}
