use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::*;

/// Name of the cookie the server issues on login.
pub const SESSION_COOKIE: &str = "auth_token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL: {0}")]
    InvalidBase(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },
    #[error("invalid server response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    pub fn from_response(status: u16, body: &str) -> Self {
        ApiError::Server {
            status,
            message: server_error_message(body),
        }
    }

    /// Text for a banner: the server's own message when it sent one.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Joins `path` onto `base`; an empty base leaves the path relative.
pub fn build_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}{}", base.strip_suffix('/').unwrap_or(base), path)
}

/// Like [`build_url`] with the scheme swapped: http→ws, https→wss.
pub fn build_ws_url(base: &str, path: &str) -> String {
    let url = build_url(base, path);
    match url.strip_prefix("http") {
        Some(rest) => format!("ws{}", rest),
        None => url,
    }
}

/// `Cookie` header the jar would send to `url`.
pub fn jar_cookie_header(jar: &Jar, url: &Url) -> Option<String> {
    jar.cookies(url)
        .and_then(|value| value.to_str().ok().map(str::to_string))
}

/// The HTTP surface the chat client depends on.
///
/// [`ApiClient`] talks to the real server; tests substitute a recording fake.
#[allow(async_fn_in_trait)]
pub trait ChatApi {
    async fn me(&self) -> Result<UserRecord, ApiError>;
    async fn update_me(&self, update: &ProfileUpdate) -> Result<AuthPayload, ApiError>;
    async fn delete_me(&self) -> Result<(), ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn list_owned_channels(&self) -> Result<Vec<ChannelRecord>, ApiError>;
    async fn list_joined_channels(&self) -> Result<Vec<ChannelRecord>, ApiError>;
    async fn create_channel(&self, name: &str) -> Result<ChannelRecord, ApiError>;
    async fn delete_channel(&self, channel_id: u64) -> Result<(), ApiError>;
    async fn search_channel(&self, query: &str) -> Result<ChannelRecord, ApiError>;
    async fn join_channel(&self, channel_id: u64) -> Result<ChannelRecord, ApiError>;
    async fn channel_members(&self, channel_id: u64) -> Result<Vec<Member>, ApiError>;
}

pub struct ApiClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: String,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base)?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            jar,
            base: base.to_string(),
            base_url,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        build_url(&self.base, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        build_ws_url(&self.base, path)
    }

    /// Puts a previously stored session back into the cookie jar.
    pub fn seed_session(&self, token: &str) {
        let cookie = format!("{}={}; Path=/", SESSION_COOKIE, token);
        self.jar.add_cookie_str(&cookie, &self.base_url);
    }

    /// Current value of the session cookie, if the server set one.
    pub fn session_token(&self) -> Option<String> {
        let header = self.cookie_header()?;
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    /// Expires the session cookie locally.
    pub fn clear_session(&self) {
        let cookie = format!("{}=; Max-Age=0; Path=/", SESSION_COOKIE);
        self.jar.add_cookie_str(&cookie, &self.base_url);
    }

    /// `Cookie` header value for requests to the API origin.
    pub fn cookie_header(&self) -> Option<String> {
        jar_cookie_header(&self.jar, &self.base_url)
    }

    /// The jar reqwest reads and updates. The WebSocket handshake does not go
    /// through reqwest, so the transport reads cookies from here on connect.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.checked(request).await?;
        resp.json::<T>().await.map_err(ApiError::Decode)
    }

    async fn send_no_content(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.checked(request).await.map(|_| ())
    }

    async fn checked(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let resp = request.send().await?;
        let status = resp.status();
        debug!(url = %resp.url().path(), status = status.as_u16(), "api response");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = ApiError::from_response(status.as_u16(), &body);
            warn!("{}", err);
            return Err(err);
        }
        Ok(resp)
    }
}

impl ChatApi for ApiClient {
    // ---- Identity ----

    async fn me(&self) -> Result<UserRecord, ApiError> {
        self.send(self.client.get(self.url("/api/me"))).await
    }

    async fn update_me(&self, update: &ProfileUpdate) -> Result<AuthPayload, ApiError> {
        self.send(self.client.put(self.url("/api/me")).json(update))
            .await
    }

    async fn delete_me(&self) -> Result<(), ApiError> {
        self.send_no_content(self.client.delete(self.url("/api/me")))
            .await
    }

    // ---- Auth ----

    async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, ApiError> {
        self.send(self.client.post(self.url("/api/login")).json(request))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        self.send(self.client.post(self.url("/api/register")).json(request))
            .await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let body = serde_json::json!({});
        self.send_no_content(self.client.post(self.url("/api/logout")).json(&body))
            .await
    }

    // ---- Channels ----

    async fn list_owned_channels(&self) -> Result<Vec<ChannelRecord>, ApiError> {
        self.send(self.client.get(self.url("/api/channels"))).await
    }

    async fn list_joined_channels(&self) -> Result<Vec<ChannelRecord>, ApiError> {
        self.send(self.client.get(self.url("/api/channels/joined")))
            .await
    }

    async fn create_channel(&self, name: &str) -> Result<ChannelRecord, ApiError> {
        let body = CreateChannelRequest { name };
        self.send(self.client.post(self.url("/api/channels")).json(&body))
            .await
    }

    async fn delete_channel(&self, channel_id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/channels/{}", channel_id));
        self.send_no_content(self.client.delete(url)).await
    }

    async fn search_channel(&self, query: &str) -> Result<ChannelRecord, ApiError> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = self.url(&format!("/api/channels/search?query={}", encoded));
        self.send(self.client.get(url)).await
    }

    async fn join_channel(&self, channel_id: u64) -> Result<ChannelRecord, ApiError> {
        let url = self.url(&format!("/api/channels/{}/join", channel_id));
        let body = serde_json::json!({});
        self.send(self.client.post(url).json(&body)).await
    }

    async fn channel_members(&self, channel_id: u64) -> Result<Vec<Member>, ApiError> {
        let url = self.url(&format!("/api/channels/{}/members", channel_id));
        self.send(self.client.get(url)).await
    }
}
