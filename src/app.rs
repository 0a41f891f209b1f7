use crate::auth::AuthScreen;
use crate::channels::{self, ChannelDirectory};
use crate::input::TextInput;
use crate::models::{Channel, Identity, HOME_CHANNEL_ID};
use crate::profile::ProfileOverlay;
use crate::session::{ChannelSession, SessionEffect, SessionInput};

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Sidebar,
    Messages,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    NewChannel,
    Search,
}

#[derive(Debug, Clone)]
pub enum AppScreen {
    Loading { message: String },
    Auth,
    Chat,
}

pub struct App {
    pub screen: AppScreen,
    pub identity: Option<Identity>,
    pub auth: AuthScreen,
    pub active_panel: Panel,
    pub channels: ChannelDirectory,
    pub session: ChannelSession,
    /// Row under the sidebar cursor; row 0 is Home.
    pub sidebar_cursor: usize,
    pub prompt: Option<Prompt>,
    pub new_channel_name: TextInput,
    pub search_query: TextInput,
    pub chat_input: TextInput,
    pub sidebar_error: String,
    pub sidebar_message: String,
    pub profile: Option<ProfileOverlay>,
    pub scroll_offset: usize,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            screen: AppScreen::Loading {
                message: "Starting...".to_string(),
            },
            identity: None,
            auth: AuthScreen::new(),
            active_panel: Panel::Sidebar,
            channels: ChannelDirectory::new(),
            session: ChannelSession::new(),
            sidebar_cursor: 0,
            prompt: None,
            new_channel_name: TextInput::new(),
            search_query: TextInput::new(),
            chat_input: TextInput::new(),
            sidebar_error: String::new(),
            sidebar_message: String::new(),
            profile: None,
            scroll_offset: 0,
        }
    }

    pub fn user_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.display_name())
            .unwrap_or("User")
    }

    pub fn show_auth(&mut self) {
        self.identity = None;
        self.auth = AuthScreen::new();
        self.screen = AppScreen::Auth;
    }

    /// Mounts the chat shell for `identity` with a fresh channel state.
    pub fn enter_chat(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.channels = ChannelDirectory::new();
        self.session = ChannelSession::continuing(&self.session);
        self.active_panel = Panel::Sidebar;
        self.sidebar_cursor = 0;
        self.prompt = None;
        self.profile = None;
        self.chat_input.clear();
        self.clear_sidebar_banners();
        self.screen = AppScreen::Chat;
    }

    /// Switches to the name and email the server just saved. Channels owned
    /// under the old name follow the rename.
    pub fn adopt_identity(&mut self, identity: Identity) {
        let previous = self.user_name().to_string();
        self.channels.rename_owner(&previous, identity.display_name());
        self.identity = Some(identity);
    }

    /// Tears the chat shell down. The returned effects release the transport.
    pub fn logout(&mut self) -> Vec<SessionEffect> {
        let effects = self.session.reset();
        self.profile = None;
        self.channels = ChannelDirectory::new();
        self.show_auth();
        effects
    }

    pub fn clear_sidebar_banners(&mut self) {
        self.sidebar_error.clear();
        self.sidebar_message.clear();
    }

    pub fn set_sidebar_error(&mut self, message: impl Into<String>) {
        self.sidebar_message.clear();
        self.sidebar_error = message.into();
    }

    pub fn set_sidebar_message(&mut self, message: impl Into<String>) {
        self.sidebar_error.clear();
        self.sidebar_message = message.into();
    }

    // ---- Channel selection ----

    pub fn active_channel_id(&self) -> Option<u64> {
        self.session.active_channel()
    }

    /// The active channel's record; `None` on Home or when nothing is selected.
    pub fn active_channel(&self) -> Option<&Channel> {
        self.active_channel_id().and_then(|id| self.channels.get(id))
    }

    pub fn is_home(&self) -> bool {
        self.active_channel().is_none()
    }

    pub fn active_channel_title(&self) -> String {
        match self.active_channel() {
            Some(channel) => format!("#{}", channel.name),
            None => "Home".to_string(),
        }
    }

    pub fn select_channel(&mut self, channel: Option<u64>) -> Vec<SessionEffect> {
        let previous = self.session.active_channel();
        let effects = self.session.apply(SessionInput::Select(channel));
        if previous != channel {
            self.scroll_offset = 0;
        }
        self.sidebar_cursor = match channel {
            Some(id) if id != HOME_CHANNEL_ID => {
                self.channels.position(id).map(|p| p + 1).unwrap_or(0)
            }
            _ => 0,
        };
        effects
    }

    pub fn sidebar_len(&self) -> usize {
        self.channels.len() + 1
    }

    pub fn sidebar_up(&mut self) {
        self.sidebar_cursor = self.sidebar_cursor.saturating_sub(1);
    }

    pub fn sidebar_down(&mut self) {
        self.sidebar_cursor = (self.sidebar_cursor + 1).min(self.sidebar_len() - 1);
    }

    /// Channel id under the sidebar cursor, with Home as the sentinel id.
    pub fn sidebar_selection(&self) -> u64 {
        match self.sidebar_cursor {
            0 => HOME_CHANNEL_ID,
            n => self.channels.id_at(n - 1).unwrap_or(HOME_CHANNEL_ID),
        }
    }

    pub fn open_sidebar_selection(&mut self) -> Vec<SessionEffect> {
        let id = self.sidebar_selection();
        self.select_channel(Some(id))
    }

    /// Jumps to the newest channel from the Home view.
    pub fn open_most_recent(&mut self) -> Vec<SessionEffect> {
        match channels::recent(&self.channels, 1).first().map(|c| c.id) {
            Some(id) => self.select_channel(Some(id)),
            None => Vec::new(),
        }
    }

    // ---- Messaging ----

    /// Sends the chat input over the open transport. The input is only
    /// cleared when a frame was actually queued.
    pub fn submit_chat_input(&mut self) -> Vec<SessionEffect> {
        let effects = self
            .session
            .apply(SessionInput::Send(self.chat_input.as_str().to_string()));
        if !effects.is_empty() {
            self.chat_input.clear();
        }
        effects
    }

    pub fn next_panel(&mut self) {
        self.active_panel = match self.active_panel {
            Panel::Sidebar => Panel::Messages,
            Panel::Messages => Panel::Input,
            Panel::Input => Panel::Sidebar,
        };
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = match self.active_panel {
            Panel::Sidebar => Panel::Input,
            Panel::Messages => Panel::Sidebar,
            Panel::Input => Panel::Messages,
        };
    }

    pub fn scroll_messages_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    pub fn scroll_messages_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    // ---- Prompts ----

    pub fn open_prompt(&mut self, prompt: Prompt) {
        self.prompt = Some(prompt);
    }

    pub fn close_prompt(&mut self) {
        self.prompt = None;
    }

    pub fn prompt_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.prompt? {
            Prompt::NewChannel => Some(&mut self.new_channel_name),
            Prompt::Search => Some(&mut self.search_query),
        }
    }

    pub fn open_profile(&mut self) {
        let mut overlay = ProfileOverlay::new();
        overlay.loading = true;
        self.profile = Some(overlay);
    }

    pub fn close_profile(&mut self) {
        self.profile = None;
    }
}
