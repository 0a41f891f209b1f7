//! Per-channel live session.
//!
//! [`ChannelSession`] keeps the transport in step with the active channel.
//! It never touches the network itself: every input goes through
//! [`ChannelSession::apply`], which updates the message buffer and roster and
//! returns the [`SessionEffect`]s the caller must carry out (open or close a
//! socket, fetch the roster, write a frame, show a banner).
//!
//! ```text
//!   Select(home|None) ─────────────▶ Idle
//!   Select(id) ────────────────────▶ Connecting ──Opened──▶ Open
//!                                         │                    │
//!                                  Failed/Closed        Failed/Closed
//!                                         ▼                    ▼
//!                                       Closed ◀───────────────┘
//! ```
//!
//! Each transport is tagged with a generation number. Events carrying any
//! generation other than the current one come from a socket that was already
//! released and are dropped.

use tracing::{debug, info, warn};

use crate::models::{is_live_channel, Member, Message};

pub const CONNECTION_FAILED: &str = "WebSocket connection failed.";
pub const CONNECTION_CLOSED: &str = "Connection closed.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Frame(String),
    Failed(String),
    Closed,
}

/// Something a transport reported, tagged with the generation it was opened as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub generation: u64,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(generation: u64, kind: TransportEventKind) -> Self {
        Self { generation, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// The active channel changed. `None` and the home id both mean "no channel".
    Select(Option<u64>),
    Transport(TransportEvent),
    /// User pressed send with the given raw input.
    Send(String),
    /// A roster fetch finished. `None` means it failed.
    Roster {
        channel_id: u64,
        members: Option<Vec<Member>>,
    },
    /// Provisional roster shown until the real fetch lands.
    SeedRoster(Vec<Member>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Connect { generation: u64, channel_id: u64 },
    Disconnect { generation: u64 },
    FetchMembers { channel_id: u64 },
    Send { generation: u64, content: String },
    Notify(String),
}

#[derive(Debug, Default)]
pub struct ChannelSession {
    active_channel: Option<u64>,
    state: TransportState,
    generation: Option<u64>,
    last_generation: u64,
    messages: Vec<Message>,
    members: Vec<Member>,
}

impl ChannelSession {
    /// A session parked on the home channel.
    pub fn new() -> Self {
        Self {
            active_channel: Some(crate::models::HOME_CHANNEL_ID),
            ..Self::default()
        }
    }

    /// A fresh session on home that keeps numbering transports after
    /// `previous`, so events still queued from its sockets stay stale.
    pub fn continuing(previous: &ChannelSession) -> Self {
        Self {
            last_generation: previous.last_generation,
            ..Self::new()
        }
    }

    pub fn active_channel(&self) -> Option<u64> {
        self.active_channel
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state() == TransportState::Open
    }

    /// Generation of the transport this session currently owns.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn apply(&mut self, input: SessionInput) -> Vec<SessionEffect> {
        match input {
            SessionInput::Select(channel) => self.select(channel),
            SessionInput::Transport(event) => self.on_transport(event),
            SessionInput::Send(raw) => self.send(&raw),
            SessionInput::Roster {
                channel_id,
                members,
            } => {
                self.on_roster(channel_id, members);
                Vec::new()
            }
            SessionInput::SeedRoster(members) => {
                self.members = members;
                Vec::new()
            }
        }
    }

    /// Leaves whatever channel is active and releases its transport.
    pub fn reset(&mut self) -> Vec<SessionEffect> {
        let effects = self.select(None);
        self.messages.clear();
        self.members.clear();
        effects
    }

    fn select(&mut self, channel: Option<u64>) -> Vec<SessionEffect> {
        if channel == self.active_channel {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let Some(generation) = self.generation.take() {
            debug!(generation, "releasing transport for channel switch");
            effects.push(SessionEffect::Disconnect { generation });
        }

        self.active_channel = channel;
        self.messages.clear();
        self.members.clear();

        match channel {
            Some(channel_id) if is_live_channel(channel) => {
                self.last_generation += 1;
                let generation = self.last_generation;
                self.generation = Some(generation);
                self.state = TransportState::Connecting;
                info!(channel_id, generation, "connecting to channel");
                effects.push(SessionEffect::Connect {
                    generation,
                    channel_id,
                });
            }
            _ => {
                self.state = TransportState::Idle;
            }
        }
        effects
    }

    fn on_transport(&mut self, event: TransportEvent) -> Vec<SessionEffect> {
        if self.generation != Some(event.generation) {
            debug!(
                generation = event.generation,
                current = ?self.generation,
                "dropping event from released transport"
            );
            return Vec::new();
        }

        match event.kind {
            TransportEventKind::Opened => {
                if self.state() != TransportState::Connecting {
                    return Vec::new();
                }
                self.state = TransportState::Open;
                match self.active_channel {
                    Some(channel_id) => {
                        info!(channel_id, "channel transport open");
                        vec![SessionEffect::FetchMembers { channel_id }]
                    }
                    None => Vec::new(),
                }
            }
            TransportEventKind::Frame(raw) => {
                if self.is_open() {
                    self.messages.push(Message::decode_frame(&raw));
                }
                Vec::new()
            }
            TransportEventKind::Failed(reason) => {
                warn!(generation = event.generation, %reason, "channel transport failed");
                self.close_with(CONNECTION_FAILED)
            }
            TransportEventKind::Closed => {
                info!(generation = event.generation, "channel transport closed by peer");
                self.close_with(CONNECTION_CLOSED)
            }
        }
    }

    /// Only the first failure or close of a transport produces a banner.
    fn close_with(&mut self, banner: &str) -> Vec<SessionEffect> {
        if self.state() == TransportState::Closed {
            return Vec::new();
        }
        self.state = TransportState::Closed;
        vec![SessionEffect::Notify(banner.to_string())]
    }

    fn send(&mut self, raw: &str) -> Vec<SessionEffect> {
        let content = raw.trim();
        if content.is_empty() || !self.is_open() {
            return Vec::new();
        }
        match self.generation {
            Some(generation) => vec![SessionEffect::Send {
                generation,
                content: content.to_string(),
            }],
            None => Vec::new(),
        }
    }

    fn on_roster(&mut self, channel_id: u64, members: Option<Vec<Member>>) {
        if self.active_channel != Some(channel_id) {
            debug!(channel_id, "ignoring roster for inactive channel");
            return;
        }
        self.members = members.unwrap_or_default();
    }
}
