//! Channel collection and the views derived from it.

use crate::models::{Channel, ChannelRecord};

pub const EMPTY_CHANNEL_NAME: &str = "Please enter a channel name.";
pub const BAD_SEARCH_QUERY: &str = "Search format must be owner@channel";

/// Channels known to the client, unique by id, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    channels: Vec<Channel>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_channels(channels: Vec<Channel>) -> Self {
        let mut dir = Self::new();
        dir.upsert_all(channels);
        dir
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn get(&self, id: u64) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn first_id(&self) -> Option<u64> {
        self.channels.first().map(|c| c.id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.channels.iter().position(|c| c.id == id)
    }

    pub fn id_at(&self, index: usize) -> Option<u64> {
        self.channels.get(index).map(|c| c.id)
    }

    /// Inserts or replaces by id. A replaced channel keeps its position.
    pub fn upsert_all(&mut self, incoming: impl IntoIterator<Item = Channel>) {
        for channel in incoming {
            match self.position(channel.id) {
                Some(idx) => self.channels[idx] = channel,
                None => self.channels.push(channel),
            }
        }
    }

    /// Merges a fresh server listing with what the client already holds.
    /// Entries already held win over fetched copies.
    pub fn merge_fetched(&mut self, owned: Vec<Channel>, joined: Vec<Channel>) {
        let existing = std::mem::take(&mut self.channels);
        self.upsert_all(owned.into_iter().chain(joined).chain(existing));
    }

    /// Appends unless a channel with the same id is already present.
    pub fn insert_if_absent(&mut self, channel: Channel) -> bool {
        if self.contains(channel.id) {
            return false;
        }
        self.channels.push(channel);
        true
    }

    pub fn rename_owner(&mut self, from: &str, to: &str) {
        for channel in self.channels.iter_mut().filter(|c| c.is_owned_by(from)) {
            channel.owner_name = Some(to.to_string());
        }
    }

    pub fn remove(&mut self, id: u64) -> Option<Channel> {
        let idx = self.position(id)?;
        Some(self.channels.remove(idx))
    }
}

/// Owned channels keep the embedded owner name, falling back to the current user.
pub fn owned_from_records(records: Vec<ChannelRecord>, me: &str) -> Vec<Channel> {
    records
        .into_iter()
        .map(|r| r.into_channel(Some(me)))
        .collect()
}

pub fn joined_from_records(records: Vec<ChannelRecord>) -> Vec<Channel> {
    records.into_iter().map(|r| r.into_channel(None)).collect()
}

pub fn owned<'a>(dir: &'a ChannelDirectory, me: &str) -> Vec<&'a Channel> {
    dir.iter().filter(|c| c.is_owned_by(me)).collect()
}

pub fn joined<'a>(dir: &'a ChannelDirectory, me: &str) -> Vec<&'a Channel> {
    dir.iter().filter(|c| !c.is_owned_by(me)).collect()
}

/// Highest ids first; the server assigns ids in creation order.
pub fn recent(dir: &ChannelDirectory, limit: usize) -> Vec<&Channel> {
    let mut channels: Vec<&Channel> = dir.iter().collect();
    channels.sort_by(|a, b| b.id.cmp(&a.id));
    channels.truncate(limit);
    channels
}

/// Channel to show after the active channel is deleted.
pub fn fallback_after_delete(dir: &ChannelDirectory) -> Option<u64> {
    dir.first_id()
}

pub fn validate_channel_name(input: &str) -> Result<String, &'static str> {
    let name = input.trim();
    if name.is_empty() {
        return Err(EMPTY_CHANNEL_NAME);
    }
    Ok(name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub owner: String,
    pub channel: String,
}

impl SearchQuery {
    pub fn parse(input: &str) -> Result<Self, &'static str> {
        let query = input.trim();
        let (owner, channel) = query.split_once('@').ok_or(BAD_SEARCH_QUERY)?;
        if owner.is_empty() || channel.is_empty() {
            return Err(BAD_SEARCH_QUERY);
        }
        Ok(Self {
            owner: owner.to_string(),
            channel: channel.to_string(),
        })
    }

    pub fn as_query(&self) -> String {
        format!("{}@{}", self.owner, self.channel)
    }
}
