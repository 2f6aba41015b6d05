//! Domain entities exchanged with the chat server.
//!
//! These are the raw, canonical shapes held by the entity store. Anything the
//! presentation layer needs beyond them (online flags, titles, resolved
//! authors) is derived on read and never stored here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NEVER_SEEN_SENTINEL;
use crate::types::{ConversationId, ConversationType, MessageId, Reaction, Theme};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A chat user. `username` is the primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub picture_url: String,
    /// Server-declared idle/active flag.
    #[serde(default)]
    pub awake: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            picture_url: String::new(),
            awake: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A one-to-one or group conversation as pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(rename = "type")]
    pub kind: ConversationType,
    /// Ordered participant usernames. Order is kept for group labels.
    pub participants: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub nicknames: BTreeMap<String, String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seen: BTreeMap<String, SeenStatus>,
    /// username -> last time that user was seen typing.
    #[serde(default)]
    pub typing: BTreeMap<String, DateTime<Utc>>,
}

impl Conversation {
    /// An empty conversation with default theme and no messages.
    pub fn new(id: impl Into<ConversationId>, kind: ConversationType, participants: Vec<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            participants,
            messages: Vec::new(),
            title: None,
            theme: Theme::default(),
            nicknames: BTreeMap::new(),
            updated_at: None,
            seen: BTreeMap::new(),
            typing: BTreeMap::new(),
        }
    }

    pub fn has_participant(&self, username: &str) -> bool {
        self.participants.iter().any(|p| p == username)
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }
}

// ---------------------------------------------------------------------------
// Seen receipts
// ---------------------------------------------------------------------------

/// Per-user read position inside a conversation.
///
/// On the wire the sentinel is the integer `-1` and a read position is an
/// object `{message_id, time}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawSeen", into = "RawSeen")]
pub enum SeenStatus {
    /// The user has not seen any message in the conversation.
    Never,
    Seen {
        message_id: MessageId,
        time: DateTime<Utc>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSeen {
    Sentinel(i64),
    Pair {
        message_id: MessageId,
        time: DateTime<Utc>,
    },
}

impl TryFrom<RawSeen> for SeenStatus {
    type Error = String;

    fn try_from(raw: RawSeen) -> Result<Self, Self::Error> {
        match raw {
            RawSeen::Sentinel(NEVER_SEEN_SENTINEL) => Ok(SeenStatus::Never),
            RawSeen::Sentinel(other) => Err(format!("unexpected seen sentinel {other}")),
            RawSeen::Pair { message_id, time } => Ok(SeenStatus::Seen { message_id, time }),
        }
    }
}

impl From<SeenStatus> for RawSeen {
    fn from(status: SeenStatus) -> Self {
        match status {
            SeenStatus::Never => RawSeen::Sentinel(NEVER_SEEN_SENTINEL),
            SeenStatus::Seen { message_id, time } => RawSeen::Pair { message_id, time },
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message. Deleted messages stay in place as tombstones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    #[serde(default)]
    pub content: Option<String>,
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub delivered_to: BTreeMap<String, DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_by: Option<BTreeMap<String, DateTime<Utc>>>,
    /// Snapshot of the replied-to message at the time of the reply.
    #[serde(default)]
    pub reply_to: Option<Box<Message>>,
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub reactions: BTreeMap<String, Reaction>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        from: impl Into<String>,
        content: Option<String>,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            content,
            posted_at,
            delivered_to: BTreeMap::new(),
            seen_by: None,
            reply_to: None,
            edited: false,
            deleted: false,
            reactions: BTreeMap::new(),
        }
    }
}
