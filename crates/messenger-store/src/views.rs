//! Read-only projections over the entity store.
//!
//! A [`Projector`] borrows a store snapshot and derives the shapes the
//! presentation layer renders: users with presence flags, conversations with
//! a display title and picture, messages with resolved authors, and seen
//! receipts. Nothing here mutates or caches; calling any method twice on the
//! same snapshot yields equal values.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use messenger_shared::constants::{
    DEFAULT_PICTURE_URL, DEFAULT_TYPING_TIMEOUT_SECS, FALLBACK_TITLE, GROUP_TITLE_SEPARATOR,
};
use messenger_shared::{
    Conversation, ConversationId, ConversationType, Message, MessageId, SeenStatus, Theme, User,
};

use crate::store::EntityStore;

// ---------------------------------------------------------------------------
// Derived shapes
// ---------------------------------------------------------------------------

/// A user plus presence and self flags.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedUser {
    #[serde(flatten)]
    pub user: User,
    pub is_online: bool,
    pub is_me: bool,
}

impl ExtendedUser {
    pub fn username(&self) -> &str {
        &self.user.username
    }
}

/// A message whose author is resolved to a user snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtendedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub author: ExtendedUser,
}

/// One resolved read receipt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSeen {
    pub user: ExtendedUser,
    pub message_id: MessageId,
    pub time: DateTime<Utc>,
    /// Human-readable receipt, e.g. `Seen by Bobby (bob) at 01/03/2024 10:00`.
    pub label: String,
}

/// A conversation ready for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtendedConversation {
    pub id: ConversationId,
    #[serde(rename = "type")]
    pub kind: ConversationType,
    pub participants: Vec<String>,
    pub users: Vec<ExtendedUser>,
    pub messages: Vec<ExtendedMessage>,
    pub title: String,
    pub picture_url: String,
    pub theme: Theme,
    pub nicknames: BTreeMap<String, String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub seen: Vec<UserSeen>,
    pub typing: BTreeMap<String, DateTime<Utc>>,
    #[serde(rename = "isOnline")]
    pub is_online: bool,
}

// ---------------------------------------------------------------------------
// Projector
// ---------------------------------------------------------------------------

/// Pure view derivation over one store snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    store: &'a EntityStore,
    typing_timeout: Duration,
    offset: FixedOffset,
}

impl<'a> Projector<'a> {
    pub fn new(store: &'a EntityStore) -> Self {
        Self {
            store,
            typing_timeout: Duration::from_secs(DEFAULT_TYPING_TIMEOUT_SECS),
            offset: Utc.fix(),
        }
    }

    /// How long after a typing signal a participant still counts as typing.
    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing_timeout = timeout;
        self
    }

    /// Offset used to render receipt times in labels.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn store(&self) -> &'a EntityStore {
        self.store
    }

    // -- users -------------------------------------------------------------

    pub fn is_online(&self, username: &str) -> bool {
        self.store.available_usernames().contains(username)
    }

    pub fn extend_user(&self, user: &User) -> ExtendedUser {
        ExtendedUser {
            user: user.clone(),
            is_online: self.is_online(&user.username),
            is_me: self.store.is_me(&user.username),
        }
    }

    /// Resolve a username to a user snapshot. Usernames the store does not
    /// know yet get a bare placeholder so views stay total.
    pub fn resolve_user(&self, username: &str) -> ExtendedUser {
        match self.store.user(username) {
            Some(user) => self.extend_user(user),
            None => self.extend_user(&User::new(username)),
        }
    }

    pub fn users(&self) -> Vec<ExtendedUser> {
        self.store.users().iter().map(|u| self.extend_user(u)).collect()
    }

    pub fn user(&self, username: &str) -> Option<ExtendedUser> {
        self.store.user(username).map(|u| self.extend_user(u))
    }

    // -- conversations -----------------------------------------------------

    pub fn conversations(&self) -> Vec<ExtendedConversation> {
        self.store
            .conversations()
            .iter()
            .map(|c| self.extend_conversation(c))
            .collect()
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<ExtendedConversation> {
        self.store.conversation(id).map(|c| self.extend_conversation(c))
    }

    pub fn current_conversation(&self) -> Option<ExtendedConversation> {
        self.store
            .current_conversation_id()
            .and_then(|id| self.conversation(id))
    }

    /// Participants of the open conversation other than the client user.
    pub fn current_conversation_participants(&self) -> Vec<String> {
        self.store
            .current_conversation_id()
            .and_then(|id| self.store.conversation(id))
            .map(|c| self.others(c).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether anyone else in the open conversation is reachable.
    pub fn participants_are_online(&self) -> bool {
        self.store
            .current_conversation_id()
            .and_then(|id| self.store.conversation(id))
            .is_some_and(|c| self.conversation_is_online(c))
    }

    /// A conversation is online when at least one other participant is.
    pub fn conversation_is_online(&self, conversation: &Conversation) -> bool {
        self.others(conversation).any(|p| self.is_online(p))
    }

    pub fn extend_conversation(&self, conversation: &Conversation) -> ExtendedConversation {
        ExtendedConversation {
            id: conversation.id.clone(),
            kind: conversation.kind,
            participants: conversation.participants.clone(),
            users: conversation
                .participants
                .iter()
                .map(|p| self.resolve_user(p))
                .collect(),
            messages: conversation
                .messages
                .iter()
                .map(|m| self.extend_message(m))
                .collect(),
            title: self.title(conversation),
            picture_url: self.picture_url(conversation),
            theme: conversation.theme,
            nicknames: conversation.nicknames.clone(),
            updated_at: conversation.updated_at,
            seen: self.seen(conversation),
            typing: conversation.typing.clone(),
            is_online: self.conversation_is_online(conversation),
        }
    }

    pub fn extend_message(&self, message: &Message) -> ExtendedMessage {
        ExtendedMessage {
            message: message.clone(),
            author: self.resolve_user(&message.from),
        }
    }

    /// Display title: explicit title, then the member list for groups, then
    /// the other party for one-to-one, then a fixed fallback.
    pub fn title(&self, conversation: &Conversation) -> String {
        if let Some(title) = conversation.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.to_string();
        }

        let derived = match conversation.kind {
            ConversationType::ManyToMany => {
                let names: Vec<&str> = conversation
                    .participants
                    .iter()
                    .map(|p| self.display_name(conversation, p))
                    .collect();
                (!names.is_empty()).then(|| names.join(GROUP_TITLE_SEPARATOR))
            }
            ConversationType::OneToOne => self.other_participant(conversation).map(str::to_string),
        };

        derived.unwrap_or_else(|| FALLBACK_TITLE.to_string())
    }

    /// One-to-one conversations show the other party's picture; groups and
    /// pictureless users fall back to the default.
    pub fn picture_url(&self, conversation: &Conversation) -> String {
        let borrowed = match conversation.kind {
            ConversationType::OneToOne => self
                .other_participant(conversation)
                .and_then(|p| self.store.user(p))
                .map(|u| u.picture_url.as_str())
                .filter(|url| !url.is_empty()),
            ConversationType::ManyToMany => None,
        };

        borrowed.unwrap_or(DEFAULT_PICTURE_URL).to_string()
    }

    /// Per-conversation nickname of `username`, if one was set.
    pub fn nickname<'c>(&self, conversation: &'c Conversation, username: &str) -> Option<&'c str> {
        conversation
            .nicknames
            .get(username)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    /// Nickname if set, else the username.
    pub fn display_name<'c>(&self, conversation: &'c Conversation, username: &'c str) -> &'c str {
        self.nickname(conversation, username).unwrap_or(username)
    }

    /// Read receipts. Users who never saw anything are left out.
    pub fn seen(&self, conversation: &Conversation) -> Vec<UserSeen> {
        conversation
            .seen
            .iter()
            .filter_map(|(username, status)| match status {
                SeenStatus::Never => None,
                SeenStatus::Seen { message_id, time } => Some(UserSeen {
                    user: self.resolve_user(username),
                    message_id: message_id.clone(),
                    time: *time,
                    label: self.seen_label(conversation, username, time),
                }),
            })
            .collect()
    }

    /// Other participants whose last typing signal is younger than the
    /// timeout at `now`. Signals stamped ahead of `now` count as fresh.
    pub fn typing_participants(&self, conversation: &Conversation, now: DateTime<Utc>) -> Vec<String> {
        let window = chrono::Duration::from_std(self.typing_timeout).unwrap_or(chrono::Duration::MAX);

        conversation
            .typing
            .iter()
            .filter(|(username, _)| !self.store.is_me(username))
            .filter(|(_, at)| now - **at < window)
            .map(|(username, _)| username.clone())
            .collect()
    }

    /// The first participant that is not the client user.
    pub fn other_participant<'c>(&self, conversation: &'c Conversation) -> Option<&'c str> {
        self.others(conversation).next()
    }

    fn others<'c>(&self, conversation: &'c Conversation) -> impl Iterator<Item = &'c str> + 'c {
        let me = self.store.authenticated_username().map(str::to_string);
        conversation
            .participants
            .iter()
            .map(String::as_str)
            .filter(move |p| me.as_deref() != Some(*p))
    }

    fn seen_label(&self, conversation: &Conversation, username: &str, time: &DateTime<Utc>) -> String {
        let local = time.with_timezone(&self.offset).format("%d/%m/%Y %H:%M");
        match self.nickname(conversation, username) {
            Some(nickname) => format!("Seen by {nickname} ({username}) at {local}"),
            None => format!("Seen by {username} at {local}"),
        }
    }
}
