//! The in-memory entity store.
//!
//! [`EntityStore`] owns the canonical users and conversations for one client
//! session. Mutations are synchronous and total: a lookup that misses is a
//! no-op reported as [`Outcome::Ignored`], never an error. Mutation helpers
//! are spread over `users.rs`, `conversations.rs` and `messages.rs`.

use std::collections::BTreeSet;

use messenger_shared::{Conversation, ConversationId, User};

/// What a mutation did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new record was appended.
    Inserted,
    /// An existing record was replaced wholesale.
    Replaced,
    /// An existing record was dropped from the store.
    Removed,
    /// A field of an existing record was changed in place.
    Updated,
    /// The target was unknown; nothing changed.
    Ignored,
}

impl Outcome {
    pub fn changed(self) -> bool {
        !matches!(self, Outcome::Ignored)
    }
}

/// Canonical client-side state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStore {
    pub(crate) authenticated_username: Option<String>,
    pub(crate) users: Vec<User>,
    pub(crate) available_usernames: BTreeSet<String>,
    pub(crate) conversations: Vec<Conversation>,
    pub(crate) current_conversation_id: Option<ConversationId>,
}

impl EntityStore {
    /// Create an empty store for the given authenticated user.
    pub fn new(authenticated_username: impl Into<String>) -> Self {
        Self {
            authenticated_username: Some(authenticated_username.into()),
            ..Self::default()
        }
    }

    pub fn authenticated_username(&self) -> Option<&str> {
        self.authenticated_username.as_deref()
    }

    /// Whether `username` is the authenticated user.
    pub fn is_me(&self, username: &str) -> bool {
        self.authenticated_username.as_deref() == Some(username)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn available_usernames(&self) -> &BTreeSet<String> {
        &self.available_usernames
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub(crate) fn conversation_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| &c.id == id)
    }

    pub fn current_conversation_id(&self) -> Option<&ConversationId> {
        self.current_conversation_id.as_ref()
    }

    /// Select the conversation considered open by the presentation layer.
    pub fn set_current_conversation_id(&mut self, id: Option<ConversationId>) {
        self.current_conversation_id = id;
    }
}
