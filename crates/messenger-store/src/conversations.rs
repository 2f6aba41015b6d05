use chrono::{DateTime, Utc};
use tracing::debug;

use messenger_shared::{Conversation, ConversationId, Theme};

use crate::store::{EntityStore, Outcome};

impl EntityStore {
    /// Replace every known conversation (initial sync or re-sync).
    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        debug!(count = conversations.len(), "replacing conversations");
        self.conversations = conversations;
    }

    /// Merge a conversation snapshot.
    ///
    /// A known conversation that no longer lists the authenticated user is
    /// removed: leaving the participant list is how the server tells a client
    /// it lost access. Without an authenticated user membership cannot be
    /// judged and the snapshot simply replaces the stored one.
    pub fn upsert_conversation(&mut self, conversation: Conversation) -> Outcome {
        let Some(index) = self
            .conversations
            .iter()
            .position(|c| c.id == conversation.id)
        else {
            self.conversations.push(conversation);
            return Outcome::Inserted;
        };

        let still_member = match self.authenticated_username.as_deref() {
            Some(me) => conversation.has_participant(me),
            None => true,
        };

        if still_member {
            self.conversations[index] = conversation;
            Outcome::Replaced
        } else {
            let removed = self.conversations.remove(index);
            debug!(conversation = %removed.id, "removed from conversation, dropping it");
            if self.current_conversation_id.as_ref() == Some(&removed.id) {
                self.current_conversation_id = None;
            }
            Outcome::Removed
        }
    }

    /// Record that `username` typed in the conversation at `date`.
    pub fn upsert_conversation_typed(
        &mut self,
        conversation_id: &ConversationId,
        username: &str,
        date: DateTime<Utc>,
    ) -> Outcome {
        self.update_conversation(conversation_id, |c| {
            c.typing.insert(username.to_string(), date);
        })
    }

    pub fn upsert_conversation_title(
        &mut self,
        conversation_id: &ConversationId,
        title: Option<String>,
    ) -> Outcome {
        self.update_conversation(conversation_id, |c| c.title = title)
    }

    pub fn upsert_conversation_theme(&mut self, conversation_id: &ConversationId, theme: Theme) -> Outcome {
        self.update_conversation(conversation_id, |c| c.theme = theme)
    }

    pub fn upsert_conversation_nickname(
        &mut self,
        conversation_id: &ConversationId,
        participant: &str,
        nickname: String,
    ) -> Outcome {
        self.update_conversation(conversation_id, |c| {
            c.nicknames.insert(participant.to_string(), nickname);
        })
    }

    fn update_conversation<F>(&mut self, conversation_id: &ConversationId, apply: F) -> Outcome
    where
        F: FnOnce(&mut Conversation),
    {
        match self.conversation_mut(conversation_id) {
            Some(conversation) => {
                apply(conversation);
                Outcome::Updated
            }
            None => {
                debug!(conversation = %conversation_id, "update for unknown conversation ignored");
                Outcome::Ignored
            }
        }
    }
}
