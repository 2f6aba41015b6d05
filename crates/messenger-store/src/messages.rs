use tracing::debug;

use messenger_shared::{ConversationId, Message, MessageId};

use crate::store::{EntityStore, Outcome};

impl EntityStore {
    /// Merge a message into its conversation.
    ///
    /// Messages keep arrival order; a known id is replaced where it stands,
    /// a new one is appended. Events for a conversation whose snapshot has
    /// not arrived yet are dropped.
    pub fn upsert_message_conversation(
        &mut self,
        conversation_id: &ConversationId,
        message: Message,
    ) -> Outcome {
        let Some(conversation) = self.conversation_mut(conversation_id) else {
            debug!(
                conversation = %conversation_id,
                message = %message.id,
                "message for unknown conversation ignored"
            );
            return Outcome::Ignored;
        };

        match conversation.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => {
                *existing = message;
                Outcome::Replaced
            }
            None => {
                conversation.messages.push(message);
                Outcome::Inserted
            }
        }
    }

    /// Flag a message as deleted. The record and its content stay in place.
    pub fn upsert_deleted_message_conversation(
        &mut self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Outcome {
        let message = self
            .conversation_mut(conversation_id)
            .and_then(|c| c.messages.iter_mut().find(|m| &m.id == message_id));

        match message {
            Some(message) => {
                message.deleted = true;
                Outcome::Updated
            }
            None => {
                debug!(
                    conversation = %conversation_id,
                    message = %message_id,
                    "delete for unknown message ignored"
                );
                Outcome::Ignored
            }
        }
    }
}
