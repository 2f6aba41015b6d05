use messenger_shared::protocol::{
    DeleteMessage, EditMessage, MessageAck, PostMessage, ReactMessage, ReplyMessage,
};
use messenger_shared::{ConversationId, MessageId, Reaction};
use messenger_store::Outcome;

use super::Client;
use crate::error::Result;

impl Client {
    pub async fn post_message(&self, conversation_id: &ConversationId, content: &str) -> Result<Outcome> {
        let ack = self
            .call(&PostMessage {
                conversation_id: conversation_id.clone(),
                content: content.to_string(),
            })
            .await?;
        Ok(self.apply_message_ack(conversation_id, ack))
    }

    pub async fn edit_message(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<Outcome> {
        let ack = self
            .call(&EditMessage {
                conversation_id: conversation_id.clone(),
                message_id: message_id.clone(),
                content: content.to_string(),
            })
            .await?;
        Ok(self.apply_message_ack(conversation_id, ack))
    }

    /// Delete a message. Without an echoed message the local copy is
    /// flagged directly.
    pub async fn delete_message(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Outcome> {
        let ack = self
            .call(&DeleteMessage {
                conversation_id: conversation_id.clone(),
                message_id: message_id.clone(),
            })
            .await?;

        if ack.message.is_some() {
            return Ok(self.apply_message_ack(conversation_id, ack));
        }
        Ok(self
            .store
            .mutate(|s| s.upsert_deleted_message_conversation(conversation_id, message_id)))
    }

    pub async fn react_message(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        reaction: Reaction,
    ) -> Result<Outcome> {
        let ack = self
            .call(&ReactMessage {
                conversation_id: conversation_id.clone(),
                message_id: message_id.clone(),
                reaction,
            })
            .await?;
        Ok(self.apply_message_ack(conversation_id, ack))
    }

    pub async fn reply_message(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<Outcome> {
        let ack = self
            .call(&ReplyMessage {
                conversation_id: conversation_id.clone(),
                message_id: message_id.clone(),
                content: content.to_string(),
            })
            .await?;
        Ok(self.apply_message_ack(conversation_id, ack))
    }

    // The ack may name the conversation itself; trust it over the request.
    fn apply_message_ack(&self, conversation_id: &ConversationId, ack: MessageAck) -> Outcome {
        let Some(message) = ack.message else {
            return Outcome::Ignored;
        };
        let conversation_id = ack.conversation_id.unwrap_or_else(|| conversation_id.clone());
        self.store
            .mutate(|s| s.upsert_message_conversation(&conversation_id, message))
    }
}
