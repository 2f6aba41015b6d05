use tracing::{debug, info};

use messenger_shared::protocol::{
    AddParticipant, ConversationAck, CreateManyToManyConversation, GetConversations,
    GetOrCreateOneToOneConversation, RemoveParticipant, SeeConversation, SetConversationTheme,
    TypeConversation,
};
use messenger_shared::{Conversation, ConversationId, MessageId, Theme};
use messenger_store::Outcome;

use super::Client;
use crate::error::Result;

impl Client {
    /// `@getConversations`: replace the known conversations.
    pub async fn get_conversations(&self) -> Result<()> {
        let response = self.call(&GetConversations {}).await?;
        let count = response.conversations.len();
        self.store.replace(|s| s.set_conversations(response.conversations));
        info!(count, "Conversations loaded");
        Ok(())
    }

    /// `@getOrCreateOneToOneConversation`, then open it.
    pub async fn create_one_to_one_conversation(&self, username: &str) -> Result<ConversationId> {
        let response = self
            .call(&GetOrCreateOneToOneConversation {
                username: username.to_string(),
            })
            .await?;
        Ok(self.open_created(response.conversation))
    }

    /// `@createManyToManyConversation`, then open it.
    pub async fn create_many_to_many_conversation(&self, usernames: Vec<String>) -> Result<ConversationId> {
        let response = self.call(&CreateManyToManyConversation { usernames }).await?;
        Ok(self.open_created(response.conversation))
    }

    pub async fn add_participant(&self, conversation_id: &ConversationId, username: &str) -> Result<Outcome> {
        let ack = self
            .call(&AddParticipant {
                conversation_id: conversation_id.clone(),
                username: username.to_string(),
            })
            .await?;
        Ok(self.apply_conversation_ack(ack))
    }

    pub async fn remove_participant(&self, conversation_id: &ConversationId, username: &str) -> Result<Outcome> {
        let ack = self
            .call(&RemoveParticipant {
                conversation_id: conversation_id.clone(),
                username: username.to_string(),
            })
            .await?;
        Ok(self.apply_conversation_ack(ack))
    }

    /// Mark the conversation as read up to `message_id`.
    pub async fn see_conversation(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Outcome> {
        let ack = self
            .call(&SeeConversation {
                conversation_id: conversation_id.clone(),
                message_id: message_id.clone(),
            })
            .await?;
        Ok(self.apply_conversation_ack(ack))
    }

    /// Signal that the client user is typing. The echo event updates the
    /// store for everyone else.
    pub async fn type_conversation(&self, conversation_id: &ConversationId) -> Result<()> {
        self.call(&TypeConversation {
            conversation_id: conversation_id.clone(),
        })
        .await?;
        Ok(())
    }

    pub async fn set_conversation_theme(
        &self,
        conversation_id: &ConversationId,
        theme: Theme,
    ) -> Result<Outcome> {
        let ack = self
            .call(&SetConversationTheme {
                conversation_id: conversation_id.clone(),
                theme,
            })
            .await?;

        Ok(match ack.conversation {
            Some(conversation) => self.store.mutate(|s| s.upsert_conversation(conversation)),
            None => self
                .store
                .mutate(|s| s.upsert_conversation_theme(conversation_id, theme)),
        })
    }

    fn open_created(&self, conversation: Conversation) -> ConversationId {
        let id = conversation.id.clone();
        let outcome = self.store.mutate(|s| s.upsert_conversation(conversation));
        debug!(conversation = %id, outcome = ?outcome, "Conversation ready");
        self.navigator.open_conversation(&id);
        id
    }

    fn apply_conversation_ack(&self, ack: ConversationAck) -> Outcome {
        match ack.conversation {
            Some(conversation) => self.store.mutate(|s| s.upsert_conversation(conversation)),
            None => Outcome::Ignored,
        }
    }
}
