//! Side-effect collaborators invoked by the session.
//!
//! The store never calls these; the ingestion adapter and the request
//! adapter do, after their mutation has been applied.

use tracing::info;

use messenger_shared::{ConversationId, Message};

/// Receives inbound messages that should ring.
pub trait NotificationSink: Send + Sync {
    fn message_arrived(&self, conversation_id: &ConversationId, message: &Message);
}

/// Opens a conversation in whatever surface hosts the session.
pub trait Navigator: Send + Sync {
    fn open_conversation(&self, conversation_id: &ConversationId);
}

/// Writes notifications to the log. Used by the headless binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn message_arrived(&self, conversation_id: &ConversationId, message: &Message) {
        info!(
            conversation = %conversation_id,
            from = %message.from,
            message = %message.id,
            "New message"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open_conversation(&self, conversation_id: &ConversationId) {
        info!(conversation = %conversation_id, "Opening conversation");
    }
}
