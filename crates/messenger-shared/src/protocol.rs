//! Named wire-level requests and push events.
//!
//! Every name carries the `@` prefix marking remote origin. Requests are
//! typed through [`RemoteRequest`], which ties the payload to its wire name
//! and its response shape. Push events decode into [`PushEvent`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::models::{Conversation, Message, User};
use crate::types::{ConversationId, MessageId, Reaction, Theme};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// An outbound request with a correlated response.
pub trait RemoteRequest: Serialize + Send + Sync {
    /// Wire name, including the `@` prefix.
    const NAME: &'static str;
    type Response: DeserializeOwned + Send;
}

macro_rules! remote_request {
    ($req:ty, $name:literal, $resp:ty) => {
        impl RemoteRequest for $req {
            const NAME: &'static str = $name;
            type Response = $resp;
        }
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetUsers {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetConversations {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrCreateOneToOneConversation {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManyToManyConversation {
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessage {
    pub conversation_id: ConversationId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub reaction: Reaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddParticipant {
    pub conversation_id: ConversationId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveParticipant {
    pub conversation_id: ConversationId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeeConversation {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConversation {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetConversationTheme {
    pub conversation_id: ConversationId,
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation: Conversation,
}

/// Acknowledgement of a message-level request. Servers may echo the
/// resulting message; when they do not, the push event carries it instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageAck {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Acknowledgement of a conversation-level request, optionally carrying the
/// updated conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationAck {
    #[serde(default)]
    pub conversation: Option<Conversation>,
}

/// Bare acknowledgement; any extra fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {}

remote_request!(GetUsers, "@getUsers", UsersResponse);
remote_request!(GetConversations, "@getConversations", ConversationsResponse);
remote_request!(
    GetOrCreateOneToOneConversation,
    "@getOrCreateOneToOneConversation",
    ConversationResponse
);
remote_request!(
    CreateManyToManyConversation,
    "@createManyToManyConversation",
    ConversationResponse
);
remote_request!(PostMessage, "@postMessage", MessageAck);
remote_request!(EditMessage, "@editMessage", MessageAck);
remote_request!(DeleteMessage, "@deleteMessage", MessageAck);
remote_request!(ReactMessage, "@reactMessage", MessageAck);
remote_request!(ReplyMessage, "@replyMessage", MessageAck);
remote_request!(AddParticipant, "@addParticipant", ConversationAck);
remote_request!(RemoveParticipant, "@removeParticipant", ConversationAck);
remote_request!(SeeConversation, "@seeConversation", ConversationAck);
remote_request!(TypeConversation, "@typeConversation", Ack);
remote_request!(SetConversationTheme, "@setConversationTheme", ConversationAck);

// ---------------------------------------------------------------------------
// Push events
// ---------------------------------------------------------------------------

/// Wire names of every push event the client subscribes to.
pub mod events {
    pub const USER_CREATED: &str = "@userCreated";
    pub const CONVERSATION_CREATED: &str = "@conversationCreated";
    pub const PARTICIPANT_ADDED: &str = "@participantAdded";
    pub const PARTICIPANT_REMOVED: &str = "@participantRemoved";
    pub const CONVERSATION_SEEN: &str = "@conversationSeen";
    pub const MESSAGE_POSTED: &str = "@messagePosted";
    pub const MESSAGE_DELIVERED: &str = "@messageDelivered";
    pub const MESSAGE_REACTED: &str = "@messageReacted";
    pub const MESSAGE_EDITED: &str = "@messageEdited";
    pub const MESSAGE_DELETED: &str = "@messageDeleted";
    pub const USERS_AVAILABLE: &str = "@usersAvailable";
    pub const CONVERSATION_TYPED: &str = "@conversationTyped";
    pub const CONVERSATION_THEME_SET: &str = "@conversationThemeSet";
    pub const CONVERSATION_TITLE_SET: &str = "@conversationTitleSet";
    pub const PARTICIPANT_NICKNAME_SET: &str = "@participantNicknameSet";

    pub const ALL: &[&str] = &[
        USER_CREATED,
        CONVERSATION_CREATED,
        PARTICIPANT_ADDED,
        PARTICIPANT_REMOVED,
        CONVERSATION_SEEN,
        MESSAGE_POSTED,
        MESSAGE_DELIVERED,
        MESSAGE_REACTED,
        MESSAGE_EDITED,
        MESSAGE_DELETED,
        USERS_AVAILABLE,
        CONVERSATION_TYPED,
        CONVERSATION_THEME_SET,
        CONVERSATION_TITLE_SET,
        PARTICIPANT_NICKNAME_SET,
    ];
}

/// A server-originated notification, decoded from its name and payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "name", content = "payload")]
pub enum PushEvent {
    #[serde(rename = "@userCreated")]
    UserCreated { user: User },

    #[serde(rename = "@conversationCreated")]
    ConversationCreated { conversation: Conversation },

    #[serde(rename = "@participantAdded")]
    ParticipantAdded { conversation: Conversation },

    #[serde(rename = "@participantRemoved")]
    ParticipantRemoved { conversation: Conversation },

    #[serde(rename = "@conversationSeen")]
    ConversationSeen { conversation: Conversation },

    #[serde(rename = "@messagePosted")]
    MessagePosted {
        conversation_id: ConversationId,
        message: Message,
    },

    #[serde(rename = "@messageDelivered")]
    MessageDelivered {
        conversation_id: ConversationId,
        message: Message,
    },

    #[serde(rename = "@messageReacted")]
    MessageReacted {
        conversation_id: ConversationId,
        message: Message,
    },

    #[serde(rename = "@messageEdited")]
    MessageEdited {
        conversation_id: ConversationId,
        message: Message,
    },

    #[serde(rename = "@messageDeleted")]
    MessageDeleted {
        conversation_id: ConversationId,
        message_id: MessageId,
    },

    #[serde(rename = "@usersAvailable")]
    UsersAvailable { usernames: Vec<String> },

    #[serde(rename = "@conversationTyped")]
    ConversationTyped {
        conversation_id: ConversationId,
        username: String,
        date: DateTime<Utc>,
    },

    #[serde(rename = "@conversationThemeSet")]
    ConversationThemeSet {
        conversation_id: ConversationId,
        theme: Theme,
    },

    #[serde(rename = "@conversationTitleSet")]
    ConversationTitleSet {
        conversation_id: ConversationId,
        title: Option<String>,
    },

    #[serde(rename = "@participantNicknameSet")]
    ParticipantNicknameSet {
        conversation_id: ConversationId,
        participant: String,
        nickname: String,
    },
}

impl PushEvent {
    /// Decode a named event and its JSON payload.
    pub fn decode(name: &str, payload: serde_json::Value) -> Result<Self, ProtocolError> {
        if !events::ALL.contains(&name) {
            return Err(ProtocolError::UnknownEvent(name.to_string()));
        }

        let tagged = serde_json::json!({ "name": name, "payload": payload });
        serde_json::from_value(tagged).map_err(|source| ProtocolError::Payload {
            name: name.to_string(),
            source,
        })
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::UserCreated { .. } => events::USER_CREATED,
            PushEvent::ConversationCreated { .. } => events::CONVERSATION_CREATED,
            PushEvent::ParticipantAdded { .. } => events::PARTICIPANT_ADDED,
            PushEvent::ParticipantRemoved { .. } => events::PARTICIPANT_REMOVED,
            PushEvent::ConversationSeen { .. } => events::CONVERSATION_SEEN,
            PushEvent::MessagePosted { .. } => events::MESSAGE_POSTED,
            PushEvent::MessageDelivered { .. } => events::MESSAGE_DELIVERED,
            PushEvent::MessageReacted { .. } => events::MESSAGE_REACTED,
            PushEvent::MessageEdited { .. } => events::MESSAGE_EDITED,
            PushEvent::MessageDeleted { .. } => events::MESSAGE_DELETED,
            PushEvent::UsersAvailable { .. } => events::USERS_AVAILABLE,
            PushEvent::ConversationTyped { .. } => events::CONVERSATION_TYPED,
            PushEvent::ConversationThemeSet { .. } => events::CONVERSATION_THEME_SET,
            PushEvent::ConversationTitleSet { .. } => events::CONVERSATION_TITLE_SET,
            PushEvent::ParticipantNicknameSet { .. } => events::PARTICIPANT_NICKNAME_SET,
        }
    }

    /// Split into wire name and payload, the inverse of [`PushEvent::decode`].
    pub fn encode(&self) -> Result<(&'static str, serde_json::Value), ProtocolError> {
        let mut tagged = serde_json::to_value(self)?;
        let payload = tagged
            .get_mut("payload")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null);
        Ok((self.name(), payload))
    }
}
