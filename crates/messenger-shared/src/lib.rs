//! # messenger-shared
//!
//! Domain entities, wire protocol names and payloads shared by the store,
//! the transport and the client session.

pub mod constants;
pub mod error;
pub mod identity;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
pub use identity::Auth;
pub use models::{Conversation, Message, SeenStatus, User};
pub use protocol::{PushEvent, RemoteRequest};
pub use types::{ConversationId, ConversationType, MessageId, Reaction, Theme};
