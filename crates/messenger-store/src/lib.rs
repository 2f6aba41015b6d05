//! # messenger-store
//!
//! The client's single source of truth for users and conversations.
//!
//! [`EntityStore`] holds the canonical state and exposes the only mutation
//! surface; every push event and every request response funnels through it.
//! [`Projector`] derives the read-only views (presence, titles, pictures,
//! seen receipts, typing) from a store snapshot. Local preferences such as
//! the muted-conversation list live in [`preferences`].

pub mod conversations;
pub mod messages;
pub mod preferences;
pub mod store;
pub mod users;
pub mod views;

mod error;

pub use error::{Result, StoreError};
pub use preferences::{FilePreferences, MemoryPreferences, Preferences};
pub use store::{EntityStore, Outcome};
pub use views::{ExtendedConversation, ExtendedMessage, ExtendedUser, Projector, UserSeen};
