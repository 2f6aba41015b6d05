/// Application name
pub const APP_NAME: &str = "Messenger";

/// Prefix marking a wire-level name as remote (server) origin
pub const REMOTE_PREFIX: char = '@';

/// Wire value of the "never seen" marker in a conversation's `seen` map
pub const NEVER_SEEN_SENTINEL: i64 = -1;

/// Title shown when a conversation has nothing better to offer
pub const FALLBACK_TITLE: &str = "Anonymous";

/// Separator used when a group title is synthesized from its members
pub const GROUP_TITLE_SEPARATOR: &str = ", ";

/// Picture used for group conversations and users without one
pub const DEFAULT_PICTURE_URL: &str = "/img/default-avatar.png";

/// Preference key holding the JSON list of muted conversation ids
pub const MUTED_CONVERSATIONS_KEY: &str = "conversationMuteId";

/// How long a typing signal stays visible, in seconds
pub const DEFAULT_TYPING_TIMEOUT_SECS: u64 = 5;

/// Default chat server address (TCP)
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";

/// Capacity of the transport command and notification channels
pub const TRANSPORT_CHANNEL_CAPACITY: usize = 256;
