//! Event ingestion: push events in, store mutations out.
//!
//! Every event maps to exactly one store mutation. `@messagePosted` also
//! decides whether the user gets notified.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use messenger_shared::{ConversationId, Message, PushEvent};
use messenger_store::preferences::is_muted;
use messenger_store::{Outcome, Preferences};

use crate::hooks::NotificationSink;
use crate::state::SharedStore;

/// Applies decoded push events to the session store.
///
/// Built once per session; events must be fed in delivery order.
#[derive(Clone)]
pub struct EventIngestion {
    store: SharedStore,
    prefs: Arc<dyn Preferences>,
    notifier: Arc<dyn NotificationSink>,
}

impl EventIngestion {
    pub fn new(
        store: SharedStore,
        prefs: Arc<dyn Preferences>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            prefs,
            notifier,
        }
    }

    /// Decode and apply a raw event. Unknown names and bad payloads are
    /// logged and dropped.
    pub fn handle(&self, name: &str, payload: Value) -> Outcome {
        match PushEvent::decode(name, payload) {
            Ok(event) => self.apply(event),
            Err(e) => {
                warn!(event = %name, error = %e, "Dropping undecodable event");
                Outcome::Ignored
            }
        }
    }

    pub fn apply(&self, event: PushEvent) -> Outcome {
        let name = event.name();
        let outcome = match event {
            PushEvent::UserCreated { user } => self.store.mutate(|s| s.upsert_user(user)),

            PushEvent::ConversationCreated { conversation }
            | PushEvent::ParticipantAdded { conversation }
            | PushEvent::ParticipantRemoved { conversation }
            | PushEvent::ConversationSeen { conversation } => {
                self.store.mutate(|s| s.upsert_conversation(conversation))
            }

            PushEvent::MessagePosted {
                conversation_id,
                message,
            } => self.message_posted(conversation_id, message),

            PushEvent::MessageDelivered {
                conversation_id,
                message,
            }
            | PushEvent::MessageReacted {
                conversation_id,
                message,
            }
            | PushEvent::MessageEdited {
                conversation_id,
                message,
            } => self
                .store
                .mutate(|s| s.upsert_message_conversation(&conversation_id, message)),

            PushEvent::MessageDeleted {
                conversation_id,
                message_id,
            } => self
                .store
                .mutate(|s| s.upsert_deleted_message_conversation(&conversation_id, &message_id)),

            PushEvent::UsersAvailable { usernames } => {
                self.store.mutate(|s| s.upsert_users_available(usernames))
            }

            PushEvent::ConversationTyped {
                conversation_id,
                username,
                date,
            } => self
                .store
                .mutate(|s| s.upsert_conversation_typed(&conversation_id, &username, date)),

            PushEvent::ConversationThemeSet {
                conversation_id,
                theme,
            } => self
                .store
                .mutate(|s| s.upsert_conversation_theme(&conversation_id, theme)),

            PushEvent::ConversationTitleSet {
                conversation_id,
                title,
            } => self
                .store
                .mutate(|s| s.upsert_conversation_title(&conversation_id, title)),

            PushEvent::ParticipantNicknameSet {
                conversation_id,
                participant,
                nickname,
            } => self.store.mutate(|s| {
                s.upsert_conversation_nickname(&conversation_id, &participant, nickname)
            }),
        };

        debug!(event = name, outcome = ?outcome, "Event applied");
        outcome
    }

    fn message_posted(&self, conversation_id: ConversationId, message: Message) -> Outcome {
        let notify = message.clone();
        let outcome = self
            .store
            .mutate(|s| s.upsert_message_conversation(&conversation_id, message));

        // A redelivered id replaces in place and must not ring twice.
        if outcome != Outcome::Inserted {
            return outcome;
        }

        let (is_current, from_me) = self.store.read(|s| {
            (
                s.current_conversation_id() == Some(&conversation_id),
                s.is_me(&notify.from),
            )
        });
        if is_current || from_me {
            return outcome;
        }
        if is_muted(self.prefs.as_ref(), &conversation_id) {
            debug!(conversation = %conversation_id, "Conversation muted, no notification");
            return outcome;
        }

        self.notifier.message_arrived(&conversation_id, &notify);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use messenger_shared::constants::MUTED_CONVERSATIONS_KEY;
    use messenger_shared::protocol::events;
    use messenger_shared::{Conversation, ConversationType, Theme, User};
    use messenger_store::{EntityStore, MemoryPreferences};

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(ConversationId, String)>>,
    }

    impl RecordingNotifier {
        fn calls(&self) -> Vec<(ConversationId, String)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingNotifier {
        fn message_arrived(&self, conversation_id: &ConversationId, message: &Message) {
            self.seen
                .lock()
                .unwrap()
                .push((conversation_id.clone(), message.id.to_string()));
        }
    }

    struct Fixture {
        store: SharedStore,
        prefs: Arc<MemoryPreferences>,
        notifier: Arc<RecordingNotifier>,
        ingestion: EventIngestion,
    }

    fn fixture() -> Fixture {
        let store = SharedStore::new(EntityStore::new("alice"));
        store.replace(|s| {
            s.set_users(vec![User::new("alice"), User::new("bob")]);
            s.set_conversations(vec![Conversation::new(
                "c1",
                ConversationType::OneToOne,
                vec!["alice".into(), "bob".into()],
            )]);
        });
        let prefs = Arc::new(MemoryPreferences::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let ingestion = EventIngestion::new(store.clone(), prefs.clone(), notifier.clone());
        Fixture {
            store,
            prefs,
            notifier,
            ingestion,
        }
    }

    fn posted(id: &str, from: &str, content: &str) -> Value {
        json!({
            "conversation_id": "c1",
            "message": {
                "id": id,
                "from": from,
                "content": content,
                "posted_at": "2024-03-01T10:00:00Z",
            }
        })
    }

    #[test]
    fn test_post_then_delete_keeps_tombstone() {
        let f = fixture();

        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "bob", "hi"));
        let outcome = f.ingestion.handle(
            events::MESSAGE_DELETED,
            json!({ "conversation_id": "c1", "message_id": "m1" }),
        );
        assert_eq!(outcome, Outcome::Updated);

        let messages = f
            .store
            .read(|s| s.conversation(&"c1".into()).unwrap().messages.clone());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].deleted);
        assert_eq!(messages[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_notifies_once_per_message() {
        let f = fixture();

        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "bob", "hi"));
        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "bob", "hi"));

        assert_eq!(
            f.notifier.calls(),
            vec![(ConversationId::from("c1"), "m1".to_string())]
        );
    }

    #[test]
    fn test_no_notification_for_open_conversation() {
        let f = fixture();
        f.store.replace(|s| s.set_current_conversation_id(Some("c1".into())));

        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "bob", "hi"));

        assert!(f.notifier.calls().is_empty());
    }

    #[test]
    fn test_no_notification_for_muted_conversation() {
        let f = fixture();
        f.prefs
            .set(MUTED_CONVERSATIONS_KEY, r#"["c1"]"#.to_string())
            .unwrap();

        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "bob", "hi"));

        assert!(f.notifier.calls().is_empty());
        assert_eq!(f.store.read(|s| s.conversation(&"c1".into()).unwrap().messages.len()), 1);
    }

    #[test]
    fn test_malformed_mute_list_still_notifies() {
        let f = fixture();
        f.prefs
            .set(MUTED_CONVERSATIONS_KEY, "not a list".to_string())
            .unwrap();

        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "bob", "hi"));

        assert_eq!(f.notifier.calls().len(), 1);
    }

    #[test]
    fn test_own_messages_do_not_notify() {
        let f = fixture();

        f.ingestion.handle(events::MESSAGE_POSTED, posted("m1", "alice", "hi"));

        assert!(f.notifier.calls().is_empty());
    }

    #[test]
    fn test_message_for_unknown_conversation_is_dropped() {
        let f = fixture();
        let before = f.store.snapshot();

        let outcome = f.ingestion.handle(
            events::MESSAGE_POSTED,
            json!({
                "conversation_id": "unknown-id",
                "message": { "id": "m1", "from": "bob", "posted_at": "2024-03-01T10:00:00Z" }
            }),
        );

        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(f.store.snapshot(), before);
        assert!(f.notifier.calls().is_empty());
    }

    #[test]
    fn test_removed_participant_drops_conversation() {
        let f = fixture();
        f.store.replace(|s| s.set_current_conversation_id(Some("c1".into())));

        let outcome = f.ingestion.handle(
            events::PARTICIPANT_REMOVED,
            json!({ "conversation": { "id": "c1", "type": "one_to_one", "participants": ["bob"] } }),
        );

        assert_eq!(outcome, Outcome::Removed);
        assert!(f.store.read(|s| s.conversation(&"c1".into()).is_none()));
        assert!(f.store.read(|s| s.current_conversation_id().is_none()));
    }

    #[test]
    fn test_numeric_ids_on_conversation_updates() {
        let f = fixture();
        f.store.replace(|s| {
            s.set_conversations(vec![Conversation::new(
                "42",
                ConversationType::ManyToMany,
                vec!["alice".into(), "bob".into()],
            )])
        });

        f.ingestion.handle(
            events::CONVERSATION_THEME_SET,
            json!({ "conversation_id": 42, "theme": "RED" }),
        );
        f.ingestion.handle(
            events::CONVERSATION_TYPED,
            json!({ "conversation_id": 42, "username": "bob", "date": "2024-03-01T10:00:00Z" }),
        );
        f.ingestion.handle(
            events::PARTICIPANT_NICKNAME_SET,
            json!({ "conversation_id": 42, "participant": "bob", "nickname": "Bobby" }),
        );

        let conversation = f.store.read(|s| s.conversation(&"42".into()).cloned()).unwrap();
        assert_eq!(conversation.theme, Theme::Red);
        assert_eq!(
            conversation.typing.get("bob"),
            Some(&Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(conversation.nicknames.get("bob").map(String::as_str), Some("Bobby"));
    }

    #[test]
    fn test_presence_and_user_events() {
        let f = fixture();

        f.ingestion.handle(
            events::USER_CREATED,
            json!({ "user": { "username": "carol" } }),
        );
        f.ingestion.handle(
            events::USERS_AVAILABLE,
            json!({ "usernames": ["bob", "carol"] }),
        );

        assert!(f.store.read(|s| s.user("carol").is_some()));
        assert!(f.store.view(|v| v.is_online("carol")));
        assert!(!f.store.view(|v| v.is_online("alice")));
    }

    #[test]
    fn test_title_set_and_cleared() {
        let f = fixture();

        f.ingestion.handle(
            events::CONVERSATION_TITLE_SET,
            json!({ "conversation_id": "c1", "title": "Lunch" }),
        );
        assert_eq!(
            f.store.view(|v| v.conversation(&"c1".into()).map(|c| c.title)),
            Some("Lunch".to_string())
        );

        f.ingestion.handle(
            events::CONVERSATION_TITLE_SET,
            json!({ "conversation_id": "c1", "title": null }),
        );
        assert_eq!(
            f.store.view(|v| v.conversation(&"c1".into()).map(|c| c.title)),
            Some("bob".to_string())
        );
    }

    #[test]
    fn test_bad_events_are_ignored() {
        let f = fixture();
        let before = f.store.snapshot();
        let revision = f.store.revision();

        assert_eq!(f.ingestion.handle("@teleported", json!({})), Outcome::Ignored);
        assert_eq!(
            f.ingestion.handle(events::MESSAGE_DELETED, json!({ "conversation_id": "c1" })),
            Outcome::Ignored
        );

        assert_eq!(f.store.snapshot(), before);
        assert_eq!(f.store.revision(), revision);
    }
}
