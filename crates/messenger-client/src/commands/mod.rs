//! Request adapter.
//!
//! Each outbound intent is one request/response exchange followed by the
//! same store mutations ingestion uses. Sub-modules group the intents by the
//! entity they touch. Nothing is applied before the server answers, so a
//! failed request leaves the store untouched.

pub mod conversations;
pub mod messaging;
pub mod users;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use messenger_net::TransportHandle;
use messenger_shared::RemoteRequest;

use crate::error::{ClientError, Result};
use crate::hooks::Navigator;
use crate::state::SharedStore;

/// Cloneable entry point for outbound requests.
#[derive(Clone)]
pub struct Client {
    transport: TransportHandle,
    store: SharedStore,
    navigator: Arc<dyn Navigator>,
}

impl Client {
    pub fn new(transport: TransportHandle, store: SharedStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport,
            store,
            navigator,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Send a typed request and decode its response.
    pub async fn call<R: RemoteRequest>(&self, request: &R) -> Result<R::Response> {
        let payload = serde_json::to_value(request).map_err(|source| ClientError::Encode {
            name: R::NAME,
            source,
        })?;

        let response = self.transport.request(R::NAME, payload).await?;
        debug!(request = R::NAME, "Response received");

        // Bare acks come back as `null` or `true`; read them as empty objects.
        let response = match response {
            Value::Object(_) => response,
            _ => Value::Object(Default::default()),
        };

        serde_json::from_value(response).map_err(|source| ClientError::Decode {
            name: R::NAME,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tokio::sync::mpsc;

    use messenger_net::{TransportCommand, TransportError};
    use messenger_shared::{
        Conversation, ConversationId, ConversationType, Message, Reaction, Theme, User,
    };
    use messenger_store::{EntityStore, Outcome};

    type Requests = Arc<Mutex<Vec<(String, Value)>>>;

    /// In-process server answering each request through `respond`.
    fn fake_server<F>(respond: F) -> (TransportHandle, Requests)
    where
        F: Fn(&str, &Value) -> std::result::Result<Value, TransportError> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(16);
        let requests = Requests::default();
        let log = requests.clone();

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    TransportCommand::Request {
                        name,
                        payload,
                        reply,
                    } => {
                        let answer = respond(&name, &payload);
                        log.lock().unwrap().push((name, payload));
                        let _ = reply.send(answer);
                    }
                    TransportCommand::Shutdown => break,
                }
            }
        });

        (TransportHandle::from_sender(tx), requests)
    }

    #[derive(Default)]
    struct RecordingNavigator {
        opened: Mutex<Vec<ConversationId>>,
    }

    impl Navigator for RecordingNavigator {
        fn open_conversation(&self, conversation_id: &ConversationId) {
            self.opened.lock().unwrap().push(conversation_id.clone());
        }
    }

    fn seeded_store() -> SharedStore {
        let store = SharedStore::new(EntityStore::new("alice"));
        store.replace(|s| {
            s.set_users(vec![User::new("alice"), User::new("bob")]);
            let mut c1 = Conversation::new(
                "c1",
                ConversationType::OneToOne,
                vec!["alice".into(), "bob".into()],
            );
            c1.messages.push(Message::new(
                "m1",
                "bob",
                Some("hi".into()),
                Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            ));
            s.set_conversations(vec![c1]);
        });
        store
    }

    fn client<F>(respond: F) -> (Client, Requests, Arc<RecordingNavigator>)
    where
        F: Fn(&str, &Value) -> std::result::Result<Value, TransportError> + Send + 'static,
    {
        let (transport, requests) = fake_server(respond);
        let navigator = Arc::new(RecordingNavigator::default());
        let client = Client::new(transport, seeded_store(), navigator.clone());
        (client, requests, navigator)
    }

    #[tokio::test]
    async fn test_request_payload_shape() {
        let (client, requests, _) = client(|_, _| Ok(Value::Null));

        client.post_message(&"c1".into(), "hello").await.unwrap();
        client
            .react_message(&"c1".into(), &"m1".into(), Reaction::Heart)
            .await
            .unwrap();

        let requests = requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![
                (
                    "@postMessage".to_string(),
                    json!({ "conversation_id": "c1", "content": "hello" })
                ),
                (
                    "@reactMessage".to_string(),
                    json!({ "conversation_id": "c1", "message_id": "m1", "reaction": "HEART" })
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_request_leaves_store_untouched() {
        let (client, _, navigator) =
            client(|_, _| Err(TransportError::Rejected("not a participant".into())));
        let before = client.store().snapshot();

        let err = client.post_message(&"c1".into(), "hello").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transport(TransportError::Rejected(ref m)) if m == "not a participant"
        ));

        assert!(client.create_one_to_one_conversation("bob").await.is_err());
        assert_eq!(client.store().snapshot(), before);
        assert!(navigator.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bare_ack_changes_nothing() {
        let (client, _, _) = client(|_, _| Ok(json!(true)));
        let before = client.store().snapshot();

        let outcome = client.post_message(&"c1".into(), "hello").await.unwrap();

        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(client.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_echoed_message_is_applied() {
        let (client, _, _) = client(|_, _| {
            Ok(json!({
                "message": {
                    "id": "m2",
                    "from": "alice",
                    "content": "hello",
                    "posted_at": "2024-03-01T10:01:00Z",
                }
            }))
        });

        let outcome = client.post_message(&"c1".into(), "hello").await.unwrap();

        assert_eq!(outcome, Outcome::Inserted);
        let ids: Vec<String> = client.store().read(|s| {
            s.conversation(&"c1".into())
                .unwrap()
                .messages
                .iter()
                .map(|m| m.id.to_string())
                .collect()
        });
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_delete_without_echo_flags_message() {
        let (client, _, _) = client(|_, _| Ok(json!({})));

        let outcome = client
            .delete_message(&"c1".into(), &"m1".into())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Updated);
        let message = client
            .store()
            .read(|s| s.conversation(&"c1".into()).unwrap().messages[0].clone());
        assert!(message.deleted);
        assert_eq!(message.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_set_theme_without_echo() {
        let (client, _, _) = client(|_, _| Ok(json!({})));

        let outcome = client
            .set_conversation_theme(&"c1".into(), Theme::Rainbow)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(
            client.store().read(|s| s.conversation(&"c1".into()).unwrap().theme),
            Theme::Rainbow
        );
    }

    #[tokio::test]
    async fn test_create_conversation_upserts_and_navigates() {
        let (client, requests, navigator) = client(|name, _| match name {
            "@createManyToManyConversation" => Ok(json!({
                "conversation": {
                    "id": 7,
                    "type": "many_to_many",
                    "participants": ["alice", "bob", "carol"],
                }
            })),
            other => panic!("unexpected request {other}"),
        });

        let id = client
            .create_many_to_many_conversation(vec!["bob".into(), "carol".into()])
            .await
            .unwrap();

        assert_eq!(id, ConversationId::from("7"));
        assert!(client.store().read(|s| s.conversation(&id).is_some()));
        assert_eq!(*navigator.opened.lock().unwrap(), vec![id]);
        assert_eq!(
            requests.lock().unwrap()[0].1,
            json!({ "usernames": ["bob", "carol"] })
        );
    }

    #[tokio::test]
    async fn test_create_one_to_one_upserts_and_navigates() {
        let (client, requests, navigator) = client(|name, _| match name {
            "@getOrCreateOneToOneConversation" => Ok(json!({
                "conversation": {
                    "id": "c2",
                    "type": "one_to_one",
                    "participants": ["alice", "carol"],
                }
            })),
            other => panic!("unexpected request {other}"),
        });

        let id = client.create_one_to_one_conversation("carol").await.unwrap();

        assert_eq!(id, ConversationId::from("c2"));
        assert_eq!(client.store().read(|s| s.conversations().len()), 2);
        assert_eq!(*navigator.opened.lock().unwrap(), vec![id]);
        assert_eq!(
            requests.lock().unwrap().clone(),
            vec![(
                "@getOrCreateOneToOneConversation".to_string(),
                json!({ "username": "carol" })
            )]
        );
    }

    #[tokio::test]
    async fn test_get_conversations_replaces_set() {
        let (client, _, _) = client(|name, _| match name {
            "@getConversations" => Ok(json!({
                "conversations": [
                    { "id": "g1", "type": "many_to_many", "participants": ["alice", "bob", "carol"] },
                    { "id": "c3", "type": "one_to_one", "participants": ["alice", "dave"] },
                ]
            })),
            other => panic!("unexpected request {other}"),
        });

        client.get_conversations().await.unwrap();

        let ids: Vec<String> = client
            .store()
            .read(|s| s.conversations().iter().map(|c| c.id.to_string()).collect());
        assert_eq!(ids, vec!["g1", "c3"]);
        assert_eq!(client.store().read(|s| s.users().len()), 2);
    }

    #[tokio::test]
    async fn test_removing_self_drops_conversation() {
        let (client, requests, _) = client(|_, _| {
            Ok(json!({
                "conversation": { "id": "c1", "type": "one_to_one", "participants": ["bob"] }
            }))
        });

        let outcome = client.remove_participant(&"c1".into(), "alice").await.unwrap();

        assert_eq!(outcome, Outcome::Removed);
        assert!(client.store().read(|s| s.conversation(&"c1".into()).is_none()));
        assert_eq!(
            requests.lock().unwrap()[0],
            (
                "@removeParticipant".to_string(),
                json!({ "conversation_id": "c1", "username": "alice" })
            )
        );
    }

    #[tokio::test]
    async fn test_add_participant_applies_acked_conversation() {
        let (client, requests, _) = client(|_, _| {
            Ok(json!({
                "conversation": {
                    "id": "c1",
                    "type": "one_to_one",
                    "participants": ["alice", "bob", "carol"],
                }
            }))
        });

        let outcome = client.add_participant(&"c1".into(), "carol").await.unwrap();

        assert_eq!(outcome, Outcome::Replaced);
        assert!(client
            .store()
            .read(|s| s.conversation(&"c1".into()).unwrap().has_participant("carol")));
        assert_eq!(
            requests.lock().unwrap()[0],
            (
                "@addParticipant".to_string(),
                json!({ "conversation_id": "c1", "username": "carol" })
            )
        );
    }

    #[tokio::test]
    async fn test_conversation_acks_without_conversation_are_ignored() {
        let (client, requests, _) = client(|_, _| Ok(json!({})));
        let before = client.store().snapshot();

        let added = client.add_participant(&"c1".into(), "carol").await.unwrap();
        let seen = client
            .see_conversation(&"c1".into(), &"m1".into())
            .await
            .unwrap();

        assert_eq!(added, Outcome::Ignored);
        assert_eq!(seen, Outcome::Ignored);
        assert_eq!(client.store().snapshot(), before);
        assert_eq!(
            requests.lock().unwrap()[1],
            (
                "@seeConversation".to_string(),
                json!({ "conversation_id": "c1", "message_id": "m1" })
            )
        );
    }

    #[tokio::test]
    async fn test_see_conversation_applies_acked_conversation() {
        let (client, _, _) = client(|_, _| {
            Ok(json!({
                "conversation": {
                    "id": "c1",
                    "type": "one_to_one",
                    "participants": ["alice", "bob"],
                    "seen": { "alice": { "message_id": "m1", "time": "2024-03-01T10:05:00Z" } },
                }
            }))
        });

        let outcome = client
            .see_conversation(&"c1".into(), &"m1".into())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Replaced);
        assert!(client
            .store()
            .read(|s| s.conversation(&"c1".into()).unwrap().seen.contains_key("alice")));
    }

    #[tokio::test]
    async fn test_edit_and_reply_payload_shape() {
        let (client, requests, _) = client(|_, _| Ok(json!({})));

        client
            .edit_message(&"c1".into(), &"m1".into(), "hi there")
            .await
            .unwrap();
        client
            .reply_message(&"c1".into(), &"m1".into(), "hello bob")
            .await
            .unwrap();

        let requests = requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![
                (
                    "@editMessage".to_string(),
                    json!({ "conversation_id": "c1", "message_id": "m1", "content": "hi there" })
                ),
                (
                    "@replyMessage".to_string(),
                    json!({ "conversation_id": "c1", "message_id": "m1", "content": "hello bob" })
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_echoed_edit_replaces_in_place() {
        let (client, _, _) = client(|_, _| {
            Ok(json!({
                "message": {
                    "id": "m1",
                    "from": "bob",
                    "content": "hi there",
                    "posted_at": "2024-03-01T10:00:00Z",
                    "edited": true,
                }
            }))
        });

        let outcome = client
            .edit_message(&"c1".into(), &"m1".into(), "hi there")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Replaced);
        let conversation = client.store().read(|s| s.conversation(&"c1".into()).unwrap().clone());
        assert_eq!(conversation.messages.len(), 1);
        let message = conversation.message(&"m1".into()).unwrap();
        assert!(message.edited);
        assert_eq!(message.content.as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn test_sync_replaces_users_and_conversations() {
        let (client, _, _) = client(|name, _| match name {
            "@getUsers" => Ok(json!({ "users": [{ "username": "carol" }] })),
            "@getConversations" => Ok(json!({ "conversations": [] })),
            other => panic!("unexpected request {other}"),
        });

        client.sync().await.unwrap();

        let snapshot = client.store().snapshot();
        assert_eq!(snapshot.users().len(), 1);
        assert_eq!(snapshot.users()[0].username, "carol");
        assert!(snapshot.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_sync_applies_nothing_on_partial_failure() {
        let (client, _, _) = client(|name, _| match name {
            "@getUsers" => Ok(json!({ "users": [] })),
            _ => Err(TransportError::Closed),
        });
        let before = client.store().snapshot();

        assert!(client.sync().await.is_err());
        assert_eq!(client.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_malformed_response_is_a_decode_error() {
        let (client, _, _) = client(|_, _| Ok(json!({ "users": "nope" })));

        let err = client.get_users().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { name: "@getUsers", .. }));
    }
}
