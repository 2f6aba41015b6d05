use tracing::info;

use messenger_shared::protocol::{GetConversations, GetUsers};

use super::Client;
use crate::error::Result;

impl Client {
    /// `@getUsers`: replace the known users.
    pub async fn get_users(&self) -> Result<()> {
        let response = self.call(&GetUsers {}).await?;
        let count = response.users.len();
        self.store.replace(|s| s.set_users(response.users));
        info!(count, "Users loaded");
        Ok(())
    }

    /// Authoritative re-sync of users and conversations.
    ///
    /// Both requests are in flight together; nothing is applied unless both
    /// succeed.
    pub async fn sync(&self) -> Result<()> {
        let (get_users, get_conversations) = (GetUsers {}, GetConversations {});
        let (users, conversations) =
            futures::try_join!(self.call(&get_users), self.call(&get_conversations))?;

        let (user_count, conversation_count) = (users.users.len(), conversations.conversations.len());
        self.store.replace(|s| {
            s.set_users(users.users);
            s.set_conversations(conversations.conversations);
        });

        info!(users = user_count, conversations = conversation_count, "Synchronized");
        Ok(())
    }
}
