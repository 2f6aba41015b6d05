use tracing::debug;

use messenger_shared::User;

use crate::store::{EntityStore, Outcome};

impl EntityStore {
    /// Replace every known user (initial sync).
    pub fn set_users(&mut self, users: Vec<User>) {
        debug!(count = users.len(), "replacing users");
        self.users = users;
    }

    /// Replace the user with the same username, or append it.
    pub fn upsert_user(&mut self, user: User) -> Outcome {
        match self.users.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => {
                *existing = user;
                Outcome::Replaced
            }
            None => {
                self.users.push(user);
                Outcome::Inserted
            }
        }
    }

    /// Replace the set of currently reachable usernames (full snapshot).
    pub fn upsert_users_available(&mut self, usernames: Vec<String>) -> Outcome {
        self.available_usernames = usernames.into_iter().collect();
        Outcome::Replaced
    }
}
