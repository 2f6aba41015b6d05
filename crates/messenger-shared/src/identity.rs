use serde::{Deserialize, Serialize};

/// The authenticated session identity handed over by the login flow.
/// The username is what the store compares participants against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auth {
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub picture_url: String,
}

impl Auth {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            picture_url: String::new(),
        }
    }

    /// Token is optional on local servers; an empty one is not sent.
    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }
}
