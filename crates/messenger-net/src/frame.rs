//! Newline-delimited JSON framing.
//!
//! Each line on the socket is one [`Frame`]. Requests and responses are
//! correlated by `id`; events carry no id and are never answered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// First frame sent by the client on every (re)connect.
    Hello {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Request {
        id: Uuid,
        name: String,
        #[serde(default)]
        payload: Value,
    },
    Response {
        id: Uuid,
        #[serde(default)]
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event {
        name: String,
        #[serde(default)]
        payload: Value,
    },
}

impl Frame {
    /// Serialize to a single line, newline included.
    pub fn encode(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn decode(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim_end())?)
    }
}
