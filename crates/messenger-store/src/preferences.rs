//! Locally persisted preferences.
//!
//! The engine only reads them (the muted-conversation list decides whether a
//! new message rings); the settings screen owns writing. Values are opaque
//! strings, usually JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing::warn;

use messenger_shared::constants::MUTED_CONVERSATIONS_KEY;
use messenger_shared::ConversationId;

use crate::error::{Result, StoreError};

/// String key/value preference storage.
pub trait Preferences: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<()>;
}

/// Conversation ids the user muted. Missing or unreadable values yield an
/// empty list.
pub fn muted_conversations(prefs: &dyn Preferences) -> Vec<ConversationId> {
    let Some(raw) = prefs.get(MUTED_CONVERSATIONS_KEY) else {
        return Vec::new();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable muted conversation list, treating as empty");
        Vec::new()
    })
}

/// Whether notifications are muted for `conversation_id`.
pub fn is_muted(prefs: &dyn Preferences, conversation_id: &ConversationId) -> bool {
    muted_conversations(prefs).contains(conversation_id)
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Process-local preferences, for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Preferences kept in a single JSON object file.
///
/// The file is re-read on every `get` so changes made by another part of the
/// application are picked up without a reload.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    /// Use the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/messenger/preferences.json`
    /// - macOS:   `~/Library/Application Support/com.messenger.messenger/preferences.json`
    /// - Windows: `{FOLDERID_RoamingAppData}\messenger\messenger\data\preferences.json`
    pub fn default_location() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "messenger", "messenger").ok_or(StoreError::NoDataDir)?;
        Ok(Self::open_at(project_dirs.data_dir().join("preferences.json")))
    }

    /// Use an explicit file path. The file need not exist yet.
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read preferences");
                None
            }
        }
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut values = self.load().unwrap_or_default();
        values.insert(key.to_string(), value);

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}
