//! `[client]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [client]
//! message_types = ["action", "scroll"]   # extra client messages to observe
//! ```
//!
//! The default types `disconnect`, `register` and `action` are always
//! present; user entries are appended after them without duplicates.

use serde::{Deserialize, Serialize};

/// Client message types every server listens for.
pub const DEFAULT_MESSAGE_TYPES: [&str; 3] = ["disconnect", "register", "action"];

/// Browser client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Named client-originated messages the server accepts.
    pub message_types: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            message_types: DEFAULT_MESSAGE_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Put the default types first and append user types not already present.
    pub fn merge_defaults(&mut self) {
        let mut merged: Vec<String> = DEFAULT_MESSAGE_TYPES.iter().map(|s| s.to_string()).collect();
        for name in self.message_types.drain(..) {
            let name = name.trim().to_string();
            if !name.is_empty() && !merged.contains(&name) {
                merged.push(name);
            }
        }
        self.message_types = merged;
    }

    /// Whether clients may send a message of this type.
    pub fn accepts(&self, message_type: &str) -> bool {
        self.message_types.iter().any(|t| t == message_type)
    }
}
