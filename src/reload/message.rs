//! Reload Message Protocol
//!
//! JSON messages exchanged between the watch server and browser clients.
//!
//! # Server → client
//!
//! - `init`: log level and livereload map snapshot (sent on connect and after
//!   a config reload)
//! - `reloadPage`: full page reload
//! - `reloadCSS`: swap the matching stylesheet in place
//! - `reloadImage`: re-fetch the matching images
//!
//! # Client → server
//!
//! `{ "type": <name>, ...payload }`, e.g. `{"type":"register","name":"<ua>"}`.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::classify::FileInfo;

/// Command sent from the server to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Command {
    /// Replace the client's options snapshot
    #[serde(rename = "init")]
    Init {
        log_level: String,
        #[serde(default)]
        livereload: LivereloadTable,
    },

    /// Full page reload
    #[serde(rename = "reloadPage")]
    ReloadPage {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_info: Option<FileInfo>,
    },

    /// Reload the stylesheet(s) matching `path`
    #[serde(rename = "reloadCSS")]
    ReloadCss {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_info: Option<FileInfo>,
    },

    /// Reload the image(s) matching `path`
    #[serde(rename = "reloadImage")]
    ReloadImage {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_info: Option<FileInfo>,
    },
}

impl Command {
    /// Create an init command
    pub fn init(log_level: impl Into<String>, livereload: LivereloadTable) -> Self {
        Self::Init {
            log_level: log_level.into(),
            livereload,
        }
    }

    /// Create a page reload command
    pub fn reload_page(path: impl Into<String>) -> Self {
        Self::ReloadPage {
            path: path.into(),
            file_info: None,
        }
    }

    /// Wire name of this command
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::ReloadPage { .. } => "reloadPage",
            Self::ReloadCss { .. } => "reloadCSS",
            Self::ReloadImage { .. } => "reloadImage",
        }
    }

    /// Changed path carried by reload commands
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Init { .. } => None,
            Self::ReloadPage { path, .. }
            | Self::ReloadCss { path, .. }
            | Self::ReloadImage { path, .. } => Some(path),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reloadPage","path":""}"#.into())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

// =============================================================================
// Livereload table
// =============================================================================

/// Ordered `pattern → path` pairs, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivereloadTable(pub Vec<(String, String)>);

impl LivereloadTable {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for LivereloadTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (pattern, path) in &self.0 {
            map.serialize_entry(pattern, path)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LivereloadTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = LivereloadTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of pattern → path strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((pattern, path)) = access.next_entry::<String, String>()? {
                    pairs.push((pattern, path));
                }
                Ok(LivereloadTable(pairs))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

// =============================================================================
// Client messages
// =============================================================================

/// Message sent by a client: a type name plus free-form payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl ClientMessage {
    /// Build the `register` message a client sends after connecting
    pub fn register(user_agent: &str) -> Self {
        let mut payload = serde_json::Map::new();
        payload.insert("name".into(), user_agent.into());
        Self {
            kind: "register".into(),
            payload,
        }
    }

    /// User agent reported by a `register` message
    pub fn register_name(&self) -> Option<&str> {
        if self.kind != "register" {
            return None;
        }
        self.payload.get("name").and_then(|v| v.as_str())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!(r#"{{"type":"{}"}}"#, self.kind))
    }

    /// Parse from JSON string (objects with a string `type` only)
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
