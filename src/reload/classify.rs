//! Change Classification
//!
//! Pure functions mapping a changed path to its file category through the
//! `[file_types]` extension table. No watcher machinery, no side effects.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{FileTypesConfig, list_contains};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Changed,
    Deleted,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A debounced filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: std::path::PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

// =============================================================================
// File categories
// =============================================================================

/// Category of a changed file, resolved from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCategory {
    Style,
    Script,
    Image,
    /// User-defined `[file_types]` entry
    Other(String),
    /// No entry lists the extension
    None,
}

impl FileCategory {
    pub fn from_name(name: &str) -> Self {
        match name {
            "style" => Self::Style,
            "script" => Self::Script,
            "image" => Self::Image,
            "none" | "" => Self::None,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Style => "style",
            Self::Script => "script",
            Self::Image => "image",
            Self::Other(name) => name,
            Self::None => "none",
        }
    }
}

impl Serialize for FileCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// `fileInfo` payload attached to `changed` commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(rename = "type")]
    pub category: FileCategory,
    pub ext_name: String,
}

impl FileInfo {
    pub fn new(category: FileCategory, ext_name: impl Into<String>) -> Self {
        Self {
            category,
            ext_name: ext_name.into(),
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Extension of the last path segment, without the dot.
///
/// `.hidden` yields `hidden`; a trailing dot or no dot yields `""`.
pub fn ext_name(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}

/// Resolve the category of `path` from the extension table.
///
/// Built-in categories are checked first, then user-defined ones in name order.
pub fn categorize(path: &str, types: &FileTypesConfig) -> FileCategory {
    let ext = ext_name(path);
    types
        .entries()
        .find(|(_, list)| list_contains(list, ext))
        .map(|(name, _)| FileCategory::from_name(name))
        .unwrap_or(FileCategory::None)
}

/// Classify `path` into its `fileInfo` payload.
pub fn file_info(path: &str, types: &FileTypesConfig) -> FileInfo {
    FileInfo::new(categorize(path, types), ext_name(path))
}

/// Path of `path` relative to `base`, with `/` separators.
///
/// Paths outside `base` are returned whole.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
