//! `[[livereload]]` section configuration.
//!
//! Ordered regex → path redirects. When a changed path matches `pattern`,
//! clients are told that `path` changed instead. The first matching entry
//! wins.
//!
//! # Example
//!
//! ```toml
//! [[livereload]]
//! pattern = "_partial\\.less$"
//! path = "src/css/main.css"
//! ```

use serde::{Deserialize, Serialize};

/// One redirect entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivereloadRule {
    /// Regular expression tested against the changed path.
    pub pattern: String,
    /// Path reported to clients on a match.
    pub path: String,
}

impl LivereloadRule {
    pub fn new(pattern: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            path: path.into(),
        }
    }
}
