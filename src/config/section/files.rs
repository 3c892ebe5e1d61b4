//! `[files]` section configuration.
//!
//! Glob patterns are relative to `base_path`.
//!
//! # Example
//!
//! ```toml
//! [files]
//! include = ["src/**/*", "index.html"]
//! exclude = ["src/vendor/**"]
//! ```

use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Watched file set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*".to_string()],
            exclude: Vec::new(),
        }
    }
}

impl FilesConfig {
    /// Compile the globs against `root`.
    pub fn compile(&self, root: &Path) -> Result<FileFilter, ConfigError> {
        Ok(FileFilter {
            include: compile_all(&self.include, root)?,
            exclude: compile_all(&self.exclude, root)?,
        })
    }
}

fn compile_all(globs: &[String], root: &Path) -> Result<Vec<Pattern>, ConfigError> {
    let root = Pattern::escape(&root.to_string_lossy());
    globs
        .iter()
        .map(|glob| {
            let rel = glob.trim_start_matches("./");
            let full = if Path::new(rel).is_absolute() {
                rel.to_string()
            } else {
                format!("{}/{}", root.trim_end_matches('/'), rel)
            };
            Pattern::new(&full).map_err(|source| ConfigError::Glob {
                glob: glob.clone(),
                source,
            })
        })
        .collect()
}

/// Compiled include/exclude globs.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl FileFilter {
    /// A path is watched when some include glob matches and no exclude glob does.
    pub fn matches(&self, path: &Path) -> bool {
        let matches_any = |patterns: &[Pattern]| {
            patterns
                .iter()
                .any(|p| p.matches_path_with(path, MATCH_OPTIONS))
        };
        matches_any(&self.include) && !matches_any(&self.exclude)
    }
}
