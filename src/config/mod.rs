//! Watch configuration management for `watchreload.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── client     # [client]
//! │   ├── file_types # [file_types]
//! │   ├── files      # [files]
//! │   └── livereload # [[livereload]]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # WatchConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | (root)             | port, interface, base path, log level, prestart |
//! | `[client]`         | Accepted client message types                  |
//! | `[file_types]`     | Extension table for change classification      |
//! | `[files]`          | Include/exclude globs for the watcher          |
//! | `[[livereload]]`   | Changed-path redirects                         |

pub mod section;
pub mod types;
mod util;

pub use section::{
    ClientConfig, FileFilter, FileTypesConfig, FilesConfig, LivereloadRule, list_contains,
};
pub use types::{ConfigError, cfg, init_config, reload_config};
pub use util::find_config_file;

use crate::logger::LogLevel;
use crate::reload::livereload::LivereloadMap;
use crate::{error, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "watchreload.toml";

// ============================================================================
// overrides
// ============================================================================

/// Command-line values that take precedence over the config file.
///
/// Kept on the loaded config so a hot reload applies them again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub port: Option<u16>,
    pub base_path: Option<PathBuf>,
    /// The config path was given explicitly (a missing file is reported).
    pub explicit: bool,
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing watchreload.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Resolved base directory for watched files (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// CLI overrides (internal use only)
    #[serde(skip)]
    pub overrides: Overrides,

    /// Compiled `[[livereload]]` entries (internal use only)
    #[serde(skip)]
    pub livereload_map: LivereloadMap,

    /// Compiled `[files]` globs (internal use only)
    #[serde(skip)]
    pub file_filter: FileFilter,

    /// Server name shown in logs
    pub name: String,

    /// Network interface for the WebSocket listener
    pub interface: IpAddr,

    /// WebSocket port
    pub port: u16,

    /// Base directory for watched files, relative to the config file
    pub base_path: Option<PathBuf>,

    /// `debug`, `info`, `warn` or `error`
    pub log_level: String,

    /// Shell command run once before watching starts
    pub prestart: Option<String>,

    /// Show the prestart command's stdout (stderr is always shown)
    pub capture_prestart_output: bool,

    pub client: ClientConfig,

    pub livereload: Vec<LivereloadRule>,

    pub file_types: FileTypesConfig,

    pub files: FilesConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            overrides: Overrides::default(),
            livereload_map: LivereloadMap::default(),
            file_filter: FileFilter::default(),
            name: "watchreload-server".to_string(),
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 12345,
            base_path: None,
            log_level: LogLevel::Info.as_str().to_string(),
            prestart: None,
            capture_prestart_output: true,
            client: ClientConfig::default(),
            livereload: Vec::new(),
            file_types: FileTypesConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Load configuration from `path`, applying `overrides`.
    ///
    /// A missing file yields the defaults; it is reported only when the
    /// path was given explicitly.
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
        let config_path = crate::utils::path::normalize_path(path);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            if overrides.explicit {
                error!("config"; "config file not found: {}", config_path.display());
            }
            Self::default()
        };

        config.config_path = config_path;
        config.overrides = overrides;
        config.finalize()?;
        Ok(config)
    }

    /// Read and parse a config file.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            warn!(
                "config";
                "unknown fields in {}: {}",
                path.display(),
                ignored.join(", ")
            );
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve paths, apply overrides, merge defaults and compile patterns.
    fn finalize(&mut self) -> Result<(), ConfigError> {
        let config_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if let Some(port) = self.overrides.port {
            self.port = port;
        }
        let base = self
            .overrides
            .base_path
            .as_deref()
            .or(self.base_path.as_deref());
        self.root = crate::utils::path::normalize_path(&util::resolve_base_path(base, &config_dir));

        self.client.merge_defaults();
        self.validate()?;

        self.livereload_map = LivereloadMap::compile(&self.livereload)?;
        self.file_filter = self.files.compile(&self.root)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation("port must not be 0".into()));
        }
        if LogLevel::from_name(&self.log_level).is_none() {
            warn!("config"; "unknown log_level `{}`, using info", self.log_level);
        }
        Ok(())
    }

    /// Parsed log level (unknown names fall back to `info`).
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level)
    }

    /// Project root for watched files.
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is the config file being served from.
    pub fn is_config_file(&self, path: &Path) -> bool {
        path == self.config_path
    }
}

/// Parse a config snippet rooted at `/project` (test helper).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> WatchConfig {
    let (mut parsed, ignored) = WatchConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed.config_path = PathBuf::from("/project").join(CONFIG_FILE);
    parsed.finalize().unwrap();
    parsed
}

// ============================================================================
// tests
// ============================================================================
