//! Command Router
//!
//! Maps a change event to the command clients receive.
//!
//! | event   | category | command       |
//! |---------|----------|---------------|
//! | deleted | any      | `reloadPage`  |
//! | added   | any      | `reloadPage`  |
//! | changed | style    | `reloadCSS`   |
//! | changed | image    | `reloadImage` |
//! | changed | other    | `reloadPage`  |
//!
//! The category (and `fileInfo`) always describe the file that changed.
//! The livereload map only rewrites the path reported to clients.
//!
//! A change to the watch config file bypasses the table and asks for a
//! config reload instead.

use super::classify::{self, ChangeEvent, ChangeKind, FileCategory, FileInfo};
use super::message::Command;
use crate::config::WatchConfig;

/// Outcome of routing one change event.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// The watch config changed: reload it, restart the watcher, re-send `init`
    ReloadConfig,
    /// Broadcast this command
    Broadcast(Command),
}

/// Route one change event under `config`.
pub fn route(event: &ChangeEvent, config: &WatchConfig) -> Route {
    if config.is_config_file(&event.path) {
        return Route::ReloadConfig;
    }

    let relative = classify::relative_path(config.get_root(), &event.path);
    let info = classify::file_info(&relative, &config.file_types);
    let target = config.livereload_map.apply(&relative);
    Route::Broadcast(command_for(event.kind, target.into_owned(), info))
}

/// The `init` a client receives on connect and after a config reload.
pub fn init_command(config: &WatchConfig) -> Command {
    Command::init(config.log_level().as_str(), config.livereload_map.to_table())
}

/// Build the command reporting `path` for a change classified as `info`.
pub fn command_for(kind: ChangeKind, path: String, info: FileInfo) -> Command {
    match kind {
        ChangeKind::Added | ChangeKind::Deleted => Command::ReloadPage {
            path,
            file_info: None,
        },
        ChangeKind::Changed => match info.category {
            FileCategory::Style => Command::ReloadCss {
                path,
                file_info: Some(info),
            },
            FileCategory::Image => Command::ReloadImage {
                path,
                file_info: Some(info),
            },
            _ => Command::ReloadPage {
                path,
                file_info: Some(info),
            },
        },
    }
}
