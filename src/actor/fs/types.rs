use std::path::{Path, PathBuf};

use crate::config::FileFilter;

/// What the watcher reports: the config file plus files passing the globs.
#[derive(Debug, Clone, Default)]
pub(super) struct WatchScope {
    pub(super) filter: FileFilter,
    pub(super) config_path: PathBuf,
}

impl WatchScope {
    pub(super) fn new(filter: FileFilter, config_path: PathBuf) -> Self {
        Self {
            filter,
            config_path,
        }
    }

    pub(super) fn contains(&self, path: &Path) -> bool {
        path == self.config_path || self.filter.matches(path)
    }
}
