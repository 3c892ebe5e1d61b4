use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// A directory (or file) handed to the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchRoot {
    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
        }
    }

    pub fn flat(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
        }
    }

    fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }
}

/// Watch-root consistency manager.
///
/// Responsibility:
/// - Attach existing roots at startup
/// - Re-attach roots that were removed and recreated
/// - Swap the whole set on config reload
pub(super) struct WatchRoots {
    desired: Vec<WatchRoot>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(roots: Vec<WatchRoot>) -> Self {
        Self {
            desired: roots,
            attached: FxHashSet::default(),
        }
    }

    /// Attach every existing root. Returns the number attached.
    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<usize> {
        for root in &self.desired {
            if !root.path.exists() {
                crate::warn!("watch"; "not found, waiting for it: {}", root.path.display());
                continue;
            }
            watcher.watch(&root.path, root.mode())?;
            self.attached.insert(root.path.clone());
        }

        Ok(self.attached.len())
    }

    /// Detach all current roots and attach `roots` instead.
    pub(super) fn replace(
        &mut self,
        roots: Vec<WatchRoot>,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<usize> {
        for path in self.attached.drain() {
            let _ = watcher.unwatch(&path);
        }
        self.desired = roots;
        self.attach_existing(watcher)
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for root in &self.desired {
            if self.attached.contains(&root.path) || !root.path.exists() {
                continue;
            }

            if watcher.watch(&root.path, root.mode()).is_ok() {
                self.attached.insert(root.path.clone());
                crate::debug!("watch"; "re-attached watch: {}", root.path.display());
            }
        }
    }
}
