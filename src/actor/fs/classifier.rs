use std::path::PathBuf;

use rustc_hash::FxHashMap;

use super::types::WatchScope;
use crate::reload::classify::{ChangeEvent, ChangeKind};

/// Turns raw debounced changes into the events the router sees.
///
/// Pipeline: correct_by_existence → filter_actionable → ordered events
pub(super) struct EventClassifier;

impl EventClassifier {
    pub(super) fn classify(
        raw: FxHashMap<PathBuf, ChangeKind>,
        scope: &WatchScope,
    ) -> Option<Vec<ChangeEvent>> {
        let mut changes = raw;

        Self::correct_by_existence(&mut changes);
        Self::filter_actionable(&mut changes, scope);

        if changes.is_empty() {
            return None;
        }

        let mut events: Vec<_> = changes
            .into_iter()
            .map(|(path, kind)| ChangeEvent::new(kind, path))
            .collect();
        events.sort_by(|a, b| a.path.cmp(&b.path));
        Some(events)
    }

    /// Reconcile event kinds with actual filesystem state.
    ///
    /// The watcher may report stale events (e.g., Added for a file that's already
    /// been deleted, or Deleted for a file that still exists after an atomic save).
    pub(super) fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        let paths: Vec<_> = changes.keys().cloned().collect();
        for path in paths {
            let kind = changes[&path];
            let exists = path.exists();
            match kind {
                ChangeKind::Added if !exists => {
                    crate::debug!("watch"; "discard added (gone): {}", path.display());
                    changes.remove(&path);
                }
                ChangeKind::Changed if !exists => {
                    crate::debug!("watch"; "upgrade changed->deleted: {}", path.display());
                    changes.insert(path, ChangeKind::Deleted);
                }
                ChangeKind::Deleted if exists => {
                    crate::debug!("watch"; "downgrade deleted->changed: {}", path.display());
                    changes.insert(path, ChangeKind::Changed);
                }
                _ => {}
            }
        }
    }

    /// Keep files inside the watch scope; directories never produce commands.
    pub(super) fn filter_actionable(
        changes: &mut FxHashMap<PathBuf, ChangeKind>,
        scope: &WatchScope,
    ) {
        changes.retain(|path, kind| {
            if !scope.contains(path) {
                return false;
            }
            match kind {
                ChangeKind::Added | ChangeKind::Changed => path.is_file(),
                ChangeKind::Deleted => true,
            }
        });
    }
}
