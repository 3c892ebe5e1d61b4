//! FileSystem Actor
//!
//! Watches the base path and the config file, and sends debounced change
//! events to the WsActor. Every batch is tagged with the watcher generation
//! so events from a torn-down watch set can be told apart.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → Classifier (scope + existence) → WsMsg::Changes
//! ```

use std::path::PathBuf;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{FsMsg, WsMsg};
use crate::config::FileFilter;

// Existence correction and scope filtering.
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Watch scope shared by the pipeline.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


use classifier::EventClassifier;
use debouncer::Debouncer;
use types::WatchScope;
use watch_roots::WatchRoots;
pub use watch_roots::WatchRoot;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-root consistency layer (attach/re-attach root directories)
    watch_roots: WatchRoots,
    /// Control channel (restart, shutdown)
    rx: mpsc::Receiver<FsMsg>,
    /// Channel to send changes to the WsActor
    ws_tx: mpsc::Sender<WsMsg>,
    /// Which paths produce events
    scope: WatchScope,
    /// Tag of the current watch set
    generation: u64,
}

impl FsActor {
    /// Create the watcher and attach every existing root immediately.
    pub fn new(
        roots: Vec<WatchRoot>,
        filter: FileFilter,
        config_path: PathBuf,
        rx: mpsc::Receiver<FsMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
    ) -> notify::Result<Self> {
        // notify doesn't support async
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots: WatchRoots::new(roots),
            rx,
            ws_tx,
            scope: WatchScope::new(filter, config_path),
            generation: 0,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        // Extract fields before consuming self
        let notify_rx = self.notify_rx;
        let ws_tx = self.ws_tx;
        let mut rx = self.rx;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;
        let mut scope = self.scope;
        let mut generation = self.generation;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Forward notify events to the async side; errors go straight to the WsActor
        let error_tx = ws_tx.clone();
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                let sent = match result {
                    Ok(event) => async_tx.blocking_send(event).is_ok(),
                    Err(e) => error_tx.blocking_send(WsMsg::WatchError(e.to_string())).is_ok(),
                };
                if !sent {
                    break; // Receiver dropped
                }
            }
        });

        if !attach(&mut watch_roots, &mut watcher, &ws_tx, None).await {
            return;
        }

        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(FsMsg::Restart { generation: next, roots, filter, config_path }) => {
                        crate::debug!("watch"; "restart (generation {})", next);
                        debouncer.clear();
                        generation = next;
                        scope = WatchScope::new(filter, config_path);
                        if !attach(&mut watch_roots, &mut watcher, &ws_tx, Some(roots)).await {
                            break;
                        }
                    }
                    Some(FsMsg::Shutdown) | None => break,
                },
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    // Ensure watcher roots remain attached.
                    watch_roots.maintain(&mut watcher);
                    if flush_changes(&mut debouncer, &scope, generation, &ws_tx).await.is_err() {
                        break;
                    }
                }
            }
        }

        crate::debug!("watch"; "stopped");
    }
}

/// Attach (or re-attach) the watch set and report readiness.
///
/// Returns `false` if the WsActor is gone.
async fn attach(
    watch_roots: &mut WatchRoots,
    watcher: &mut RecommendedWatcher,
    ws_tx: &mpsc::Sender<WsMsg>,
    replacement: Option<Vec<WatchRoot>>,
) -> bool {
    let result = match replacement {
        Some(roots) => watch_roots.replace(roots, watcher),
        None => watch_roots.attach_existing(watcher),
    };

    let msg = match result {
        Ok(roots) => WsMsg::WatchReady { roots },
        Err(e) => WsMsg::WatchError(e.to_string()),
    };
    ws_tx.send(msg).await.is_ok()
}

/// Send debounced file changes.
///
/// Returns `Err(())` if the WsActor shut down
async fn flush_changes(
    debouncer: &mut Debouncer,
    scope: &WatchScope,
    generation: u64,
    ws_tx: &mpsc::Sender<WsMsg>,
) -> Result<(), ()> {
    let Some(raw_events) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let Some(events) = EventClassifier::classify(raw_events, scope) else {
        return Ok(());
    };

    for event in &events {
        crate::debug!("watch"; "{}: {}", event.kind, event.path.display());
    }

    ws_tx
        .send(WsMsg::Changes { generation, events })
        .await
        .map_err(|_| ())
}
