//! Actor Coordinator - Wires up the Watch/Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the WebSocket listener
//! - Wires up actors and runs them concurrently

mod runtime;
pub(crate) mod watch_paths;

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::{broadcast, mpsc};

use super::fs::FsActor;
use super::messages::{ClientEvent, FsMsg, WsMsg};
use super::ws::WsActor;
use crate::config::WatchConfig;

const CHANNEL_BUFFER: usize = 32;
/// Client events kept for a slow subscriber before it lags
const EVENT_BUFFER: usize = 64;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<WatchConfig>,
    shutdown_rx: Option<Receiver<()>>,
    events: broadcast::Sender<ClientEvent>,
}

impl Coordinator {
    /// Create from Arc<WatchConfig>.
    pub fn with_config(config: Arc<WatchConfig>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            config,
            shutdown_rx: None,
            events,
        }
    }

    /// Receive the client messages accepted by `[client] message_types`.
    ///
    /// Only events sent after subscribing are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (fs_tx, fs_rx) = mpsc::channel::<FsMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let config = &self.config;
        let port = crate::reload::server::start_ws_server(config.interface, config.port, ws_tx.clone())
            .context("websocket listener failed")?;
        crate::log!("serve"; "{} listening on ws://{}:{}", config.name, config.interface, port);

        let fs_actor = FsActor::new(
            watch_paths::collect_watch_roots(config),
            config.file_filter.clone(),
            config.config_path.clone(),
            fs_rx,
            ws_tx.clone(),
        )
        .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        crate::log!("watch"; "watching {}", config.get_root().display());

        let ws_actor = WsActor::new(ws_rx, ws_tx.clone(), fs_tx.clone(), self.events.clone());

        crate::debug!("actor"; "start");
        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(fs_actor, ws_actor, fs_tx, ws_tx, shutdown_rx).await?;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
