//! WebSocket Actor - Routing and Fan-out
//!
//! The single event timeline of the server. This actor is responsible for:
//! - Routing debounced change events into reload commands
//! - Running the config reload sequence
//! - Managing client sessions (connect, register, disconnect)
//! - Broadcasting commands to every connected client
//! - Re-emitting accepted client messages to [`ClientEvent`] subscribers
//!
//! The logic lives in [`Timeline`], which needs no sockets.
//!
//! # Architecture
//!
//! ```text
//! FsActor --[Changes]--> WsActor --[broadcast]--> Clients
//!    ^                      |  ^                     |
//!    +------[Restart]-------+  +----[register/..]----+
//! ```

mod client_io;
#[cfg(test)]
mod memory;
mod registry;
mod timeline;

use std::net::TcpStream;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tungstenite::WebSocket;

use super::messages::{ClientEvent, FsMsg, WsMsg};
use crate::config::cfg;

use client_io::WsClient;
pub use registry::{ClientId, ClientSession, ClientTransport, Inbound, Registry, TransportError};
pub use timeline::{Batch, Timeline};

/// WebSocket Actor - moves messages between the channels and the timeline
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Own sender, handed to the client reader thread
    tx: mpsc::Sender<WsMsg>,
    /// Control channel of the FsActor
    fs_tx: mpsc::Sender<FsMsg>,
    timeline: Timeline<WsClient>,
}

impl WsActor {
    pub fn new(
        rx: mpsc::Receiver<WsMsg>,
        tx: mpsc::Sender<WsMsg>,
        fs_tx: mpsc::Sender<FsMsg>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            rx,
            tx,
            fs_tx,
            timeline: Timeline::new(events),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let registry = Arc::clone(self.timeline.registry());
        let reader_tx = self.tx.clone();
        std::thread::spawn(move || client_io::client_reader_loop(registry, reader_tx));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Changes { generation, events } => {
                    let batch = self.timeline.handle_changes(generation, &events, &cfg());
                    if let Batch::Restart(restart) = batch
                        && self.fs_tx.send(restart).await.is_err()
                    {
                        break;
                    }
                }

                WsMsg::WatchReady { roots } => {
                    crate::log!("watch"; "ready, watching {} roots", roots);
                }

                WsMsg::WatchError(e) => {
                    crate::warn!("watch"; "{}", e);
                }

                WsMsg::AddClient(ws) => self.add_client(ws),

                WsMsg::ClientText { id, text } => self.timeline.client_text(id, &text, &cfg().client),

                WsMsg::ClientClosed(id) => self.timeline.disconnect(id),

                WsMsg::Shutdown => break,
            }
        }

        crate::debug!("ws"; "shutting down");
        self.timeline.close_all();
    }

    fn add_client(&self, ws: WebSocket<TcpStream>) {
        let peer = ws
            .get_ref()
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".into());

        match self.timeline.connect(WsClient::new(ws), &cfg()) {
            Some(id) => {
                let total = self.timeline.registry().lock().len();
                crate::log!("ws"; "client {} connected from {} (total: {})", id, peer, total);
            }
            None => crate::debug!("ws"; "client from {} left before init", peer),
        }
    }
}
