//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --Changes--> WsActor --Restart--> FsActor
//!                         |
//!                         +--ClientEvent--> subscribers
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use tungstenite::WebSocket;

use crate::config::FileFilter;
use crate::reload::classify::ChangeEvent;
use crate::reload::message::ClientMessage;

use super::fs::WatchRoot;
use super::ws::ClientId;

// =============================================================================
// FsActor Messages
// =============================================================================

/// Messages to FileSystem Actor
#[derive(Debug)]
pub enum FsMsg {
    /// Tear down the current watch set and attach a new one
    Restart {
        generation: u64,
        roots: Vec<WatchRoot>,
        filter: FileFilter,
        config_path: PathBuf,
    },
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Debounced changes from watcher `generation`
    Changes {
        generation: u64,
        events: Vec<ChangeEvent>,
    },
    /// Watcher attached its roots
    WatchReady { roots: usize },
    /// Watcher reported an error (non-fatal)
    WatchError(String),
    /// Client finished the WebSocket handshake
    AddClient(WebSocket<TcpStream>),
    /// Text frame received from a client
    ClientText { id: ClientId, text: String },
    /// Client closed or its socket failed
    ClientClosed(ClientId),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// Client Events
// =============================================================================

/// Accepted client message, re-emitted to every subscriber
#[derive(Debug, Clone)]
pub struct ClientEvent {
    pub client: ClientId,
    pub message: ClientMessage,
}
