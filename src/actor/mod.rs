//! Actor System for Watch Mode
//!
//! Message-passing concurrency between the watcher and the client fan-out:
//!
//! ```text
//! FsActor --Changes--> WsActor --broadcast--> Clients
//! (watch)              (route)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `ws` - Routing, session registry and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
pub use messages::ClientEvent;
