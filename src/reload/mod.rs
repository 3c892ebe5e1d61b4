//! Reload Module
//!
//! Server side of the live reload protocol.
//!
//! # Architecture
//!
//! ```text
//! FsActor --[ChangeEvent]--> WsActor --[Command]--> Browser
//!  (watch)                  (route + broadcast)
//! ```
//!
//! # Modules
//!
//! - `classify` - Change events and file categories
//! - `livereload` - Changed-path redirects
//! - `message` - Wire protocol (commands and client messages)
//! - `router` - Change event → command
//! - `server` - WebSocket listener

pub mod classify;
pub mod livereload;
pub mod message;
pub mod router;
pub mod server;
