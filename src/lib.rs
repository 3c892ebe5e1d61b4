//! watchreload - live reload that patches stylesheets and images in place.
//!
//! The server side watches a project, turns file changes into reload
//! commands and fans them out over WebSocket. The client side
//! ([`client`]) correlates a changed path with the resources a page has
//! loaded and reloads only those, falling back to a full page reload.

pub mod actor;
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod logger;
pub mod reload;
pub mod utils;
