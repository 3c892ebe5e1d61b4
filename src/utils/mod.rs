//! Utility modules shared by the server.

pub mod exec;
pub mod path;
