//! Command-line interface module.

mod args;
pub mod init;
pub mod start;

pub use args::{Cli, Commands};
