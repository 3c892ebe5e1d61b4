//! Configuration section definitions.

mod client;
mod file_types;
mod files;
mod livereload;

pub use client::{ClientConfig, DEFAULT_MESSAGE_TYPES};
pub use file_types::{FileTypesConfig, list_contains};
pub use files::{FileFilter, FilesConfig};
pub use livereload::LivereloadRule;
