//! Client reload engine.
//!
//! Runs on the page side of the connection: receives [`Command`]s, finds
//! the stylesheets and images a changed file corresponds to, and refreshes
//! them in place, falling back to a full page reload.
//!
//! The page is reached through the [`RenderSurface`] trait;
//! [`MemorySurface`] is the in-memory implementation.
//!
//! [`Command`]: crate::reload::message::Command

pub mod actuator;
pub mod log;
pub mod matcher;
pub mod memory;
pub mod reloader;
pub mod surface;
pub mod url;

pub use actuator::{Actuator, LoadDetection, Outcome};
pub use matcher::{MatchResult, ResourceDescriptor, find_best_matches, match_ratio};
pub use memory::MemorySurface;
pub use reloader::{Reloader, ReloaderOptions};
pub use surface::RenderSurface;
