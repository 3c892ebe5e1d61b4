//! Client-side logger.
//!
//! Lines go to the surface console prefixed `[watchreload-<level>]` and are
//! filtered by the level carried in the last `init` command.

use super::surface::RenderSurface;
use crate::logger::LogLevel;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClientLog {
    level: LogLevel,
}

impl ClientLog {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    pub fn write<S: RenderSurface + ?Sized>(&self, surface: &mut S, level: LogLevel, message: &str) {
        if self.enabled(level) {
            surface.console(level, &format!("[watchreload-{}] {}", level.as_str(), message));
        }
    }

    pub fn debug<S: RenderSurface + ?Sized>(&self, surface: &mut S, message: &str) {
        self.write(surface, LogLevel::Debug, message);
    }

    pub fn info<S: RenderSurface + ?Sized>(&self, surface: &mut S, message: &str) {
        self.write(surface, LogLevel::Info, message);
    }

    pub fn warn<S: RenderSurface + ?Sized>(&self, surface: &mut S, message: &str) {
        self.write(surface, LogLevel::Warn, message);
    }

    pub fn error<S: RenderSurface + ?Sized>(&self, surface: &mut S, message: &str) {
        self.write(surface, LogLevel::Error, message);
    }
}
