//! Logging utilities with colored output and level filtering.
//!
//! This module provides:
//! - `log!` macro for info lines with a colored module prefix
//! - `debug!`, `warn!`, `error!` macros gated by the global [`LogLevel`]
//!
//! # Example
//!
//! ```ignore
//! log!("watch"; "changed: {}", path);
//! debug!("ws"; "broadcast to {} clients", count);
//! error!("config"; "reload failed: {}", e);
//! ```

use owo_colors::OwoColorize;
use std::{
    fmt,
    io::{Write, stdout},
    sync::atomic::{AtomicU8, Ordering},
};

/// Verbosity threshold. Lines below the active level are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Parse a level name, case-insensitively. Unknown names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        Self::from_name(name).unwrap_or_default()
    }

    /// Strict variant of [`LogLevel::parse`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Debug,
            2 => Self::Warn,
            3 => Self::Error,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global log level (set from config, re-set on config reload)
static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Set the global log level
pub fn set_log_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Current global log level
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(LEVEL.load(Ordering::SeqCst))
}

/// Check whether lines at `level` are currently printed
#[inline]
pub fn enabled(level: LogLevel) -> bool {
    level >= log_level()
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log an info message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::emit($crate::logger::LogLevel::Info, $module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when the level is `debug`)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::enabled($crate::logger::LogLevel::Debug) {
            $crate::logger::emit($crate::logger::LogLevel::Debug, $module, &format!($($arg)*))
        }
    }};
}

/// Log a warning
#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::emit($crate::logger::LogLevel::Warn, $module, &format!($($arg)*))
    }};
}

/// Log an error
#[macro_export]
macro_rules! error {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::emit($crate::logger::LogLevel::Error, $module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write one log line if `level` passes the global threshold
#[inline]
pub fn emit(level: LogLevel, module: &str, message: &str) {
    if !enabled(level) {
        return;
    }

    let line = format_line(level, module, message);
    let mut stdout = stdout().lock();
    writeln!(stdout, "{line}").ok();
    stdout.flush().ok();
}

fn format_line(level: LogLevel, module: &str, message: &str) -> String {
    let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
    let prefix = colorize_prefix(level, module, &module.to_ascii_lowercase());
    format!("{} {prefix} {message}", timestamp.dimmed())
}

/// Apply color to a module prefix based on module type and level
#[inline]
fn colorize_prefix(level: LogLevel, module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match (level, module_lower) {
        (LogLevel::Error, _) | (_, "error") => prefix.bright_red().bold().to_string(),
        (LogLevel::Warn, _) => prefix.yellow().bold().to_string(),
        (LogLevel::Debug, _) => prefix.dimmed().to_string(),
        (_, "serve") => prefix.bright_blue().bold().to_string(),
        (_, "watch") => prefix.bright_green().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
