//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of the watch config while the server runs.

use crate::config::{ConfigError, WatchConfig};
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<WatchConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(WatchConfig::default()));

#[inline]
pub fn cfg() -> Arc<WatchConfig> {
    CONFIG.load_full()
}

/// Re-read the config file the current config was loaded from.
///
/// On success the new config replaces the global one. On failure the
/// previous config stays active and the error is returned to the caller.
pub fn reload_config() -> Result<Arc<WatchConfig>, ConfigError> {
    let current = cfg();
    let next = WatchConfig::load(&current.config_path, current.overrides.clone())?;
    crate::logger::set_log_level(next.log_level());

    let arc = Arc::new(next);
    CONFIG.store(Arc::clone(&arc));
    Ok(arc)
}

#[inline]
pub fn init_config(config: WatchConfig) -> Arc<WatchConfig> {
    crate::logger::set_log_level(config.log_level());
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
