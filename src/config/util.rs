//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/site/src/css/         ← start
/// /home/user/site/watchreload.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Resolve the configured base path.
///
/// Expands `~`, then resolves relative paths against `config_dir`.
pub fn resolve_base_path(base: Option<&Path>, config_dir: &Path) -> PathBuf {
    let Some(base) = base else {
        return config_dir.to_path_buf();
    };

    let expanded = shellexpand::tilde(&base.to_string_lossy()).into_owned();
    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

// ============================================================================
// tests
// ============================================================================
