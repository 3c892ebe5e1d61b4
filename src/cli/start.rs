//! `watchreload start`: load config, run prestart, run the actor system.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::actor::Coordinator;
use crate::config::{CONFIG_FILE, Overrides, WatchConfig, find_config_file, init_config};
use crate::utils::{exec, path::normalize_path};

/// Resolve the config path: explicit flag, else search upward from `cwd`.
///
/// Returns the path and whether it was given explicitly.
pub fn resolve_config_path(flag: Option<&Path>, cwd: &Path) -> (PathBuf, bool) {
    match flag {
        Some(path) => (cwd.join(path), true),
        None => {
            let found = find_config_file(Path::new(CONFIG_FILE), cwd);
            (found.unwrap_or_else(|| cwd.join(CONFIG_FILE)), false)
        }
    }
}

pub fn start(port: Option<u16>, config: Option<&Path>, base: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let (config_path, explicit) = resolve_config_path(config, &cwd);

    let overrides = Overrides {
        port,
        // CLI paths are relative to the working directory
        base_path: base.map(|b| normalize_path(&cwd.join(b))),
        explicit,
    };
    let config = init_config(WatchConfig::load(&config_path, overrides)?);

    if config.config_path.exists() {
        crate::log!("config"; "using {}", config.config_path.display());
    } else {
        crate::debug!("config"; "no config file, using defaults");
    }

    if let Some(script) = config.prestart.as_deref()
        && let Err(e) = exec::spawn_prestart(script, config.get_root(), config.capture_prestart_output)
    {
        crate::error!("prestart"; "{:#}", e);
    }

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    crate::core::register_shutdown(shutdown_tx);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        Coordinator::with_config(config)
            .with_shutdown_signal(shutdown_rx)
            .run()
            .await
    })
}
