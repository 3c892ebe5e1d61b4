//! Config file generation.
//!
//! Writes a commented `watchreload.toml` holding every default.

use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::CONFIG_FILE;

/// Generate watchreload.toml content with comments
pub fn generate_config_template() -> String {
    format!(
        r#"# watchreload configuration file (v{version})

# Server name shown in logs
name = "watchreload-server"

# Interface and port of the WebSocket listener.
# When the port is busy the next free one is used.
interface = "127.0.0.1"
port = 12345

# Base directory for watched files, relative to this file (default: here)
# base_path = "."

# debug, info, warn or error (also sent to browsers in `init`)
log_level = "info"

# Shell command run once in the base path before watching, e.g. a web server
# prestart = "python3 -m http.server 8000"

# Show the prestart command's stdout (stderr is always shown)
capture_prestart_output = true

[client]
# Client messages the server listens for, besides disconnect/register/action
message_types = []

# Reload another file when a matching file changes.
# Patterns are regular expressions over the path relative to base_path;
# the first matching entry wins.
#
# [[livereload]]
# pattern = 'src/.+\.less$'
# path = "src/css/main.css"

[file_types]
style = "css,less,styl"
script = "js"
image = "jpg,jpeg,png,gif"

[files]
include = ["**/*"]
exclude = []
"#,
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Write the default config into `dir`, refusing to overwrite one.
pub fn write_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    fs::write(&path, generate_config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    Ok(path)
}

/// `watchreload init`
pub fn init(dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let path = write_config(&cwd)?;
    crate::log!("init"; "wrote {}", path.display());
    Ok(())
}
