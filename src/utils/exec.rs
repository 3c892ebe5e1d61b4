//! Prestart shell execution.
//!
//! The configured `prestart` command (typically a dev web server) runs once
//! in the base path alongside the watcher. A non-zero exit is logged, never
//! fatal.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

/// Build a platform shell invocation for `script`.
fn shell_command(script: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", script]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }
}

/// Spawn `script` in `cwd` and watch it from a background thread.
///
/// stderr is always inherited; stdout only when `show_output` is set.
/// The returned handle yields the exit status once the command ends.
pub fn spawn_prestart(
    script: &str,
    cwd: &Path,
    show_output: bool,
) -> Result<JoinHandle<Option<ExitStatus>>> {
    let mut cmd = shell_command(script);
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .stdout(if show_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        });

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to run prestart `{}`", script))?;
    crate::log!("prestart"; "{}", script);

    let script = script.to_string();
    let handle = std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            if status.success() {
                crate::debug!("prestart"; "`{}` finished", script);
            } else {
                crate::error!("prestart"; "`{}` failed, {}", script, status);
            }
            Some(status)
        }
        Err(e) => {
            crate::error!("prestart"; "`{}`: {}", script, e);
            None
        }
    });

    Ok(handle)
}
