//! Opening the login URL in a browser.
//!
//! The first entry of `$BROWSER` (a path-list like `$PATH`) wins; otherwise
//! the platform opener is used.

use std::ffi::OsString;
use std::io;
use std::process::{Command, Stdio};

/// Launch a browser on `url` without waiting for it to exit.
pub fn open(url: &str) -> io::Result<()> {
    let mut command = command_for(url, std::env::var_os("BROWSER"));
    tracing::debug!(command = ?command, "launching browser");
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// The command that opens `url`, honouring the `BROWSER` value if set.
fn command_for(url: &str, browser_env: Option<OsString>) -> Command {
    let from_env = browser_env
        .as_deref()
        .and_then(|value| std::env::split_paths(value).next())
        .filter(|path| !path.as_os_str().is_empty());

    if let Some(program) = from_env {
        let mut command = Command::new(program);
        command.arg(url);
        return command;
    }

    platform_command(url)
}

#[cfg(target_os = "macos")]
fn platform_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn platform_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(url);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}
