// Sitedeck platform integration
// Per-OS config/data paths, and handing URLs to the default browser.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};

use crate::types::errors::OpenError;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory (settings, site catalog).
///
/// - **Linux**: `~/.config/sitedeck` (or `$XDG_CONFIG_HOME/sitedeck`)
/// - **macOS**: `~/Library/Application Support/Sitedeck`
/// - **Windows**: `%APPDATA%/Sitedeck`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory (state database, web data).
///
/// - **Linux**: `~/.local/share/sitedeck` (or `$XDG_DATA_HOME/sitedeck`)
/// - **macOS**: `~/Library/Application Support/Sitedeck`
/// - **Windows**: `%LOCALAPPDATA%/Sitedeck`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Opens `url` with the system's default handler (normally the default browser).
pub fn open_url(url: &str) -> Result<(), OpenError> {
    #[cfg(target_os = "linux")]
    let command = linux::open_command(url);
    #[cfg(target_os = "macos")]
    let command = macos::open_command(url);
    #[cfg(target_os = "windows")]
    let command = windows::open_command(url);

    spawn_reaped(command).map(|_| ())
}

/// Spawns `command` and waits for it on a background thread, so the launcher
/// never lingers as a zombie. The handle yields the exit status.
fn spawn_reaped(mut command: Command) -> Result<JoinHandle<Option<ExitStatus>>, OpenError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .spawn()
        .map_err(|e| OpenError::LaunchFailed(format!("{}: {}", program, e)))?;
    thread::Builder::new()
        .name("sitedeck-launcher".into())
        .spawn(move || match child.wait() {
            Ok(status) => {
                if !status.success() {
                    log::warn!("{} exited with {}", program, status);
                }
                Some(status)
            }
            Err(e) => {
                log::warn!("failed to wait for {}: {}", program, e);
                None
            }
        })
        .map_err(|e| OpenError::LaunchFailed(format!("launcher thread: {}", e)))
}
