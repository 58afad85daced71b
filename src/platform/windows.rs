// Sitedeck platform paths for Windows
// Config: %APPDATA%/Sitedeck
// Data:   %LOCALAPPDATA%/Sitedeck

use std::env;
use std::path::PathBuf;
use std::process::Command;

pub fn get_config_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("Sitedeck")
}

pub fn get_data_dir() -> PathBuf {
    let local_appdata = env::var("LOCALAPPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Local"));
    PathBuf::from(local_appdata).join("Sitedeck")
}

/// Goes through the URL protocol handler rather than `cmd /C start`, which
/// would split query strings at `&`.
pub fn open_command(url: &str) -> Command {
    let mut command = Command::new("rundll32");
    command.args(["url.dll,FileProtocolHandler", url]);
    command
}
