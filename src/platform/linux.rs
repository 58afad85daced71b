// Sitedeck platform paths for Linux
// Config: ~/.config/sitedeck
// Data:   ~/.local/share/sitedeck
// URLs are handed to xdg-open.

use std::env;
use std::path::PathBuf;
use std::process::Command;

fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join("sitedeck"),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            fallback
                .iter()
                .fold(PathBuf::from(home), |path, part| path.join(part))
                .join("sitedeck")
        }
    }
}

/// `$XDG_CONFIG_HOME/sitedeck`, otherwise `~/.config/sitedeck`.
pub fn get_config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"])
}

/// `$XDG_DATA_HOME/sitedeck`, otherwise `~/.local/share/sitedeck`.
pub fn get_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}

pub fn open_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}
