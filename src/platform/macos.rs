// Sitedeck platform paths for macOS
// Config and data share ~/Library/Application Support/Sitedeck

use std::env;
use std::path::PathBuf;
use std::process::Command;

fn application_support() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join("Sitedeck")
}

pub fn get_config_dir() -> PathBuf {
    application_support()
}

pub fn get_data_dir() -> PathBuf {
    application_support()
}

pub fn open_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}
