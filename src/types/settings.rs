use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Environment variable that forces diagnostic watchdog timings.
pub const DIAGNOSTIC_ENV_VAR: &str = "SITEDECK_DIAGNOSTIC_WATCHDOGS";

/// Top-level shell settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShellSettings {
    #[serde(default)]
    pub watchdog: WatchdogSettings,
    #[serde(default)]
    pub tabs: TabSettings,
}

/// Navigation watchdog timings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchdogSettings {
    pub pre_start_timeout_secs: u64,
    pub stuck_timeout_secs: u64,
    pub diagnostic_stuck_timeout_secs: u64,
    pub diagnostic_mode: bool,
    pub crash_recovery_timeout_secs: u64,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            pre_start_timeout_secs: 10,
            stuck_timeout_secs: 20,
            diagnostic_stuck_timeout_secs: 5,
            diagnostic_mode: false,
            crash_recovery_timeout_secs: 8,
        }
    }
}

impl WatchdogSettings {
    pub fn pre_start_timeout(&self) -> Duration {
        Duration::from_secs(self.pre_start_timeout_secs)
    }

    /// Stuck-navigation timeout, shortened in diagnostic mode.
    pub fn stuck_timeout(&self) -> Duration {
        if self.diagnostic_mode {
            Duration::from_secs(self.diagnostic_stuck_timeout_secs)
        } else {
            Duration::from_secs(self.stuck_timeout_secs)
        }
    }

    pub fn crash_recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.crash_recovery_timeout_secs)
    }

    /// Applies `SITEDECK_DIAGNOSTIC_WATCHDOGS` if set to a truthy value.
    pub fn apply_env_override(&mut self) {
        if let Ok(value) = std::env::var(DIAGNOSTIC_ENV_VAR) {
            if matches!(value.trim(), "1" | "true" | "yes" | "on") {
                self.diagnostic_mode = true;
            }
        }
    }
}

/// Per-tab behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabSettings {
    /// Seconds between dynamic-icon refresh ticks; 0 disables them.
    pub icon_refresh_interval_secs: u64,
    /// Extra request headers sent with every initial load.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            icon_refresh_interval_secs: 300,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl TabSettings {
    pub fn icon_refresh_interval(&self) -> Option<Duration> {
        if self.icon_refresh_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.icon_refresh_interval_secs))
        }
    }

    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.extra_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
