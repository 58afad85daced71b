//! Services shared by every tab.
//!
//! Constructed once by [`crate::app::App`] (or a test) and injected into the
//! tab manager, each tab and each navigation delegate.

use std::rc::Rc;

use crate::runtime::MainLoop;
use crate::services::event_bus::EventBus;
use crate::services::external_opener::ExternalOpener;
use crate::services::kv_store::KeyValueStore;
use crate::services::telemetry::Telemetry;
use crate::surface::{SurfaceFactory, SurfaceHost};
use crate::types::settings::ShellSettings;

pub struct ShellContext {
    pub main_loop: Rc<MainLoop>,
    pub bus: Rc<EventBus>,
    pub store: Rc<dyn KeyValueStore>,
    pub factory: Rc<dyn SurfaceFactory>,
    pub host: Rc<dyn SurfaceHost>,
    pub opener: Rc<dyn ExternalOpener>,
    pub telemetry: Rc<dyn Telemetry>,
    pub settings: ShellSettings,
}

impl ShellContext {
    /// Hands `url` to the default browser. Failures are logged, never raised.
    pub fn open_external(&self, url: &str) {
        log::info!("opening {} in the default browser", url);
        if let Err(e) = self.opener.open(url) {
            log::error!("{}", e);
        }
    }

    /// Reads a persisted value, treating store failures as absent.
    pub fn read_value(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::error!("failed to read '{}': {}", key, e);
                None
            }
        }
    }

    pub fn write_value(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            log::error!("failed to write '{}': {}", key, e);
        }
    }

    pub fn remove_value(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::error!("failed to remove '{}': {}", key, e);
        }
    }
}
