//! App Core for Sitedeck.
//!
//! Central struct holding the run loop, the shared services and the managers,
//! and managing the application lifecycle.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::database::{Database, DATABASE_FILE};
use crate::managers::site_catalog::{SiteCatalog, SiteCatalogTrait};
use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::platform;
use crate::runtime::MainLoop;
use crate::services::context::ShellContext;
use crate::services::event_bus::{EventBus, Subscription};
use crate::services::external_opener::ExternalOpener;
use crate::services::kv_store::SqliteStore;
use crate::services::load_errors::LoadErrorTracker;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::telemetry::LogTelemetry;
use crate::surface::{SurfaceFactory, SurfaceHost};
use crate::types::events::Topic;

/// Where the app keeps its files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub settings: PathBuf,
    pub catalog: PathBuf,
    pub database: PathBuf,
}

impl AppPaths {
    /// Paths under the platform config and data directories.
    pub fn platform_default() -> Self {
        let config = platform::get_config_dir();
        Self {
            settings: config.join("settings.json"),
            catalog: config.join("sites.json"),
            database: platform::get_data_dir().join(DATABASE_FILE),
        }
    }

    /// All three files inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            settings: dir.join("settings.json"),
            catalog: dir.join("sites.json"),
            database: dir.join(DATABASE_FILE),
        }
    }
}

/// The embedder-provided pieces: how surfaces are built and shown, and how
/// URLs reach the default browser.
pub struct Embedder {
    pub factory: Rc<dyn SurfaceFactory>,
    pub host: Rc<dyn SurfaceHost>,
    pub opener: Rc<dyn ExternalOpener>,
}

/// Central application struct holding all managers and services.
pub struct App {
    pub ctx: Rc<ShellContext>,
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub catalog: Rc<SiteCatalog>,
    pub tab_manager: Rc<TabManager>,
    pub load_errors: Rc<LoadErrorTracker>,
    _active_tab_subscription: Subscription,
}

impl App {
    /// Opens the state database, loads settings and the site catalog, and
    /// builds one tab per site. Only the active tab starts loading.
    pub fn new(paths: &AppPaths, embedder: Embedder) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = paths.database.parent() {
            fs::create_dir_all(parent)?;
        }
        let db = Arc::new(Database::open(&paths.database)?);

        let mut settings_engine =
            SettingsEngine::new(Some(paths.settings.to_string_lossy().to_string()));
        if let Err(e) = settings_engine.load() {
            log::warn!("using default settings: {}", e);
        }
        let settings = settings_engine.effective_settings();
        if settings.watchdog.diagnostic_mode {
            log::info!(
                "diagnostic watchdogs enabled, stuck timeout {:?}",
                settings.watchdog.stuck_timeout()
            );
        }

        let main_loop = MainLoop::new();
        let bus = EventBus::new(main_loop.clone());
        let ctx = Rc::new(ShellContext {
            main_loop,
            bus: bus.clone(),
            store: Rc::new(SqliteStore::new(db.clone())),
            factory: embedder.factory,
            host: embedder.host,
            opener: embedder.opener,
            telemetry: Rc::new(LogTelemetry),
            settings,
        });

        let catalog = SiteCatalog::new(Some(paths.catalog.clone()), bus.clone());
        catalog.load()?;

        let load_errors = LoadErrorTracker::new(ctx.clone());
        let tab_manager = TabManager::new(ctx.clone(), catalog.clone());

        let weak_manager = Rc::downgrade(&tab_manager);
        let active_tab_subscription = bus.subscribe(Topic::ActiveTabChanged, move |_| {
            if let Some(tab) = weak_manager.upgrade().and_then(|m| m.active_tab()) {
                tab.did_attach_to_window();
            }
        });

        Ok(Self {
            ctx,
            db,
            settings_engine,
            catalog,
            tab_manager,
            load_errors,
            _active_tab_subscription: active_tab_subscription,
        })
    }

    /// Delivers the notifications raised during construction.
    pub fn startup(&self) {
        let delivered = self.ctx.main_loop.run_pending();
        log::info!(
            "started with {} sites, {} startup tasks",
            self.tab_manager.tab_count(),
            delivered
        );
    }

    /// Runs every task and timer due by `now` (time since the loop started).
    pub fn tick(&self, now: Duration) {
        self.ctx.main_loop.advance_to(now);
    }

    /// Time of the next pending timer, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.ctx.main_loop.next_deadline()
    }

    /// Tears down every tab so no timer or callback outlives the window.
    pub fn shutdown(&self) {
        for tab in self.tab_manager.tabs() {
            tab.teardown();
        }
        self.ctx.main_loop.run_pending();
        log::info!("shut down");
    }
}
