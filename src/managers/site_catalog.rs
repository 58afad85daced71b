//! Site catalog for Sitedeck.
//!
//! Ordered, ID-deduplicated list of configured sites, stored as JSON in the
//! platform config directory. Every mutation is saved and announced with a
//! `SitesChanged` event.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use uuid::Uuid;

use crate::platform;
use crate::services::domain;
use crate::services::event_bus::EventBus;
use crate::types::errors::CatalogError;
use crate::types::events::BusEvent;
use crate::types::site::{CatalogFile, SiteConfig};

/// Trait defining the site catalog interface.
pub trait SiteCatalogTrait {
    fn load(&self) -> Result<(), CatalogError>;
    fn save(&self) -> Result<(), CatalogError>;
    fn sites(&self) -> Vec<SiteConfig>;
    fn site(&self, id: &str) -> Option<SiteConfig>;
    fn replace_all(&self, sites: Vec<SiteConfig>) -> Result<(), CatalogError>;
    fn add_site(&self, name: &str, url: &str, icon: Option<&str>) -> Result<String, CatalogError>;
    fn remove_site(&self, id: &str) -> Result<(), CatalogError>;
    fn move_site(&self, id: &str, new_index: usize) -> Result<(), CatalogError>;
}

pub struct SiteCatalog {
    path: Option<PathBuf>,
    bus: Rc<EventBus>,
    sites: RefCell<Vec<SiteConfig>>,
}

impl SiteCatalog {
    /// Creates a catalog stored at `path`, or at `sites.json` in the platform
    /// config directory when `path` is `None`. Nothing is read until `load`.
    pub fn new(path: Option<PathBuf>, bus: Rc<EventBus>) -> Rc<Self> {
        let path = path.unwrap_or_else(|| platform::get_config_dir().join("sites.json"));
        Rc::new(Self {
            path: Some(path),
            bus,
            sites: RefCell::new(Vec::new()),
        })
    }

    /// A catalog that never touches disk.
    pub fn in_memory(sites: Vec<SiteConfig>, bus: Rc<EventBus>) -> Rc<Self> {
        Rc::new(Self {
            path: None,
            bus,
            sites: RefCell::new(dedupe(sites)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Saves `next` and only then makes it the current list. A failed save
    /// leaves the catalog as it was and announces nothing.
    fn commit(&self, next: Vec<SiteConfig>) -> Result<(), CatalogError> {
        self.write_file(&next)?;
        *self.sites.borrow_mut() = next;
        self.bus.publish(BusEvent::SitesChanged);
        Ok(())
    }

    fn write_file(&self, sites: &[SiteConfig]) -> Result<(), CatalogError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CatalogError::IoError(format!("Failed to create catalog directory: {}", e))
            })?;
        }
        let file = CatalogFile {
            sites: sites.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| {
            CatalogError::SerializationError(format!("Failed to serialize catalog: {}", e))
        })?;
        fs::write(path, json)
            .map_err(|e| CatalogError::IoError(format!("Failed to write catalog: {}", e)))
    }
}

/// Drops later entries whose ID was already seen.
fn dedupe(sites: Vec<SiteConfig>) -> Vec<SiteConfig> {
    let mut unique: Vec<SiteConfig> = Vec::with_capacity(sites.len());
    for site in sites {
        if unique.iter().any(|s| s.id == site.id) {
            log::warn!("ignoring duplicate site id {}", site.id);
            continue;
        }
        unique.push(site);
    }
    unique
}

impl SiteCatalogTrait for SiteCatalog {
    /// Reads the catalog file. A missing file is an empty catalog. Loading
    /// does not publish `SitesChanged`.
    fn load(&self) -> Result<(), CatalogError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if !path.exists() {
            self.sites.borrow_mut().clear();
            return Ok(());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| CatalogError::IoError(format!("Failed to read catalog: {}", e)))?;
        let file: CatalogFile = serde_json::from_str(&content).map_err(|e| {
            CatalogError::SerializationError(format!("Failed to parse catalog: {}", e))
        })?;
        *self.sites.borrow_mut() = dedupe(file.sites);
        log::info!("loaded {} sites from {}", self.sites.borrow().len(), path.display());
        Ok(())
    }

    fn save(&self) -> Result<(), CatalogError> {
        let sites = self.sites();
        self.write_file(&sites)
    }

    fn sites(&self) -> Vec<SiteConfig> {
        self.sites.borrow().clone()
    }

    fn site(&self, id: &str) -> Option<SiteConfig> {
        self.sites.borrow().iter().find(|s| s.id == id).cloned()
    }

    fn replace_all(&self, sites: Vec<SiteConfig>) -> Result<(), CatalogError> {
        self.commit(dedupe(sites))
    }

    /// Appends a site with a new ID. Returns the ID.
    fn add_site(&self, name: &str, url: &str, icon: Option<&str>) -> Result<String, CatalogError> {
        if !domain::is_web_scheme(url) {
            return Err(CatalogError::InvalidUrl(url.to_string()));
        }
        let mut site = SiteConfig::new(Uuid::new_v4().to_string(), name, url.trim());
        site.icon = icon.map(str::to_string);
        let id = site.id.clone();
        let mut next = self.sites();
        next.push(site);
        self.commit(next)?;
        Ok(id)
    }

    fn remove_site(&self, id: &str) -> Result<(), CatalogError> {
        let mut next = self.sites();
        let index = next
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        next.remove(index);
        self.commit(next)
    }

    fn move_site(&self, id: &str, new_index: usize) -> Result<(), CatalogError> {
        let mut next = self.sites();
        let index = next
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if new_index >= next.len() {
            return Err(CatalogError::InvalidIndex(new_index));
        }
        let site = next.remove(index);
        next.insert(new_index, site);
        self.commit(next)
    }
}
