//! Navigable surface abstraction.
//!
//! A surface is one embedded web view: it loads URLs and reports lifecycle
//! callbacks through its [`NavigationDelegate`]. The GUI provides a wry-backed
//! implementation; [`headless`] provides an in-memory one.

pub mod delegate;
pub mod headless;

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::types::site::SiteConfig;

pub use delegate::NavigationDelegate;

/// Process-unique identity of a surface instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SurfaceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// An isolated website-data store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageContext {
    pub id: Uuid,
    /// Site whose data directory backs this context; `None` for throwaway stores.
    pub site_id: Option<String>,
}

impl StorageContext {
    /// The long-lived store of a site's normal tab.
    pub fn persistent(site_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id: Some(site_id.to_string()),
        }
    }

    /// A brand-new store that shares nothing with earlier surfaces.
    pub fn fresh() -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id: None,
        }
    }
}

/// Scripts and message handlers injected into every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptBinding {
    ErrorReporting,
    BadgeDetection,
    ConsoleForwarding,
    ContextMenuInterception,
}

impl ScriptBinding {
    pub const ALL: [ScriptBinding; 4] = [
        ScriptBinding::ErrorReporting,
        ScriptBinding::BadgeDetection,
        ScriptBinding::ConsoleForwarding,
        ScriptBinding::ContextMenuInterception,
    ];

    /// Name of the message handler the injected script posts to.
    pub fn handler_name(self) -> &'static str {
        match self {
            ScriptBinding::ErrorReporting => "errorReport",
            ScriptBinding::BadgeDetection => "badgeUpdate",
            ScriptBinding::ConsoleForwarding => "consoleLog",
            ScriptBinding::ContextMenuInterception => "contextMenu",
        }
    }
}

/// Rendered page image used by the tab overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// One embedded content-rendering view.
pub trait NavigableSurface {
    fn id(&self) -> SurfaceId;
    fn load(&self, url: &str, extra_headers: &[(String, String)]);
    fn reload(&self);
    /// URL of the committed page, if any.
    fn current_url(&self) -> Option<String>;
    fn set_hidden(&self, hidden: bool);
    fn is_hidden(&self) -> bool;
    fn install_bindings(&self, bindings: &[ScriptBinding]);
    fn snapshot(&self) -> Option<Snapshot>;
    fn storage(&self) -> &StorageContext;
}

/// What a factory needs to build a surface.
#[derive(Debug, Clone)]
pub struct SurfaceRequest {
    pub site: SiteConfig,
    pub storage: StorageContext,
}

pub trait SurfaceFactory {
    fn create(
        &self,
        request: SurfaceRequest,
        delegate: Rc<NavigationDelegate>,
    ) -> Rc<dyn NavigableSurface>;
}

/// Owner of the visual slot surfaces are displayed in.
pub trait SurfaceHost {
    /// Adds `surface`; with `replacing`, it takes that surface's slot.
    fn attach(&self, surface: &Rc<dyn NavigableSurface>, replacing: Option<SurfaceId>);
    fn detach(&self, surface: SurfaceId);
}
