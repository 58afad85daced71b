//! In-memory surface for the console shell and the test-suite.
//!
//! Nothing is rendered. Loads and reloads are recorded, and the `simulate_*`
//! methods drive the delegate the way a real engine would.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{
    NavigableSurface, NavigationDelegate, ScriptBinding, Snapshot, StorageContext,
    SurfaceFactory, SurfaceHost, SurfaceId, SurfaceRequest,
};
use crate::types::navigation::{NavigationError, NavigationRequest};

pub struct HeadlessSurface {
    id: SurfaceId,
    site_id: String,
    storage: StorageContext,
    delegate: Rc<NavigationDelegate>,
    loads: RefCell<Vec<String>>,
    last_headers: RefCell<Vec<(String, String)>>,
    reloads: Cell<u32>,
    committed_url: RefCell<Option<String>>,
    hidden: Cell<bool>,
    bindings: RefCell<Vec<ScriptBinding>>,
}

impl HeadlessSurface {
    pub fn new(request: SurfaceRequest, delegate: Rc<NavigationDelegate>) -> Rc<Self> {
        Rc::new(Self {
            id: SurfaceId::next(),
            site_id: request.site.id,
            storage: request.storage,
            delegate,
            loads: RefCell::new(Vec::new()),
            last_headers: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
            committed_url: RefCell::new(None),
            hidden: Cell::new(false),
            bindings: RefCell::new(Vec::new()),
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.last_headers.borrow().clone()
    }

    pub fn reload_count(&self) -> u32 {
        self.reloads.get()
    }

    pub fn bindings(&self) -> Vec<ScriptBinding> {
        self.bindings.borrow().clone()
    }

    pub fn delegate(&self) -> &Rc<NavigationDelegate> {
        &self.delegate
    }

    /// The engine committed the most recent load and started navigating.
    pub fn simulate_start(&self) {
        let pending = self.loads.borrow().last().cloned();
        if let Some(url) = pending {
            *self.committed_url.borrow_mut() = Some(url);
        }
        self.delegate.did_start_navigation();
    }

    /// The page finished loading, optionally at a different (redirected) URL.
    pub fn simulate_finish(&self, final_url: Option<&str>) {
        if let Some(url) = final_url {
            *self.committed_url.borrow_mut() = Some(url.to_string());
        }
        self.delegate.did_finish_navigation();
    }

    pub fn simulate_fail(&self, url: &str, error: NavigationError) {
        self.delegate.did_fail_navigation(url, &error);
    }

    pub fn simulate_crash(&self) {
        self.delegate.content_process_did_terminate();
    }

    /// Asks the delegate about `request`; returns whether the surface would proceed.
    pub fn simulate_navigation(&self, request: &NavigationRequest) -> bool {
        let allowed = self.delegate.decide_policy(request);
        if allowed {
            self.loads.borrow_mut().push(request.url.clone());
        }
        allowed
    }
}

impl NavigableSurface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn load(&self, url: &str, extra_headers: &[(String, String)]) {
        self.loads.borrow_mut().push(url.to_string());
        *self.last_headers.borrow_mut() = extra_headers.to_vec();
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn current_url(&self) -> Option<String> {
        self.committed_url.borrow().clone()
    }

    fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    fn install_bindings(&self, bindings: &[ScriptBinding]) {
        let mut installed = self.bindings.borrow_mut();
        for binding in bindings {
            if !installed.contains(binding) {
                installed.push(*binding);
            }
        }
    }

    fn snapshot(&self) -> Option<Snapshot> {
        None
    }

    fn storage(&self) -> &StorageContext {
        &self.storage
    }
}

/// Creates [`HeadlessSurface`]s and remembers every one it made.
#[derive(Default)]
pub struct HeadlessSurfaceFactory {
    created: RefCell<Vec<Rc<HeadlessSurface>>>,
}

impl HeadlessSurfaceFactory {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn created(&self) -> Vec<Rc<HeadlessSurface>> {
        self.created.borrow().clone()
    }

    /// Most recently created surface for `site_id`.
    pub fn latest_for(&self, site_id: &str) -> Option<Rc<HeadlessSurface>> {
        self.created
            .borrow()
            .iter()
            .rev()
            .find(|s| s.site_id() == site_id)
            .cloned()
    }

    pub fn count_for(&self, site_id: &str) -> usize {
        self.created
            .borrow()
            .iter()
            .filter(|s| s.site_id() == site_id)
            .count()
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    fn create(
        &self,
        request: SurfaceRequest,
        delegate: Rc<NavigationDelegate>,
    ) -> Rc<dyn NavigableSurface> {
        let surface = HeadlessSurface::new(request, delegate);
        self.created.borrow_mut().push(surface.clone());
        surface
    }
}

/// Records the order of attached surfaces.
#[derive(Default)]
pub struct HeadlessHost {
    slots: RefCell<Vec<SurfaceId>>,
    detached: RefCell<Vec<SurfaceId>>,
}

impl HeadlessHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn slots(&self) -> Vec<SurfaceId> {
        self.slots.borrow().clone()
    }

    pub fn detached(&self) -> Vec<SurfaceId> {
        self.detached.borrow().clone()
    }

    pub fn is_attached(&self, id: SurfaceId) -> bool {
        self.slots.borrow().contains(&id)
    }
}

impl SurfaceHost for HeadlessHost {
    fn attach(&self, surface: &Rc<dyn NavigableSurface>, replacing: Option<SurfaceId>) {
        let mut slots = self.slots.borrow_mut();
        let position = replacing.and_then(|old| slots.iter().position(|id| *id == old));
        match position {
            Some(index) => slots.insert(index, surface.id()),
            None => slots.push(surface.id()),
        }
    }

    fn detach(&self, surface: SurfaceId) {
        self.slots.borrow_mut().retain(|id| *id != surface);
        self.detached.borrow_mut().push(surface);
    }
}
