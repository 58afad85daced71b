//! wry-backed surfaces.
//!
//! Each tab gets a child webview of the main window, placed in the content
//! area to the right of the site rail. [`WryShell`] both builds the webviews
//! and keeps the attached ones laid out.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use tao::event_loop::EventLoopProxy;
use tao::window::Window;
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::http::{HeaderMap, HeaderName, HeaderValue};
use wry::{PageLoadEvent, Rect, WebContext, WebView, WebViewBuilder};

use super::webview_app::UserEvent;
use crate::services::navigation_policy::GestureTracker;
use crate::surface::headless::HeadlessSurface;
use crate::surface::{
    NavigableSurface, NavigationDelegate, ScriptBinding, Snapshot, StorageContext,
    SurfaceFactory, SurfaceHost, SurfaceId, SurfaceRequest,
};
use crate::types::navigation::{FrameTarget, NavigationKind, NavigationRequest};

/// Forwards page errors, badge counts, console output and context-menu
/// requests to the native side, and reports link clicks and form submissions
/// so the navigation handler can tell them from script navigations.
const BINDINGS_JS: &str = r#"
(function(){
  function post(handler, payload){
    try { window.ipc.postMessage(JSON.stringify({handler: handler, payload: payload})); } catch (_) {}
  }
  window.addEventListener('error', function(e){
    post('errorReport', {message: String(e.message), source: String(e.filename || ''), line: e.lineno || 0});
  });
  var lastBadge = null;
  function checkBadge(){
    var m = /^\((\d+)\)/.exec(document.title || '');
    var badge = m ? parseInt(m[1], 10) : 0;
    if (badge !== lastBadge) { lastBadge = badge; post('badgeUpdate', {count: badge}); }
  }
  setInterval(checkBadge, 2000);
  ['log','warn','error'].forEach(function(level){
    var original = console[level];
    console[level] = function(){
      post('consoleLog', {level: level, message: Array.prototype.join.call(arguments, ' ')});
      return original.apply(console, arguments);
    };
  });
  document.addEventListener('contextmenu', function(e){
    var link = e.target && e.target.closest ? e.target.closest('a[href]') : null;
    if (link) { post('contextMenu', {href: link.href}); }
  });
  document.addEventListener('click', function(e){
    var link = e.target && e.target.closest ? e.target.closest('a[href]') : null;
    if (link && (!link.target || link.target === '_self')) {
      post('navigationGesture', {url: link.href, kind: 'link'});
    }
  }, true);
  document.addEventListener('submit', function(e){
    var form = e.target;
    if (form && form.action) { post('navigationGesture', {url: form.action, kind: 'form'}); }
  }, true);
})();
"#;

/// Content area of the window, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContentBounds {
    pub fn rect(&self) -> Rect {
        Rect {
            position: LogicalPosition::new(self.x, self.y).into(),
            size: LogicalSize::new(self.width, self.height).into(),
        }
    }
}

pub struct WrySurface {
    id: SurfaceId,
    delegate: Weak<NavigationDelegate>,
    // Declared before `context` so the view goes away first.
    webview: WebView,
    _context: WebContext,
    storage: StorageContext,
    committed_url: Rc<RefCell<Option<String>>>,
    hidden: Cell<bool>,
    bindings: RefCell<Vec<ScriptBinding>>,
}

impl WrySurface {
    fn set_bounds(&self, bounds: ContentBounds) {
        if let Err(e) = self.webview.set_bounds(bounds.rect()) {
            log::warn!("{}: failed to resize: {}", self.id, e);
        }
    }
}

impl NavigableSurface for WrySurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn load(&self, url: &str, extra_headers: &[(String, String)]) {
        let result = if extra_headers.is_empty() {
            self.webview.load_url(url)
        } else {
            self.webview.load_url_with_headers(url, header_map(extra_headers))
        };
        if let Err(e) = result {
            log::error!("{}: failed to load {}: {}", self.id, url, e);
        }
    }

    fn reload(&self) {
        if let Err(e) = self.webview.reload() {
            log::error!("{}: failed to reload: {}", self.id, e);
        }
    }

    fn current_url(&self) -> Option<String> {
        self.committed_url.borrow().clone()
    }

    fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
        if let Err(e) = self.webview.set_visible(!hidden) {
            log::warn!("{}: failed to change visibility: {}", self.id, e);
        }
    }

    fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    /// The scripts themselves are injected at creation; this enables the
    /// native side of each binding.
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

fn header_map(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => log::warn!("skipping invalid header {}", name),
        }
    }
    headers
}

fn handle_binding_message(site_id: &str, body: &str, gestures: &RefCell<GestureTracker>) {
    let Ok(message) = serde_json::from_str::<serde_json::Value>(body) else {
        return;
    };
    let handler = message.get("handler").and_then(|v| v.as_str()).unwrap_or("");
    let payload = message.get("payload").cloned().unwrap_or_default();
    if handler == "navigationGesture" {
        let url = payload.get("url").and_then(|v| v.as_str());
        let kind = match payload.get("kind").and_then(|v| v.as_str()) {
            Some("form") => NavigationKind::FormSubmitted,
            _ => NavigationKind::LinkActivated,
        };
        if let Some(url) = url {
            gestures.borrow_mut().record(url, kind);
        }
    } else if handler == ScriptBinding::ErrorReporting.handler_name() {
        log::warn!(target: "page", "[{}] script error: {}", site_id, payload);
    } else if handler == ScriptBinding::BadgeDetection.handler_name() {
        log::debug!(target: "page", "[{}] badge {}", site_id, payload);
    } else if handler == ScriptBinding::ConsoleForwarding.handler_name() {
        log::debug!(target: "page", "[{}] console: {}", site_id, payload);
    } else if handler == ScriptBinding::ContextMenuInterception.handler_name() {
        log::debug!(target: "page", "[{}] context menu on {}", site_id, payload);
    }
}

/// Surface factory and host for the main window.
pub struct WryShell {
    window: Rc<Window>,
    proxy: EventLoopProxy<UserEvent>,
    data_dir: PathBuf,
    bounds: Cell<ContentBounds>,
    attached: RefCell<Vec<Rc<WrySurface>>>,
    /// Surfaces built by this shell that are not attached yet.
    built: RefCell<Vec<Weak<WrySurface>>>,
}

impl WryShell {
    pub fn new(
        window: Rc<Window>,
        proxy: EventLoopProxy<UserEvent>,
        data_dir: PathBuf,
        bounds: ContentBounds,
    ) -> Rc<Self> {
        Rc::new(Self {
            window,
            proxy,
            data_dir,
            bounds: Cell::new(bounds),
            attached: RefCell::new(Vec::new()),
            built: RefCell::new(Vec::new()),
        })
    }

    /// Moves every attached surface into `bounds`.
    pub fn layout(&self, bounds: ContentBounds) {
        self.bounds.set(bounds);
        for surface in self.attached.borrow().iter() {
            surface.set_bounds(bounds);
        }
    }

    /// Runs the popup policy for a `window.open` or `target=_blank` request
    /// that `surface` forwarded through the event loop.
    pub fn handle_popup(&self, surface: SurfaceId, url: String) {
        let delegate = self
            .built
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|s| s.id == surface)
            .and_then(|s| s.delegate.upgrade());
        let Some(delegate) = delegate else {
            log::debug!("{}: popup for {} after the surface went away", surface, url);
            return;
        };
        delegate.decide_policy(&NavigationRequest {
            url,
            kind: NavigationKind::LinkActivated,
            target: FrameTarget::NewWindow,
        });
    }

    fn context_dir(&self, storage: &StorageContext) -> PathBuf {
        match &storage.site_id {
            Some(site_id) => self.data_dir.join("sites").join(site_id),
            None => self.data_dir.join("contexts").join(storage.id.to_string()),
        }
    }

    fn build(
        &self,
        request: &SurfaceRequest,
        delegate: &Rc<NavigationDelegate>,
    ) -> Result<Rc<WrySurface>, wry::Error> {
        let id = SurfaceId::next();
        let committed_url = Rc::new(RefCell::new(None));
        let gestures = Rc::new(RefCell::new(GestureTracker::new()));
        let mut context = WebContext::new(Some(self.context_dir(&request.storage)));

        let load_delegate = Rc::downgrade(delegate);
        let load_url = committed_url.clone();
        let load_proxy = self.proxy.clone();
        let nav_delegate = Rc::downgrade(delegate);
        let nav_proxy = self.proxy.clone();
        let nav_gestures = gestures.clone();
        // The popup handler must be Send + Sync; it only forwards to the loop.
        let popup_proxy = self.proxy.clone();
        let ipc_site = request.site.id.clone();
        let ipc_gestures = gestures;

        let webview = WebViewBuilder::new_with_web_context(&mut context)
            .with_bounds(self.bounds.get().rect())
            .with_visible(false)
            .with_initialization_script(BINDINGS_JS)
            .with_on_page_load_handler(move |event, url| {
                let Some(delegate) = load_delegate.upgrade() else {
                    return;
                };
                match event {
                    PageLoadEvent::Started => {
                        *load_url.borrow_mut() = Some(url);
                        delegate.did_start_navigation();
                    }
                    PageLoadEvent::Finished => {
                        *load_url.borrow_mut() = Some(url);
                        delegate.did_finish_navigation();
                    }
                }
                let _ = load_proxy.send_event(UserEvent::Pump);
            })
            .with_navigation_handler(move |url| {
                let Some(delegate) = nav_delegate.upgrade() else {
                    return false;
                };
                let kind = nav_gestures.borrow_mut().classify(&url);
                let request = NavigationRequest {
                    url,
                    kind,
                    target: FrameTarget::MainFrame,
                };
                let allowed = delegate.decide_policy(&request);
                let _ = nav_proxy.send_event(UserEvent::Pump);
                allowed
            })
            .with_new_window_req_handler(move |url, _features| {
                let _ = popup_proxy.send_event(UserEvent::Popup { surface: id, url });
                wry::NewWindowResponse::Deny
            })
            .with_ipc_handler(move |msg: wry::http::Request<String>| {
                handle_binding_message(&ipc_site, msg.body(), &ipc_gestures);
            })
            .with_devtools(cfg!(debug_assertions))
            .build_as_child(&*self.window)?;

        Ok(Rc::new(WrySurface {
            id,
            delegate: Rc::downgrade(delegate),
            webview,
            _context: context,
            storage: request.storage.clone(),
            committed_url,
            hidden: Cell::new(true),
            bindings: RefCell::new(Vec::new()),
        }))
    }
}

impl SurfaceFactory for WryShell {
    fn create(
        &self,
        request: SurfaceRequest,
        delegate: Rc<NavigationDelegate>,
    ) -> Rc<dyn NavigableSurface> {
        match self.build(&request, &delegate) {
            Ok(surface) => {
                self.built.borrow_mut().push(Rc::downgrade(&surface));
                surface as Rc<dyn NavigableSurface>
            }
            Err(e) => {
                // The tab's watchdog hands the site to the default browser.
                log::error!("failed to create a webview for {}: {}", request.site.id, e);
                HeadlessSurface::new(request, delegate)
            }
        }
    }
}

impl SurfaceHost for WryShell {
    fn attach(&self, surface: &Rc<dyn NavigableSurface>, replacing: Option<SurfaceId>) {
        let id = surface.id();
        let concrete = {
            let mut built = self.built.borrow_mut();
            built.retain(|weak| weak.strong_count() > 0);
            let found = built.iter().filter_map(Weak::upgrade).find(|s| s.id == id);
            found
        };
        let Some(concrete) = concrete else {
            return;
        };
        concrete.set_bounds(self.bounds.get());
        let mut attached = self.attached.borrow_mut();
        let position = replacing.and_then(|old| attached.iter().position(|s| s.id == old));
        match position {
            Some(index) => attached.insert(index, concrete),
            None => attached.push(concrete),
        }
    }

    fn detach(&self, surface: SurfaceId) {
        let removed: Vec<Rc<WrySurface>> = {
            let mut attached = self.attached.borrow_mut();
            let (gone, kept): (Vec<_>, Vec<_>) =
                attached.drain(..).partition(|s| s.id == surface);
            *attached = kept;
            gone
        };
        for surface in removed {
            surface.set_hidden(true);
        }
    }
}
