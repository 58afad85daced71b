//! Desktop window using `wry` + `tao`.
//!
//! Layout:
//! - A narrow rail webview on the left lists the configured sites. Clicking an
//!   icon selects that site's tab; IPC from the rail goes through the event
//!   loop proxy as [`UserEvent`]s.
//! - Every tab owns a child webview filling the rest of the window. Only the
//!   active one is visible.
//! - A load-error overlay covers the content area while the active site has
//!   an unresolved load failure.
//!
//! The shell's [`MainLoop`](crate::runtime::MainLoop) is driven from the tao
//! event loop: every wake-up advances it to the current time, and the control
//! flow sleeps until the next watchdog deadline.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tao::window::{Window, WindowBuilder};
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::{Rect, WebView, WebViewBuilder};

use super::surface::{ContentBounds, WryShell};
use crate::app::{App, AppPaths, Embedder};
use crate::managers::tab_manager::TabManagerTrait;
use crate::platform;
use crate::services::event_bus::Subscription;
use crate::services::external_opener::SystemOpener;
use crate::services::load_errors::{ErrorAction, LoadErrorPage};
use crate::surface::SurfaceId;
use crate::types::events::{BusEvent, Topic};

const RAIL_WIDTH: f64 = 68.0;

#[derive(Debug)]
pub enum UserEvent {
    /// A webview callback queued shell work; run the main loop.
    Pump,
    SelectSite(String),
    SelectNext,
    SelectPrevious,
    ResolveError { site_id: String, action: ErrorAction },
    /// A page asked for a new window; the policy runs on the main thread.
    Popup { surface: SurfaceId, url: String },
}

const RAIL_HTML: &str = r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#16181d;height:100vh;overflow-y:auto;user-select:none;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Helvetica,Arial,sans-serif}
#sites{display:flex;flex-direction:column;align-items:center;gap:10px;padding:12px 0}
.site{position:relative;width:44px;height:44px;border-radius:12px;background:#262a33;display:flex;align-items:center;justify-content:center;color:#e6edf3;font-weight:600;cursor:pointer;border:2px solid transparent}
.site.active{border-color:#58a6ff}
.site img{width:28px;height:28px;border-radius:6px}
.site .dot{position:absolute;right:-3px;bottom:-3px;width:10px;height:10px;border-radius:50%;background:#d29922;display:none}
.site.loading .dot{display:block}
.site.failed .dot{display:block;background:#f85149}
</style></head><body><div id="sites"></div><script>
function post(msg){window.ipc.postMessage(JSON.stringify(msg))}
window.__sitedeck_render=function(sites){
  var root=document.getElementById('sites');root.innerHTML='';
  sites.forEach(function(s){
    var el=document.createElement('div');
    el.className='site'+(s.active?' active':'')+(s.loading?' loading':'')+(s.failed?' failed':'');
    el.title=s.name;
    if(s.icon){var img=document.createElement('img');img.src=s.icon;img.onerror=function(){img.remove();el.insertBefore(document.createTextNode(s.name.charAt(0).toUpperCase()),el.firstChild)};el.appendChild(img)}
    else{el.appendChild(document.createTextNode(s.name.charAt(0).toUpperCase()))}
    var dot=document.createElement('span');dot.className='dot';el.appendChild(dot);
    el.addEventListener('click',function(){post({cmd:'select',id:s.id})});
    root.appendChild(el);
  });
};
document.addEventListener('keydown',function(e){
  if(e.ctrlKey&&e.key==='Tab'){e.preventDefault();post({cmd:e.shiftKey?'previous':'next'})}
});
post({cmd:'ready'});
</script></body></html>"#;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The load-error page shown over the content area.
pub fn error_page_html(page: &LoadErrorPage, site_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><style>
*{{margin:0;padding:0;box-sizing:border-box}}
body{{background:#0d1117;color:#e6edf3;height:100vh;display:flex;align-items:center;justify-content:center;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Helvetica,Arial,sans-serif}}
.card{{max-width:520px;text-align:center}}
h1{{font-size:20px;margin-bottom:12px}}
p{{color:#7d8590;margin-bottom:8px;word-break:break-all}}
.actions{{margin-top:20px;display:flex;gap:10px;justify-content:center}}
button{{background:#21262d;color:#e6edf3;border:1px solid #30363d;border-radius:6px;padding:6px 14px;cursor:pointer}}
button.primary{{background:#238636;border-color:#2ea043}}
</style></head><body><div class="card">
<h1>{name} could not be loaded</h1>
<p>{url}</p>
<p>{error}</p>
<div class="actions">
<button class="primary" onclick="post('retry')">Try again</button>
<button onclick="post('open_external')">Open in browser</button>
<button onclick="post('dismiss')">Dismiss</button>
</div></div><script>
function post(action){{window.ipc.postMessage(JSON.stringify({{cmd:action,id:{id}}}))}}
</script></body></html>"#,
        name = escape_html(site_name),
        url = escape_html(&page.url),
        error = escape_html(&page.error),
        id = serde_json::Value::String(page.site_id.clone()),
    )
}

fn handle_rail_ipc(message: &str) -> Option<UserEvent> {
    let msg: serde_json::Value = serde_json::from_str(message).ok()?;
    match msg.get("cmd")?.as_str()? {
        "ready" => Some(UserEvent::Pump),
        "select" => Some(UserEvent::SelectSite(msg.get("id")?.as_str()?.to_string())),
        "next" => Some(UserEvent::SelectNext),
        "previous" => Some(UserEvent::SelectPrevious),
        _ => None,
    }
}

fn handle_overlay_ipc(message: &str) -> Option<UserEvent> {
    let msg: serde_json::Value = serde_json::from_str(message).ok()?;
    let site_id = msg.get("id")?.as_str()?.to_string();
    let action = match msg.get("cmd")?.as_str()? {
        "retry" => ErrorAction::Retry,
        "open_external" => ErrorAction::OpenExternally,
        "dismiss" => ErrorAction::Dismiss,
        _ => return None,
    };
    Some(UserEvent::ResolveError { site_id, action })
}

fn rail_rect(window: &Window) -> Rect {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    Rect {
        position: LogicalPosition::new(0.0, 0.0).into(),
        size: LogicalSize::new(RAIL_WIDTH, size.height).into(),
    }
}

fn content_bounds(window: &Window) -> ContentBounds {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    ContentBounds {
        x: RAIL_WIDTH,
        y: 0.0,
        width: (size.width - RAIL_WIDTH).max(0.0),
        height: size.height,
    }
}

/// Rail and overlay views, refreshed from bus events.
struct Chrome {
    rail: WebView,
    overlay: WebView,
    loading: RefCell<HashSet<String>>,
    icon_generation: Cell<u64>,
}

impl Chrome {
    fn render_rail(&self, app: &App) {
        let active = app.tab_manager.active_tab().map(|tab| tab.site_id().to_string());
        let loading = self.loading.borrow();
        let generation = self.icon_generation.get();
        let sites: Vec<serde_json::Value> = app
            .tab_manager
            .tabs()
            .iter()
            .map(|tab| {
                let site = tab.site();
                let icon = site.icon.clone().or_else(|| {
                    url::Url::parse(&site.url)
                        .ok()
                        .and_then(|u| u.host_str().map(|h| format!("https://{}/favicon.ico", h)))
                        .map(|icon| format!("{}?v={}", icon, generation))
                });
                serde_json::json!({
                    "id": site.id,
                    "name": site.name,
                    "icon": icon,
                    "active": active.as_deref() == Some(site.id.as_str()),
                    "loading": loading.contains(&site.id),
                    "failed": app.load_errors.page_for(&site.id).is_some(),
                })
            })
            .collect();
        let script = format!(
            "window.__sitedeck_render&&window.__sitedeck_render({})",
            serde_json::Value::Array(sites)
        );
        if let Err(e) = self.rail.evaluate_script(&script) {
            log::warn!("failed to update the site rail: {}", e);
        }
    }

    fn render_overlay(&self, app: &App) {
        let page = app
            .tab_manager
            .active_tab()
            .and_then(|tab| app.load_errors.page_for(tab.site_id()).map(|page| (tab, page)));
        match page {
            Some((tab, page)) => {
                let html = error_page_html(&page, &tab.site().name);
                if let Err(e) = self.overlay.load_html(&html) {
                    log::warn!("failed to show the error page: {}", e);
                }
                let _ = self.overlay.set_visible(true);
            }
            None => {
                let _ = self.overlay.set_visible(false);
            }
        }
    }

    fn on_event(&self, app: &App, event: &BusEvent) {
        match event {
            BusEvent::SiteDidStartLoading { site_id } => {
                self.loading.borrow_mut().insert(site_id.clone());
            }
            BusEvent::SiteDidFinishLoading { site_id } => {
                self.loading.borrow_mut().remove(site_id);
            }
            BusEvent::SiteIconRefreshRequested { .. } => {
                self.icon_generation.set(self.icon_generation.get() + 1);
            }
            _ => {}
        }
        self.render_rail(app);
        self.render_overlay(app);
    }

    fn layout(&self, window: &Window) {
        let _ = self.rail.set_bounds(rail_rect(window));
        let _ = self.overlay.set_bounds(content_bounds(window).rect());
    }
}

fn subscribe_chrome(app: &Rc<App>, chrome: &Rc<Chrome>) -> Vec<Subscription> {
    [
        Topic::SiteDidStartLoading,
        Topic::SiteDidFinishLoading,
        Topic::SiteDidFailLoading,
        Topic::TabsChanged,
        Topic::ActiveTabChanged,
        Topic::SiteIconRefreshRequested,
    ]
    .into_iter()
    .map(|topic| {
        let weak_app = Rc::downgrade(app);
        let weak_chrome = Rc::downgrade(chrome);
        app.ctx.bus.subscribe(topic, move |event| {
            if let (Some(app), Some(chrome)) = (weak_app.upgrade(), weak_chrome.upgrade()) {
                chrome.on_event(&app, event);
            }
        })
    })
    .collect()
}

// ─── Main entry point ───

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let event_loop: EventLoop<UserEvent> = EventLoopBuilder::with_user_event().build();
    let proxy: EventLoopProxy<UserEvent> = event_loop.create_proxy();

    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Sitedeck")
            .with_inner_size(tao::dpi::LogicalSize::new(1280.0, 800.0))
            .build(&event_loop)?,
    );

    let rail_proxy = proxy.clone();
    let rail = WebViewBuilder::new()
        .with_html(RAIL_HTML)
        .with_bounds(rail_rect(&window))
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            if let Some(event) = handle_rail_ipc(msg.body()) {
                let _ = rail_proxy.send_event(event);
            }
        })
        .with_devtools(cfg!(debug_assertions))
        .build_as_child(&*window)?;

    let shell = WryShell::new(
        window.clone(),
        proxy.clone(),
        platform::get_data_dir().join("web"),
        content_bounds(&window),
    );

    // The shell's clock starts inside `App::new`.
    let started = Instant::now();
    let app = Rc::new(App::new(
        &AppPaths::platform_default(),
        Embedder {
            factory: shell.clone(),
            host: shell.clone(),
            opener: Rc::new(SystemOpener),
        },
    )?);

    // Created after the tab surfaces so it stacks above them.
    let overlay_proxy = proxy.clone();
    let overlay = WebViewBuilder::new()
        .with_html("<!DOCTYPE html><html><body></body></html>")
        .with_bounds(content_bounds(&window).rect())
        .with_visible(false)
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            if let Some(event) = handle_overlay_ipc(msg.body()) {
                let _ = overlay_proxy.send_event(event);
            }
        })
        .build_as_child(&*window)?;

    let chrome = Rc::new(Chrome {
        rail,
        overlay,
        loading: RefCell::new(HashSet::new()),
        icon_generation: Cell::new(0),
    });
    let subscriptions = subscribe_chrome(&app, &chrome);

    app.startup();

    event_loop.run(move |event, _, control_flow| {
        let _subscribed = &subscriptions;
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                app.shutdown();
                *control_flow = ControlFlow::Exit;
                return;
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                chrome.layout(&window);
                shell.layout(content_bounds(&window));
            }

            Event::UserEvent(user_event) => match user_event {
                UserEvent::Pump => chrome.render_rail(&app),
                UserEvent::SelectSite(id) => {
                    if let Err(e) = app.tab_manager.select_site(&id) {
                        log::warn!("{}", e);
                    }
                }
                UserEvent::SelectNext => app.tab_manager.select_next(),
                UserEvent::SelectPrevious => app.tab_manager.select_previous(),
                UserEvent::ResolveError { site_id, action } => {
                    if let Err(e) = app.load_errors.resolve(&site_id, action, &*app.tab_manager) {
                        log::warn!("{}", e);
                    }
                    chrome.render_overlay(&app);
                }
                UserEvent::Popup { surface, url } => shell.handle_popup(surface, url),
            },

            _ => {}
        }

        app.tick(started.elapsed());
        *control_flow = match app.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(started + deadline),
            None => ControlFlow::Wait,
        };
    });
}
