//! Per-site tab: one navigable surface plus its load watchdogs.
//!
//! A tab loads its start URL the first time it becomes visible, then tracks
//! the load through the bus events tagged with its site ID:
//!
//! ```text
//! Idle -> AwaitingStart -> InProgress -> Terminal
//!              |               |             ^
//!              |               v             |
//!              |           Recovering -------+
//!              +-----------------------------+
//! ```
//!
//! A load that never starts, or that is still stuck after one in-place
//! reload, is handed to the default browser and a synthetic finish event is
//! published so loading indicators stop. A content-process crash replaces the
//! surface with a fresh one and gets a single short watchdog of its own.
//!
//! Every callback runs on the main loop and re-checks the state it expects
//! before acting, so a timer that outlived its transition is a no-op.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::runtime::{TimerHandle, WatchdogSlot};
use crate::services::context::ShellContext;
use crate::services::event_bus::Subscription;
use crate::services::kv_store::last_url_key;
use crate::surface::{
    NavigableSurface, NavigationDelegate, ScriptBinding, StorageContext, SurfaceRequest,
};
use crate::types::events::{BusEvent, Topic};
use crate::types::navigation::{FallbackReason, NavigationPhase, TelemetryEvent, WatchdogKind};
use crate::types::site::SiteConfig;

struct TabState {
    surface: Rc<dyn NavigableSurface>,
    delegate: Rc<NavigationDelegate>,
    start_requested: bool,
    in_progress: bool,
    phase: NavigationPhase,
    /// Pre-start, stuck or final watchdog; at most one at a time.
    navigation_watchdog: WatchdogSlot,
    recovery_watchdog: WatchdogSlot,
    icon_refresh: WatchdogSlot,
    reload_count: u32,
    external_fallbacks: u32,
    subscriptions: Vec<Subscription>,
    torn_down: bool,
}

pub struct Tab {
    site: SiteConfig,
    ctx: Rc<ShellContext>,
    manager: Weak<TabManager>,
    me: Weak<Tab>,
    state: RefCell<TabState>,
}

impl Tab {
    /// Creates the tab and its surface. The surface starts hidden and nothing
    /// is loaded until [`Tab::did_attach_to_window`].
    pub fn new(site: SiteConfig, ctx: Rc<ShellContext>, manager: Weak<TabManager>) -> Rc<Tab> {
        Rc::new_cyclic(|me: &Weak<Tab>| {
            let delegate = NavigationDelegate::new(&site.id, ctx.clone(), me.clone());
            let surface = ctx.factory.create(
                SurfaceRequest {
                    site: site.clone(),
                    storage: StorageContext::persistent(&site.id),
                },
                delegate.clone(),
            );
            surface.install_bindings(&ScriptBinding::ALL);
            surface.set_hidden(true);
            ctx.host.attach(&surface, None);

            let subscriptions = vec![
                Self::subscribe(&ctx, me, Topic::SiteDidStartLoading, Tab::on_start),
                Self::subscribe(&ctx, me, Topic::SiteDidFinishLoading, Tab::on_finish),
            ];

            Tab {
                site,
                ctx,
                manager,
                me: me.clone(),
                state: RefCell::new(TabState {
                    surface,
                    delegate,
                    start_requested: false,
                    in_progress: false,
                    phase: NavigationPhase::Idle,
                    navigation_watchdog: WatchdogSlot::new(),
                    recovery_watchdog: WatchdogSlot::new(),
                    icon_refresh: WatchdogSlot::new(),
                    reload_count: 0,
                    external_fallbacks: 0,
                    subscriptions,
                    torn_down: false,
                }),
            }
        })
    }

    fn subscribe(
        ctx: &ShellContext,
        me: &Weak<Tab>,
        topic: Topic,
        handler: fn(&Tab),
    ) -> Subscription {
        let me = me.clone();
        ctx.bus.subscribe(topic, move |event| {
            if let Some(tab) = me.upgrade() {
                if event.site_id() == Some(tab.site.id.as_str()) {
                    handler(&tab);
                }
            }
        })
    }

    fn schedule(&self, delay: Duration, handler: fn(&Tab)) -> TimerHandle {
        let me = self.me.clone();
        self.ctx.main_loop.schedule(delay, move || {
            if let Some(tab) = me.upgrade() {
                handler(&tab);
            }
        })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn site_id(&self) -> &str {
        &self.site.id
    }

    pub fn surface(&self) -> Rc<dyn NavigableSurface> {
        self.state.borrow().surface.clone()
    }

    pub fn phase(&self) -> NavigationPhase {
        self.state.borrow().phase
    }

    /// True iff a start event was seen without a matching finish.
    pub fn is_navigating(&self) -> bool {
        self.state.borrow().in_progress
    }

    pub fn has_requested_start(&self) -> bool {
        self.state.borrow().start_requested
    }

    /// The navigation or crash-recovery watchdog currently armed.
    pub fn armed_watchdog(&self) -> Option<WatchdogKind> {
        let state = self.state.borrow();
        state
            .navigation_watchdog
            .kind()
            .or_else(|| state.recovery_watchdog.kind())
    }

    pub fn is_icon_refresh_armed(&self) -> bool {
        self.state.borrow().icon_refresh.is_armed()
    }

    /// In-place recovery reloads issued so far.
    pub fn reload_count(&self) -> u32 {
        self.state.borrow().reload_count
    }

    pub fn external_fallback_count(&self) -> u32 {
        self.state.borrow().external_fallbacks
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }

    /// Shows or hides the surface. The first time the tab becomes visible it
    /// starts loading.
    pub fn set_visible(&self, visible: bool) {
        let surface = self.surface();
        surface.set_hidden(!visible);
        if visible {
            self.did_attach_to_window();
        }
    }

    /// `Idle -> AwaitingStart`, at most once per tab.
    pub fn did_attach_to_window(&self) {
        let (surface, url) = {
            let mut state = self.state.borrow_mut();
            if state.start_requested || state.torn_down {
                return;
            }
            state.start_requested = true;
            state.phase = NavigationPhase::AwaitingStart;
            let handle = self.schedule(
                self.ctx.settings.watchdog.pre_start_timeout(),
                Tab::on_pre_start_timeout,
            );
            state.navigation_watchdog.arm(WatchdogKind::PreStart, handle);
            (state.surface.clone(), self.restore_url())
        };
        log::debug!("[{}] loading {}", self.site.id, url);
        surface.load(&url, &self.ctx.settings.tabs.header_pairs());
    }

    /// Loads `url` in the current surface without touching watchdog state;
    /// the resulting start event arms the stuck watchdog.
    pub fn load_in_place(&self, url: &str) {
        if self.is_torn_down() {
            return;
        }
        let surface = self.surface();
        surface.load(url, &self.ctx.settings.tabs.header_pairs());
    }

    /// Last visited URL when it still belongs to the site, else the site URL.
    pub fn restore_url(&self) -> String {
        match self.ctx.read_value(&last_url_key(&self.site.id)) {
            Some(url) if self.site.matches_url(&url) => url,
            _ => self.site.url.clone(),
        }
    }

    fn index_in_manager(&self) -> Option<usize> {
        self.manager.upgrade()?.index_of(&self.site.id)
    }

    fn on_start(&self) {
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            return;
        }
        state.in_progress = true;
        match state.phase {
            NavigationPhase::Idle | NavigationPhase::AwaitingStart | NavigationPhase::Terminal => {
                state.phase = NavigationPhase::InProgress;
                let handle = self.schedule(
                    self.ctx.settings.watchdog.stuck_timeout(),
                    Tab::on_stuck_timeout,
                );
                state.navigation_watchdog.arm(WatchdogKind::Stuck, handle);
                log::debug!("[{}] navigation started", self.site.id);
            }
            // Redirects, or the start of the recovery reload.
            NavigationPhase::InProgress | NavigationPhase::Recovering => {}
        }
    }

    fn on_finish(&self) {
        let surface = {
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.in_progress = false;
            state.navigation_watchdog.disarm();
            state.recovery_watchdog.disarm();
            if state.phase != NavigationPhase::Terminal {
                log::debug!("[{}] navigation finished", self.site.id);
            }
            state.phase = NavigationPhase::Terminal;
            if !state.icon_refresh.is_armed() {
                if let Some(interval) = self.ctx.settings.tabs.icon_refresh_interval() {
                    let handle = self.schedule(interval, Tab::on_icon_refresh);
                    state.icon_refresh.arm(WatchdogKind::IconRefresh, handle);
                }
            }
            state.surface.clone()
        };
        if let Some(url) = surface.current_url() {
            if self.site.matches_url(&url) {
                self.ctx.write_value(&last_url_key(&self.site.id), &url);
            }
        }
    }

    fn on_pre_start_timeout(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.navigation_watchdog.clear_if(WatchdogKind::PreStart);
            if state.torn_down
                || state.in_progress
                || state.phase != NavigationPhase::AwaitingStart
            {
                return;
            }
        }
        log::warn!("[{}] load never started", self.site.id);
        self.fall_back_to_external(FallbackReason::LoadNeverStarted);
    }

    fn on_stuck_timeout(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.navigation_watchdog.clear_if(WatchdogKind::Stuck);
            if state.torn_down
                || !state.in_progress
                || state.phase != NavigationPhase::InProgress
            {
                return;
            }
        }
        log::warn!("[{}] navigation stuck, reloading", self.site.id);
        self.ctx.telemetry.record(TelemetryEvent::NavigationStuck {
            site_id: self.site.id.clone(),
        });

        let Some(index) = self.index_in_manager() else {
            self.fall_back_to_external(FallbackReason::TabDetached);
            return;
        };
        if let Some(manager) = self.manager.upgrade() {
            manager.set_active_index(index);
        }

        let surface = {
            let mut state = self.state.borrow_mut();
            state.phase = NavigationPhase::Recovering;
            state.reload_count += 1;
            let handle = self.schedule(
                self.ctx.settings.watchdog.stuck_timeout(),
                Tab::on_final_timeout,
            );
            state.navigation_watchdog.arm(WatchdogKind::Final, handle);
            state.surface.clone()
        };
        surface.reload();
        self.ctx.telemetry.record(TelemetryEvent::RecoveryReloadIssued {
            site_id: self.site.id.clone(),
        });
    }

    fn on_final_timeout(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.navigation_watchdog.clear_if(WatchdogKind::Final);
            if state.torn_down
                || !state.in_progress
                || state.phase != NavigationPhase::Recovering
            {
                return;
            }
        }
        log::warn!("[{}] still stuck after reload", self.site.id);
        self.fall_back_to_external(FallbackReason::LoadStuckAfterRecovery);
    }

    fn on_icon_refresh(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.icon_refresh.clear_if(WatchdogKind::IconRefresh);
            if state.torn_down {
                return;
            }
            if let Some(interval) = self.ctx.settings.tabs.icon_refresh_interval() {
                let handle = self.schedule(interval, Tab::on_icon_refresh);
                state.icon_refresh.arm(WatchdogKind::IconRefresh, handle);
            }
        }
        self.ctx.bus.publish(BusEvent::SiteIconRefreshRequested {
            site_id: self.site.id.clone(),
        });
    }

    /// Opens the site URL externally and publishes a synthetic finish.
    fn fall_back_to_external(&self, reason: FallbackReason) {
        {
            let mut state = self.state.borrow_mut();
            state.in_progress = false;
            state.navigation_watchdog.disarm();
            state.recovery_watchdog.disarm();
            state.phase = NavigationPhase::Terminal;
            state.external_fallbacks += 1;
        }
        self.ctx.telemetry.record(TelemetryEvent::ExternalFallback {
            site_id: self.site.id.clone(),
            reason,
        });
        self.ctx.open_external(&self.site.url);
        self.ctx.bus.publish(BusEvent::SiteDidFinishLoading {
            site_id: self.site.id.clone(),
        });
    }

    /// Replaces a surface whose content process died.
    pub fn handle_content_process_terminated(&self) {
        if self.is_torn_down() {
            return;
        }
        log::warn!("[{}] content process terminated", self.site.id);
        self.ctx.telemetry.record(TelemetryEvent::ContentProcessTerminated {
            site_id: self.site.id.clone(),
        });

        if let (Some(manager), Some(index)) = (self.manager.upgrade(), self.index_in_manager()) {
            // Activation must not start the first load on the dead surface;
            // the replacement issues it below.
            self.state.borrow_mut().start_requested = true;
            manager.set_active_index(index);
        }

        let (old_surface, old_delegate) = {
            let state = self.state.borrow();
            (state.surface.clone(), state.delegate.clone())
        };
        old_delegate.disconnect();

        let delegate = NavigationDelegate::new(&self.site.id, self.ctx.clone(), self.me.clone());
        let surface = self.ctx.factory.create(
            SurfaceRequest {
                site: self.site.clone(),
                storage: StorageContext::fresh(),
            },
            delegate.clone(),
        );
        surface.install_bindings(&ScriptBinding::ALL);
        surface.set_hidden(old_surface.is_hidden());
        self.ctx.host.attach(&surface, Some(old_surface.id()));
        self.ctx.host.detach(old_surface.id());

        let should_load = {
            let mut state = self.state.borrow_mut();
            state.surface = surface.clone();
            state.delegate = delegate;
            state.in_progress = false;
            state.navigation_watchdog.disarm();
            if state.start_requested {
                state.phase = NavigationPhase::Terminal;
                let handle = self.schedule(
                    self.ctx.settings.watchdog.crash_recovery_timeout(),
                    Tab::on_crash_recovery_timeout,
                );
                state.recovery_watchdog.arm(WatchdogKind::CrashRecovery, handle);
            }
            state.start_requested
        };

        // A tab that was never shown stays idle until it is.
        if should_load {
            let url = self.restore_url();
            log::info!("[{}] restoring {} in a new surface", self.site.id, url);
            surface.load(&url, &self.ctx.settings.tabs.header_pairs());
        }
    }

    fn on_crash_recovery_timeout(&self) {
        let surface = {
            let mut state = self.state.borrow_mut();
            state.recovery_watchdog.clear_if(WatchdogKind::CrashRecovery);
            if state.torn_down {
                return;
            }
            state.surface.clone()
        };
        if surface.current_url().is_some() {
            return;
        }
        log::warn!("[{}] replacement surface never loaded", self.site.id);
        self.fall_back_to_external(FallbackReason::CrashRecoveryFailed);
    }

    /// Cancels every timer, drops every subscription and detaches the
    /// surface. Idempotent.
    pub fn teardown(&self) {
        let (surface, delegate, subscriptions) = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.navigation_watchdog.disarm();
            state.recovery_watchdog.disarm();
            state.icon_refresh.disarm();
            (
                state.surface.clone(),
                state.delegate.clone(),
                std::mem::take(&mut state.subscriptions),
            )
        };
        drop(subscriptions);
        delegate.disconnect();
        self.ctx.host.detach(surface.id());
        log::debug!("[{}] tab torn down", self.site.id);
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.teardown();
    }
}
