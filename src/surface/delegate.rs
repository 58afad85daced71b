//! Adapter from surface callbacks onto the event bus.
//!
//! Each surface gets its own delegate. When the surface is replaced or its
//! tab is torn down the delegate is disconnected and ignores late callbacks.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::managers::tab::Tab;
use crate::services::context::ShellContext;
use crate::services::navigation_policy;
use crate::types::events::BusEvent;
use crate::types::navigation::{
    FrameTarget, NavigationDecision, NavigationError, NavigationRequest, TelemetryEvent,
};

pub struct NavigationDelegate {
    site_id: String,
    ctx: Rc<ShellContext>,
    tab: Weak<Tab>,
    connected: Cell<bool>,
}

impl NavigationDelegate {
    pub fn new(site_id: &str, ctx: Rc<ShellContext>, tab: Weak<Tab>) -> Rc<Self> {
        Rc::new(Self {
            site_id: site_id.to_string(),
            ctx,
            tab,
            connected: Cell::new(true),
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    pub fn did_start_navigation(&self) {
        if !self.is_connected() {
            return;
        }
        self.ctx.bus.publish(BusEvent::SiteDidStartLoading {
            site_id: self.site_id.clone(),
        });
    }

    pub fn did_finish_navigation(&self) {
        if !self.is_connected() {
            return;
        }
        self.ctx.bus.publish(BusEvent::SiteDidFinishLoading {
            site_id: self.site_id.clone(),
        });
    }

    /// Publishes the failure (unless it is a cancellation) followed by a
    /// finish event so loading indicators stop.
    pub fn did_fail_navigation(&self, url: &str, error: &NavigationError) {
        if !self.is_connected() {
            return;
        }
        if error.is_cancellation() {
            log::debug!("[{}] navigation to {} cancelled", self.site_id, url);
        } else {
            log::info!("[{}] navigation to {} failed: {}", self.site_id, url, error);
            self.ctx.bus.publish(BusEvent::SiteDidFailLoading {
                site_id: self.site_id.clone(),
                url: url.to_string(),
                error: error.description.clone(),
            });
        }
        self.did_finish_navigation();
    }

    pub fn content_process_did_terminate(&self) {
        if !self.is_connected() {
            return;
        }
        let tab = self.tab.clone();
        self.ctx.main_loop.post(move || {
            if let Some(tab) = tab.upgrade() {
                tab.handle_content_process_terminated();
            }
        });
    }

    /// Returns whether the surface may proceed with `request` itself.
    pub fn decide_policy(&self, request: &NavigationRequest) -> bool {
        if !self.is_connected() {
            return false;
        }
        let Some(tab) = self.tab.upgrade() else {
            return false;
        };
        match navigation_policy::decide(tab.site(), request) {
            NavigationDecision::AllowInPlace if request.target == FrameTarget::NewWindow => {
                // Same-site popup: show it in this tab instead of a new window.
                let url = request.url.clone();
                let tab = self.tab.clone();
                self.ctx.main_loop.post(move || {
                    if let Some(tab) = tab.upgrade() {
                        tab.load_in_place(&url);
                    }
                });
                false
            }
            NavigationDecision::AllowInPlace => true,
            NavigationDecision::OpenExternally => {
                log::debug!("[{}] handing {} to the default browser", self.site_id, request.url);
                self.ctx.telemetry.record(TelemetryEvent::PolicyRedirect {
                    site_id: self.site_id.clone(),
                    url: request.url.clone(),
                });
                self.ctx.open_external(&request.url);
                false
            }
            NavigationDecision::Deny => false,
        }
    }
}
