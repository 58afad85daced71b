//! In-place error pages for loads the surface reported as failed.
//!
//! The tracker remembers the latest failure per site until the user acts on
//! it or the site starts loading again.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::managers::tab_manager::TabManagerTrait;
use crate::services::context::ShellContext;
use crate::services::event_bus::Subscription;
use crate::types::errors::TabError;
use crate::types::events::{BusEvent, Topic};

/// A failed load shown in place of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadErrorPage {
    pub site_id: String,
    pub url: String,
    pub error: String,
}

/// What the user chose on an error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Retry,
    OpenExternally,
    Dismiss,
}

pub struct LoadErrorTracker {
    ctx: Rc<ShellContext>,
    pages: RefCell<BTreeMap<String, LoadErrorPage>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl LoadErrorTracker {
    pub fn new(ctx: Rc<ShellContext>) -> Rc<Self> {
        let tracker = Rc::new(Self {
            ctx,
            pages: RefCell::new(BTreeMap::new()),
            subscriptions: RefCell::new(Vec::new()),
        });

        let weak: Weak<Self> = Rc::downgrade(&tracker);
        let on_fail = tracker.ctx.bus.subscribe(Topic::SiteDidFailLoading, {
            let weak = weak.clone();
            move |event| {
                if let (Some(tracker), BusEvent::SiteDidFailLoading { site_id, url, error }) =
                    (weak.upgrade(), event)
                {
                    tracker.pages.borrow_mut().insert(
                        site_id.clone(),
                        LoadErrorPage {
                            site_id: site_id.clone(),
                            url: url.clone(),
                            error: error.clone(),
                        },
                    );
                }
            }
        });
        let on_start = tracker.ctx.bus.subscribe(Topic::SiteDidStartLoading, move |event| {
            if let (Some(tracker), Some(site_id)) = (weak.upgrade(), event.site_id()) {
                tracker.pages.borrow_mut().remove(site_id);
            }
        });
        tracker
            .subscriptions
            .borrow_mut()
            .extend([on_fail, on_start]);
        tracker
    }

    pub fn page_for(&self, site_id: &str) -> Option<LoadErrorPage> {
        self.pages.borrow().get(site_id).cloned()
    }

    pub fn pages(&self) -> Vec<LoadErrorPage> {
        self.pages.borrow().values().cloned().collect()
    }

    /// Applies `action` to the error page of `site_id`. Without a page this
    /// is a no-op. The page is kept when the action fails.
    pub fn resolve(
        &self,
        site_id: &str,
        action: ErrorAction,
        tabs: &dyn TabManagerTrait,
    ) -> Result<(), TabError> {
        let Some(page) = self.page_for(site_id) else {
            return Ok(());
        };
        match action {
            ErrorAction::Retry => {
                let tab = tabs
                    .tab_for_site(site_id)
                    .ok_or_else(|| TabError::NotFound(site_id.to_string()))?;
                self.pages.borrow_mut().remove(site_id);
                tab.load_in_place(&page.url);
            }
            ErrorAction::OpenExternally => {
                self.pages.borrow_mut().remove(site_id);
                self.ctx.open_external(&page.url);
            }
            ErrorAction::Dismiss => {
                self.pages.borrow_mut().remove(site_id);
            }
        }
        Ok(())
    }
}
