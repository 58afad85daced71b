use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::managers::site_catalog::{SiteCatalog, SiteCatalogTrait};
use crate::managers::tab::Tab;
use crate::services::context::ShellContext;
use crate::services::event_bus::Subscription;
use crate::services::kv_store::LAST_ACTIVE_SITE_KEY;
use crate::types::errors::TabError;
use crate::types::events::{BusEvent, Topic};

/// Trait defining the tab management interface.
pub trait TabManagerTrait {
    fn tabs(&self) -> Vec<Rc<Tab>>;
    fn tab_count(&self) -> usize;
    fn tab(&self, index: usize) -> Option<Rc<Tab>>;
    fn active_index(&self) -> usize;
    fn active_tab(&self) -> Option<Rc<Tab>>;
    fn set_active_index(&self, index: usize);
    fn select_site(&self, site_id: &str) -> Result<(), TabError>;
    fn select_next(&self);
    fn select_previous(&self);
    fn index_of(&self, site_id: &str) -> Option<usize>;
    fn tab_for_site(&self, site_id: &str) -> Option<Rc<Tab>>;
    fn rebuild(&self);
}

struct ManagerState {
    tabs: Vec<Rc<Tab>>,
    active_index: usize,
    suppress_notifications: bool,
    deferred: Vec<BusEvent>,
}

/// Owns one tab per catalog site, in catalog order, and the active selection.
///
/// The tab list is rebuilt wholesale whenever the catalog changes, which also
/// restarts navigation state for every tab.
pub struct TabManager {
    ctx: Rc<ShellContext>,
    catalog: Rc<SiteCatalog>,
    me: Weak<TabManager>,
    state: RefCell<ManagerState>,
    sites_subscription: RefCell<Option<Subscription>>,
}

impl TabManager {
    /// Builds the tab list, restores the last active site and starts following
    /// catalog changes. Change notifications raised while constructing are
    /// published once, after construction.
    pub fn new(ctx: Rc<ShellContext>, catalog: Rc<SiteCatalog>) -> Rc<Self> {
        let manager = Rc::new_cyclic(|me| Self {
            ctx,
            catalog,
            me: me.clone(),
            state: RefCell::new(ManagerState {
                tabs: Vec::new(),
                active_index: 0,
                suppress_notifications: true,
                deferred: Vec::new(),
            }),
            sites_subscription: RefCell::new(None),
        });

        manager.replace_tabs();
        manager.restore_active_selection();
        manager.apply_visibility();
        manager.persist_active();
        manager.notify(BusEvent::TabsChanged);
        manager.notify(BusEvent::ActiveTabChanged);

        let weak = Rc::downgrade(&manager);
        let subscription = manager.ctx.bus.subscribe(Topic::SitesChanged, move |_| {
            if let Some(manager) = weak.upgrade() {
                manager.rebuild();
            }
        });
        *manager.sites_subscription.borrow_mut() = Some(subscription);

        manager.end_suppression();
        manager
    }

    fn notify(&self, event: BusEvent) {
        let mut state = self.state.borrow_mut();
        if state.suppress_notifications {
            if !state.deferred.contains(&event) {
                state.deferred.push(event);
            }
            return;
        }
        drop(state);
        self.ctx.bus.publish(event);
    }

    fn end_suppression(&self) {
        let deferred = {
            let mut state = self.state.borrow_mut();
            state.suppress_notifications = false;
            std::mem::take(&mut state.deferred)
        };
        for event in deferred {
            self.ctx.bus.publish(event);
        }
    }

    /// Tears down every tab and creates a fresh one per catalog site. The
    /// previously active site stays selected when it survives.
    fn replace_tabs(&self) {
        let (old_tabs, previous_site, previous_index) = {
            let mut state = self.state.borrow_mut();
            let previous_site = state
                .tabs
                .get(state.active_index)
                .map(|tab| tab.site_id().to_string());
            (
                std::mem::take(&mut state.tabs),
                previous_site,
                state.active_index,
            )
        };
        for tab in &old_tabs {
            tab.teardown();
        }
        drop(old_tabs);

        let tabs: Vec<Rc<Tab>> = self
            .catalog
            .sites()
            .into_iter()
            .map(|site| Tab::new(site, self.ctx.clone(), self.me.clone()))
            .collect();

        let index = previous_site
            .and_then(|id| tabs.iter().position(|tab| tab.site_id() == id))
            .unwrap_or(previous_index);

        let mut state = self.state.borrow_mut();
        state.active_index = if index < tabs.len() { index } else { 0 };
        state.tabs = tabs;
        log::debug!(
            "rebuilt {} tabs, active index {}",
            state.tabs.len(),
            state.active_index
        );
    }

    fn restore_active_selection(&self) {
        let remembered = self.ctx.read_value(LAST_ACTIVE_SITE_KEY);
        let index = remembered
            .as_deref()
            .and_then(|id| self.index_of(id))
            .unwrap_or(0);
        if let Some(id) = remembered.as_deref() {
            if self.index_of(id).is_none() {
                log::info!("last active site {} is gone, selecting the first tab", id);
            }
        }
        self.state.borrow_mut().active_index = index;
    }

    /// Shows the active tab's surface and hides the rest.
    fn apply_visibility(&self) {
        let (tabs, active) = {
            let state = self.state.borrow();
            (state.tabs.clone(), state.active_index)
        };
        for (i, tab) in tabs.iter().enumerate() {
            if i != active {
                tab.set_visible(false);
            }
        }
        if let Some(tab) = tabs.get(active) {
            tab.set_visible(true);
        }
    }

    fn persist_active(&self) {
        match self.active_tab() {
            Some(tab) => self.ctx.write_value(LAST_ACTIVE_SITE_KEY, tab.site_id()),
            None => self.ctx.remove_value(LAST_ACTIVE_SITE_KEY),
        }
    }
}

impl TabManagerTrait for TabManager {
    fn tabs(&self) -> Vec<Rc<Tab>> {
        self.state.borrow().tabs.clone()
    }

    fn tab_count(&self) -> usize {
        self.state.borrow().tabs.len()
    }

    fn tab(&self, index: usize) -> Option<Rc<Tab>> {
        self.state.borrow().tabs.get(index).cloned()
    }

    fn active_index(&self) -> usize {
        self.state.borrow().active_index
    }

    fn active_tab(&self) -> Option<Rc<Tab>> {
        let state = self.state.borrow();
        state.tabs.get(state.active_index).cloned()
    }

    /// Selects the tab at `index`. Out-of-range indexes are ignored.
    fn set_active_index(&self, index: usize) {
        {
            let mut state = self.state.borrow_mut();
            if index >= state.tabs.len() || index == state.active_index {
                return;
            }
            state.active_index = index;
        }
        self.apply_visibility();
        self.persist_active();
        self.notify(BusEvent::ActiveTabChanged);
    }

    fn select_site(&self, site_id: &str) -> Result<(), TabError> {
        let index = self
            .index_of(site_id)
            .ok_or_else(|| TabError::NotFound(site_id.to_string()))?;
        self.set_active_index(index);
        Ok(())
    }

    fn select_next(&self) {
        let count = self.tab_count();
        if count > 0 {
            self.set_active_index((self.active_index() + 1) % count);
        }
    }

    fn select_previous(&self) {
        let count = self.tab_count();
        if count > 0 {
            self.set_active_index((self.active_index() + count - 1) % count);
        }
    }

    fn index_of(&self, site_id: &str) -> Option<usize> {
        self.state
            .borrow()
            .tabs
            .iter()
            .position(|tab| tab.site_id() == site_id)
    }

    fn tab_for_site(&self, site_id: &str) -> Option<Rc<Tab>> {
        self.state
            .borrow()
            .tabs
            .iter()
            .find(|tab| tab.site_id() == site_id)
            .cloned()
    }

    fn rebuild(&self) {
        self.replace_tabs();
        self.apply_visibility();
        self.persist_active();
        self.notify(BusEvent::TabsChanged);
        self.notify(BusEvent::ActiveTabChanged);
    }
}

impl Drop for TabManager {
    fn drop(&mut self) {
        let tabs = std::mem::take(&mut self.state.borrow_mut().tabs);
        for tab in &tabs {
            tab.teardown();
        }
    }
}
