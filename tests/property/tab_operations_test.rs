//! Property-based tests for Tab Manager operations.
//!
//! For any sequence of selections, catalog edits and content-process crashes
//! the tab list mirrors the catalog, the active index stays valid and is
//! persisted, and only the active surface is visible.

#[path = "../common/mod.rs"]
mod common;

use common::{sites, Harness};
use proptest::prelude::*;
use sitedeck::managers::site_catalog::{SiteCatalog, SiteCatalogTrait};
use sitedeck::managers::tab_manager::{TabManager, TabManagerTrait};
use sitedeck::services::kv_store::{KeyValueStore, LAST_ACTIVE_SITE_KEY};
use sitedeck::surface::NavigableSurface;
use sitedeck::types::events::BusEvent;

#[derive(Debug, Clone)]
enum TabOp {
    Select(usize),
    Next,
    Previous,
    Add,
    Remove(usize),
    Move(usize, usize),
    Crash(usize),
}

fn arb_tab_ops() -> impl Strategy<Value = Vec<TabOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0..12usize).prop_map(TabOp::Select),
            1 => Just(TabOp::Next),
            1 => Just(TabOp::Previous),
            2 => Just(TabOp::Add),
            2 => (0..12usize).prop_map(TabOp::Remove),
            2 => (0..12usize, 0..12usize).prop_map(|(from, to)| TabOp::Move(from, to)),
            2 => (0..12usize).prop_map(TabOp::Crash),
        ],
        1..40,
    )
}

fn site_at(catalog: &SiteCatalog, index: usize) -> Option<String> {
    let sites = catalog.sites();
    if sites.is_empty() {
        None
    } else {
        Some(sites[index % sites.len()].id.clone())
    }
}

fn apply(h: &Harness, catalog: &SiteCatalog, manager: &TabManager, op: &TabOp, added: &mut usize) {
    match op {
        TabOp::Select(index) => manager.set_active_index(*index),
        TabOp::Next => manager.select_next(),
        TabOp::Previous => manager.select_previous(),
        TabOp::Add => {
            *added += 1;
            catalog
                .add_site(
                    &format!("Site {}", added),
                    &format!("https://www.site{}.com/", added),
                    None,
                )
                .unwrap();
        }
        TabOp::Remove(index) => {
            if let Some(id) = site_at(catalog, *index) {
                catalog.remove_site(&id).unwrap();
            }
        }
        TabOp::Move(from, to) => {
            if let Some(id) = site_at(catalog, *from) {
                let target = to % catalog.sites().len();
                catalog.move_site(&id, target).unwrap();
            }
        }
        TabOp::Crash(index) => {
            if let Some(id) = site_at(catalog, *index) {
                h.surface(&id).simulate_crash();
            }
        }
    }
    h.settle();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn tabs_mirror_catalog_and_selection_is_persisted(ops in arb_tab_ops()) {
        let h = Harness::new();
        let (catalog, manager) = h.manager(sites(&["a", "b", "c"]));
        let mut added = 0usize;

        for op in &ops {
            apply(&h, &catalog, &manager, op, &mut added);

            let catalog_ids: Vec<String> = catalog.sites().into_iter().map(|s| s.id).collect();
            let tab_ids: Vec<String> = manager
                .tabs()
                .iter()
                .map(|tab| tab.site_id().to_string())
                .collect();
            prop_assert_eq!(&tab_ids, &catalog_ids, "after {:?}", op);

            let remembered = h.store.get(LAST_ACTIVE_SITE_KEY).unwrap();
            if tab_ids.is_empty() {
                prop_assert_eq!(manager.active_index(), 0);
                prop_assert!(manager.active_tab().is_none());
                prop_assert_eq!(remembered, None);
                continue;
            }

            let active = manager.active_index();
            prop_assert!(active < tab_ids.len());
            prop_assert_eq!(remembered.as_deref(), Some(tab_ids[active].as_str()));

            for (i, tab) in manager.tabs().iter().enumerate() {
                prop_assert_eq!(
                    tab.surface().is_hidden(),
                    i != active,
                    "tab {} visibility after {:?}",
                    i,
                    op
                );
            }
            prop_assert!(manager.active_tab().unwrap().has_requested_start());
        }
    }

    #[test]
    fn selecting_an_index_notifies_only_on_change(first in 0..5usize, second in 0..5usize) {
        let h = Harness::new();
        let (_catalog, manager) = h.manager(sites(&["a", "b", "c", "d", "e"]));
        h.clear_events();

        manager.set_active_index(first);
        h.settle();
        let after_first = h.count_events(&BusEvent::ActiveTabChanged);
        manager.set_active_index(second);
        h.settle();
        let after_second = h.count_events(&BusEvent::ActiveTabChanged);

        prop_assert_eq!(after_first, usize::from(first != 0));
        prop_assert_eq!(after_second - after_first, usize::from(second != first));
    }
}
