//! Property-based tests for the per-tab navigation watchdog.
//!
//! Arbitrary interleavings of engine callbacks and clock advances must keep
//! the tab's phase, its armed watchdog and its published events consistent.

#[path = "../common/mod.rs"]
mod common;

use common::{sites, Harness};
use proptest::prelude::*;
use sitedeck::managers::tab_manager::TabManagerTrait;
use sitedeck::types::navigation::{
    NavigationError, NavigationErrorKind, NavigationPhase, WatchdogKind,
};

/// Engine callbacks and clock movement for a single visible tab.
#[derive(Debug, Clone)]
enum NavOp {
    Start,
    Finish,
    Fail { cancelled: bool },
    Advance(u64),
}

fn arb_nav_ops() -> impl Strategy<Value = Vec<NavOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(NavOp::Start),
            2 => Just(NavOp::Finish),
            1 => any::<bool>().prop_map(|cancelled| NavOp::Fail { cancelled }),
            4 => (0..25u64).prop_map(NavOp::Advance),
        ],
        1..40,
    )
}

fn expected_watchdog(phase: NavigationPhase) -> Option<WatchdogKind> {
    match phase {
        NavigationPhase::AwaitingStart => Some(WatchdogKind::PreStart),
        NavigationPhase::InProgress => Some(WatchdogKind::Stuck),
        NavigationPhase::Recovering => Some(WatchdogKind::Final),
        NavigationPhase::Idle | NavigationPhase::Terminal => None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn watchdog_state_stays_consistent(ops in arb_nav_ops()) {
        let h = Harness::new();
        let (_catalog, manager) = h.manager(sites(&["a"]));
        let tab = manager.active_tab().unwrap();
        let surface = h.surface("a");

        let mut starts = 0u32;
        let mut delegate_finishes = 0usize;

        for op in &ops {
            match op {
                NavOp::Start => {
                    surface.simulate_start();
                    starts += 1;
                }
                NavOp::Finish => {
                    surface.simulate_finish(None);
                    delegate_finishes += 1;
                }
                NavOp::Fail { cancelled } => {
                    let kind = if *cancelled {
                        NavigationErrorKind::Cancelled
                    } else {
                        NavigationErrorKind::TimedOut
                    };
                    surface.simulate_fail("https://www.a.com/", NavigationError::new(kind, "failed"));
                    delegate_finishes += 1;
                }
                NavOp::Advance(secs) => h.advance_secs(*secs),
            }
            h.settle();

            let phase = tab.phase();
            match phase {
                NavigationPhase::Terminal => prop_assert!(!tab.is_navigating(), "after {:?}", op),
                NavigationPhase::InProgress | NavigationPhase::Recovering => {
                    prop_assert!(tab.is_navigating(), "after {:?}", op)
                }
                _ => {}
            }
            prop_assert_ne!(phase, NavigationPhase::Idle);
            prop_assert_eq!(tab.armed_watchdog(), expected_watchdog(phase), "phase {:?}", phase);

            prop_assert!(tab.reload_count() <= starts);
            prop_assert!(tab.external_fallback_count() <= starts + 1);

            let fallbacks = h.fallbacks();
            prop_assert_eq!(fallbacks, tab.external_fallback_count() as usize);
            prop_assert_eq!(h.opener.opened().len(), fallbacks);
            prop_assert_eq!(h.finishes_for("a"), delegate_finishes + fallbacks);
        }
    }

    #[test]
    fn a_load_that_never_starts_always_falls_back_once(wait in 10..120u64) {
        let h = Harness::new();
        let (_catalog, manager) = h.manager(sites(&["a"]));

        h.advance_secs(wait);

        let tab = manager.active_tab().unwrap();
        prop_assert_eq!(tab.phase(), NavigationPhase::Terminal);
        prop_assert_eq!(h.opener.opened(), vec!["https://www.a.com/".to_string()]);
        prop_assert_eq!(h.finishes_for("a"), 1);
    }
}
