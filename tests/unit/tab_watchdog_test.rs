//! Tests for the per-tab navigation watchdogs: pre-start, stuck, the final
//! watchdog after the recovery reload, and the external-browser fallback.

#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeMap;
use std::rc::Weak;

use common::{site, sites, Harness};
use sitedeck::managers::tab::Tab;
use sitedeck::managers::tab_manager::TabManagerTrait;
use sitedeck::services::kv_store::{last_url_key, KeyValueStore};
use sitedeck::surface::NavigableSurface;
use sitedeck::types::events::BusEvent;
use sitedeck::types::navigation::{
    FallbackReason, NavigationError, NavigationErrorKind, NavigationPhase, TelemetryEvent,
    WatchdogKind,
};
use sitedeck::types::settings::ShellSettings;

#[test]
fn test_only_active_tab_requests_its_start_url() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a", "b"]));

    assert_eq!(h.surface("a").loads(), vec!["https://www.a.com/".to_string()]);
    assert!(h.surface("b").loads().is_empty());

    let b = manager.tab(1).unwrap();
    assert_eq!(b.phase(), NavigationPhase::Idle);
    assert!(!b.has_requested_start());
    assert_eq!(b.armed_watchdog(), None);
}

#[test]
fn test_attach_arms_pre_start_watchdog() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();

    assert_eq!(tab.phase(), NavigationPhase::AwaitingStart);
    assert_eq!(tab.armed_watchdog(), Some(WatchdogKind::PreStart));
    assert!(!tab.is_navigating());
}

#[test]
fn test_attach_is_latched() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();

    tab.did_attach_to_window();
    tab.set_visible(false);
    tab.set_visible(true);

    assert_eq!(h.surface("a").loads().len(), 1);
}

#[test]
fn test_start_swaps_pre_start_for_stuck() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();

    h.surface("a").simulate_start();
    h.settle();

    assert_eq!(tab.phase(), NavigationPhase::InProgress);
    assert_eq!(tab.armed_watchdog(), Some(WatchdogKind::Stuck));
    assert!(tab.is_navigating());
}

#[test]
fn test_finish_reaches_terminal_and_disarms() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let surface = h.surface("a");

    surface.simulate_start();
    surface.simulate_finish(None);
    h.settle();

    assert_eq!(tab.phase(), NavigationPhase::Terminal);
    assert_eq!(tab.armed_watchdog(), None);
    assert!(!tab.is_navigating());

    h.advance_secs(120);
    assert!(h.opener.opened().is_empty());
    assert_eq!(surface.reload_count(), 0);
}

#[test]
fn test_pre_start_timeout_opens_externally_once() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();

    h.advance_secs(9);
    assert!(h.opener.opened().is_empty());

    h.advance_secs(1);
    assert_eq!(h.opener.opened(), vec!["https://www.a.com/".to_string()]);
    assert_eq!(tab.phase(), NavigationPhase::Terminal);
    assert_eq!(h.finishes_for("a"), 1);
    assert!(h.telemetry.events().contains(&TelemetryEvent::ExternalFallback {
        site_id: "a".to_string(),
        reason: FallbackReason::LoadNeverStarted,
    }));

    h.advance_secs(60);
    assert_eq!(h.opener.opened().len(), 1);
    assert_eq!(h.finishes_for("a"), 1);
}

#[test]
fn test_start_before_pre_start_deadline_prevents_fallback() {
    let h = Harness::new();
    let (_catalog, _manager) = h.manager(sites(&["a"]));

    h.advance_secs(9);
    h.surface("a").simulate_start();
    h.advance_secs(5);

    assert!(h.opener.opened().is_empty());
}

#[test]
fn test_stuck_navigation_reloads_once() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let surface = h.surface("a");

    surface.simulate_start();
    h.advance_secs(20);

    assert_eq!(tab.phase(), NavigationPhase::Recovering);
    assert_eq!(tab.armed_watchdog(), Some(WatchdogKind::Final));
    assert_eq!(surface.reload_count(), 1);
    assert_eq!(tab.reload_count(), 1);
    let telemetry = h.telemetry.events();
    assert!(telemetry.contains(&TelemetryEvent::NavigationStuck {
        site_id: "a".to_string()
    }));
    assert!(telemetry.contains(&TelemetryEvent::RecoveryReloadIssued {
        site_id: "a".to_string()
    }));
}

#[test]
fn test_finish_during_recovery_avoids_external_open() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let surface = h.surface("a");

    surface.simulate_start();
    h.advance_secs(20);
    surface.simulate_start();
    h.advance_secs(5);
    surface.simulate_finish(None);
    h.advance_secs(60);

    assert_eq!(tab.phase(), NavigationPhase::Terminal);
    assert!(h.opener.opened().is_empty());
    assert_eq!(surface.reload_count(), 1);
}

#[test]
fn test_final_watchdog_gives_up() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();

    h.surface("a").simulate_start();
    h.advance_secs(20);
    h.advance_secs(20);

    assert_eq!(tab.phase(), NavigationPhase::Terminal);
    assert!(!tab.is_navigating());
    assert_eq!(h.opener.opened(), vec!["https://www.a.com/".to_string()]);
    assert_eq!(h.finishes_for("a"), 1);
    assert!(h.telemetry.events().contains(&TelemetryEvent::ExternalFallback {
        site_id: "a".to_string(),
        reason: FallbackReason::LoadStuckAfterRecovery,
    }));
}

#[test]
fn test_redirect_start_does_not_extend_stuck_deadline() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let surface = h.surface("a");

    surface.simulate_start();
    h.advance_secs(15);
    surface.simulate_start();
    h.advance_secs(5);

    assert_eq!(tab.phase(), NavigationPhase::Recovering);
}

#[test]
fn test_stuck_watchdog_activates_its_tab() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a", "b"]));

    h.surface("a").simulate_start();
    h.settle();
    manager.set_active_index(1);
    h.surface("b").simulate_start();
    h.surface("b").simulate_finish(None);
    h.advance_secs(20);

    assert_eq!(manager.active_index(), 0);
    assert_eq!(h.surface("a").reload_count(), 1);
}

#[test]
fn test_diagnostic_mode_shortens_stuck_timeout() {
    let mut settings = ShellSettings::default();
    settings.watchdog.diagnostic_mode = true;
    let h = Harness::with_settings(settings);
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();

    h.surface("a").simulate_start();
    h.advance_secs(5);

    assert_eq!(tab.phase(), NavigationPhase::Recovering);
}

#[test]
fn test_restore_url_prefers_persisted_same_site_url() {
    let h = Harness::new();
    h.store
        .set(&last_url_key("a"), "https://mail.a.com/inbox")
        .unwrap();
    let (_catalog, _manager) = h.manager(sites(&["a"]));

    assert_eq!(h.surface("a").loads(), vec!["https://mail.a.com/inbox".to_string()]);
}

#[test]
fn test_restore_url_ignores_foreign_persisted_url() {
    let h = Harness::new();
    h.store.set(&last_url_key("a"), "https://evil.example/").unwrap();
    let (_catalog, _manager) = h.manager(sites(&["a"]));

    assert_eq!(h.surface("a").loads(), vec!["https://www.a.com/".to_string()]);
}

#[test]
fn test_finish_persists_same_site_url_only() {
    let h = Harness::new();
    let (_catalog, _manager) = h.manager(sites(&["a"]));
    let surface = h.surface("a");

    surface.simulate_start();
    surface.simulate_finish(Some("https://docs.a.com/page"));
    h.settle();
    assert_eq!(
        h.store.get(&last_url_key("a")).unwrap().as_deref(),
        Some("https://docs.a.com/page")
    );

    surface.simulate_start();
    surface.simulate_finish(Some("https://other.org/"));
    h.settle();
    assert_eq!(
        h.store.get(&last_url_key("a")).unwrap().as_deref(),
        Some("https://docs.a.com/page")
    );
}

#[test]
fn test_extra_headers_accompany_the_start_load() {
    let mut settings = ShellSettings::default();
    settings.tabs.extra_headers = BTreeMap::from([("X-Shell".to_string(), "sitedeck".to_string())]);
    let h = Harness::with_settings(settings);
    let (_catalog, _manager) = h.manager(sites(&["a"]));

    assert_eq!(
        h.surface("a").last_headers(),
        vec![("X-Shell".to_string(), "sitedeck".to_string())]
    );
}

#[test]
fn test_navigation_failure_publishes_fail_then_finish() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let surface = h.surface("a");
    h.clear_events();

    surface.simulate_start();
    surface.simulate_fail(
        "https://www.a.com/",
        NavigationError::new(NavigationErrorKind::HostNotFound, "host not found"),
    );
    h.settle();

    let events = h.events();
    let fail = events
        .iter()
        .position(|e| matches!(e, BusEvent::SiteDidFailLoading { .. }))
        .unwrap();
    let finish = events
        .iter()
        .position(|e| matches!(e, BusEvent::SiteDidFinishLoading { .. }))
        .unwrap();
    assert!(fail < finish);
    assert_eq!(tab.phase(), NavigationPhase::Terminal);
    assert!(!tab.is_navigating());
}

#[test]
fn test_cancelled_navigation_only_finishes() {
    let h = Harness::new();
    let (_catalog, _manager) = h.manager(sites(&["a"]));
    let surface = h.surface("a");
    h.clear_events();

    surface.simulate_start();
    surface.simulate_fail(
        "https://www.a.com/",
        NavigationError::new(NavigationErrorKind::Cancelled, "cancelled"),
    );
    h.settle();

    assert!(!h
        .events()
        .iter()
        .any(|e| matches!(e, BusEvent::SiteDidFailLoading { .. })));
    assert_eq!(h.finishes_for("a"), 1);
}

#[test]
fn test_events_for_other_sites_are_ignored() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a", "b"]));
    let a = manager.tab(0).unwrap();

    h.ctx.bus.publish(BusEvent::SiteDidStartLoading {
        site_id: "b".to_string(),
    });
    h.settle();

    assert_eq!(a.phase(), NavigationPhase::AwaitingStart);
    assert!(!a.is_navigating());
}

#[test]
fn test_icon_refresh_repeats_after_first_finish() {
    let mut settings = ShellSettings::default();
    settings.tabs.icon_refresh_interval_secs = 60;
    let h = Harness::with_settings(settings);
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let refresh = BusEvent::SiteIconRefreshRequested {
        site_id: "a".to_string(),
    };

    assert!(!tab.is_icon_refresh_armed());
    h.surface("a").simulate_start();
    h.surface("a").simulate_finish(None);
    h.settle();
    assert!(tab.is_icon_refresh_armed());

    h.advance_secs(60);
    assert_eq!(h.count_events(&refresh), 1);
    h.advance_secs(60);
    assert_eq!(h.count_events(&refresh), 2);
}

#[test]
fn test_icon_refresh_disabled_by_zero_interval() {
    let mut settings = ShellSettings::default();
    settings.tabs.icon_refresh_interval_secs = 0;
    let h = Harness::with_settings(settings);
    let (_catalog, manager) = h.manager(sites(&["a"]));

    h.surface("a").simulate_start();
    h.surface("a").simulate_finish(None);
    h.settle();

    assert!(!manager.active_tab().unwrap().is_icon_refresh_armed());
}

#[test]
fn test_teardown_cancels_timers_and_detaches() {
    let h = Harness::new();
    let (_catalog, manager) = h.manager(sites(&["a"]));
    let tab = manager.active_tab().unwrap();
    let surface = h.surface("a");

    surface.simulate_start();
    h.settle();
    tab.teardown();
    tab.teardown();

    assert!(tab.is_torn_down());
    assert_eq!(tab.armed_watchdog(), None);
    assert!(h.host.detached().contains(&surface.id()));
    assert!(!surface.delegate().is_connected());

    h.advance_secs(120);
    assert!(h.opener.opened().is_empty());
    assert_eq!(surface.reload_count(), 0);
}

#[test]
fn test_watchdog_for_unmanaged_tab_skips_reload() {
    let h = Harness::new();
    let tab = Tab::new(site("a"), h.ctx.clone(), Weak::new());
    tab.did_attach_to_window();
    h.surface("a").simulate_start();
    h.advance_secs(20);

    assert_eq!(tab.reload_count(), 0);
    assert_eq!(h.opener.opened(), vec!["https://www.a.com/".to_string()]);
    assert!(h.telemetry.events().contains(&TelemetryEvent::ExternalFallback {
        site_id: "a".to_string(),
        reason: FallbackReason::TabDetached,
    }));
}

#[test]
fn test_failing_opener_still_finishes() {
    let h = Harness::new();
    h.opener.set_failing(true);
    let (_catalog, manager) = h.manager(sites(&["a"]));

    h.advance_secs(10);

    assert_eq!(manager.active_tab().unwrap().phase(), NavigationPhase::Terminal);
    assert_eq!(h.finishes_for("a"), 1);
}
