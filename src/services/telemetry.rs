//! Diagnostic event recording.

use crate::types::navigation::TelemetryEvent;

pub trait Telemetry {
    fn record(&self, event: TelemetryEvent);
}

/// Writes telemetry events to the log.
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn record(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::NavigationStuck { site_id } => {
                log::info!(target: "telemetry", "navigation_stuck site={}", site_id)
            }
            TelemetryEvent::RecoveryReloadIssued { site_id } => {
                log::info!(target: "telemetry", "recovery_reload site={}", site_id)
            }
            TelemetryEvent::ExternalFallback { site_id, reason } => {
                log::info!(target: "telemetry", "external_fallback site={} reason={}", site_id, reason)
            }
            TelemetryEvent::ContentProcessTerminated { site_id } => {
                log::info!(target: "telemetry", "content_process_terminated site={}", site_id)
            }
            TelemetryEvent::PolicyRedirect { site_id, url } => {
                log::info!(target: "telemetry", "policy_redirect site={} url={}", site_id, url)
            }
        }
    }
}
