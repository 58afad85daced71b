//! Single-owner timer slots.
//!
//! A slot holds at most one armed timer. Arming replaces the previous timer,
//! and the replaced [`TimerHandle`] cancels itself on drop.

use crate::runtime::TimerHandle;
use crate::types::navigation::WatchdogKind;

#[derive(Debug, Default)]
pub struct WatchdogSlot {
    armed: Option<(WatchdogKind, TimerHandle)>,
}

impl WatchdogSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `handle` as `kind`, cancelling whatever was armed before.
    pub fn arm(&mut self, kind: WatchdogKind, handle: TimerHandle) {
        self.armed = Some((kind, handle));
    }

    /// Cancels the armed timer. Returns whether one was live.
    pub fn disarm(&mut self) -> bool {
        match self.armed.take() {
            Some((_, handle)) => {
                let was_live = handle.is_pending();
                handle.cancel();
                was_live
            }
            None => false,
        }
    }

    /// Kind of the live timer, if any.
    pub fn kind(&self) -> Option<WatchdogKind> {
        self.armed
            .as_ref()
            .filter(|(_, handle)| handle.is_pending())
            .map(|(kind, _)| *kind)
    }

    pub fn is_armed(&self) -> bool {
        self.kind().is_some()
    }

    /// Forgets a timer that has already fired, without touching newer state.
    pub fn clear_if(&mut self, kind: WatchdogKind) {
        if matches!(self.armed, Some((armed, _)) if armed == kind) {
            self.armed = None;
        }
    }
}
