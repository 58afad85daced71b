use std::fmt;

/// Where a tab is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    /// No load has ever been requested.
    Idle,
    /// Load requested, no start event yet.
    AwaitingStart,
    /// Start event observed.
    InProgress,
    /// The stuck watchdog fired once and a reload was issued.
    Recovering,
    /// Finished, or handed to the external browser.
    Terminal,
}

/// Which navigation watchdog currently occupies a tab's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogKind {
    PreStart,
    Stuck,
    /// Second stuck watchdog, armed after the recovery reload.
    Final,
    /// One-shot armed after a content-process crash.
    CrashRecovery,
    IconRefresh,
}

/// Why a load was handed to the external browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    LoadNeverStarted,
    LoadStuckAfterRecovery,
    CrashRecoveryFailed,
    /// Watchdog fired for a tab the tab manager no longer knows about.
    TabDetached,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::LoadNeverStarted => write!(f, "load never started"),
            FallbackReason::LoadStuckAfterRecovery => write!(f, "load stuck after recovery"),
            FallbackReason::CrashRecoveryFailed => write!(f, "crash recovery failed"),
            FallbackReason::TabDetached => write!(f, "tab detached"),
        }
    }
}

/// How a navigation was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    LinkActivated,
    FormSubmitted,
    BackForward,
    Reload,
    Redirect,
    Other,
}

impl NavigationKind {
    pub fn is_user_initiated(self) -> bool {
        matches!(self, NavigationKind::LinkActivated | NavigationKind::FormSubmitted)
    }
}

/// Which frame a navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTarget {
    MainFrame,
    SubFrame,
    /// `window.open` / `target=_blank`.
    NewWindow,
}

/// A navigation the surface asks permission for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub kind: NavigationKind,
    pub target: FrameTarget,
}

impl NavigationRequest {
    pub fn new(url: impl Into<String>, kind: NavigationKind, target: FrameTarget) -> Self {
        Self {
            url: url.into(),
            kind,
            target,
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self::new(url, NavigationKind::LinkActivated, FrameTarget::MainFrame)
    }
}

/// Outcome of the per-tab navigation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    AllowInPlace,
    /// Cancel in place and hand the URL to the default browser.
    OpenExternally,
    /// Cancel without opening anything.
    Deny,
}

/// Category of a load failure reported by the surface itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationErrorKind {
    /// Superseded by another navigation or cancelled by policy.
    Cancelled,
    HostNotFound,
    Tls,
    TimedOut,
    Offline,
    Other,
}

/// A load failure as reported by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationError {
    pub kind: NavigationErrorKind,
    pub description: String,
}

impl NavigationError {
    pub fn new(kind: NavigationErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind == NavigationErrorKind::Cancelled
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Events recorded for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    NavigationStuck { site_id: String },
    RecoveryReloadIssued { site_id: String },
    ExternalFallback { site_id: String, reason: FallbackReason },
    ContentProcessTerminated { site_id: String },
    PolicyRedirect { site_id: String, url: String },
}
