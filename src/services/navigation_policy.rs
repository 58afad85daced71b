//! Per-tab domain scoping.
//!
//! Only the owning site's domain loads in place. User-initiated navigations
//! and popups to anything else are cancelled and opened in the default
//! browser.

use crate::services::domain;
use crate::types::navigation::{
    FrameTarget, NavigationDecision, NavigationKind, NavigationRequest,
};
use crate::types::site::SiteConfig;

pub fn decide(site: &SiteConfig, request: &NavigationRequest) -> NavigationDecision {
    let url = request.url.as_str();

    if request.target == FrameTarget::SubFrame {
        return NavigationDecision::AllowInPlace;
    }

    if domain::is_internal_scheme(url) {
        return if request.target == FrameTarget::NewWindow {
            NavigationDecision::Deny
        } else {
            NavigationDecision::AllowInPlace
        };
    }

    if !domain::is_web_scheme(url) {
        // mailto:, tel:, app deep links.
        return NavigationDecision::OpenExternally;
    }

    if site.matches_url(url) {
        return NavigationDecision::AllowInPlace;
    }

    if request.kind.is_user_initiated() || request.target == FrameTarget::NewWindow {
        return NavigationDecision::OpenExternally;
    }

    // Redirects and script navigations (sign-in flows) stay in place.
    NavigationDecision::AllowInPlace
}

/// Last link click or form submission a page reported, for engines whose
/// navigation callback only sees the target URL.
///
/// The next navigation to the recorded URL is classified with the recorded
/// kind and consumes the gesture; anything else is `Other`.
#[derive(Debug, Default)]
pub struct GestureTracker {
    pending: Option<(String, NavigationKind)>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier gesture.
    pub fn record(&mut self, url: &str, kind: NavigationKind) {
        self.pending = Some((normalize(url), kind));
    }

    pub fn classify(&mut self, url: &str) -> NavigationKind {
        match self.pending.take() {
            Some((pending, kind)) if pending == normalize(url) => kind,
            other => {
                self.pending = other;
                NavigationKind::Other
            }
        }
    }
}

fn normalize(url: &str) -> String {
    match url::Url::parse(url.trim()) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.trim().to_string(),
    }
}
