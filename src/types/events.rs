use std::fmt;

/// Every message carried by the event bus.
///
/// One variant per topic; payloads are checked at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    SiteDidStartLoading { site_id: String },
    SiteDidFinishLoading { site_id: String },
    SiteDidFailLoading {
        site_id: String,
        url: String,
        error: String,
    },
    TabsChanged,
    ActiveTabChanged,
    SitesChanged,
    /// Periodic tick asking the favicon code to refresh a site's icon.
    SiteIconRefreshRequested { site_id: String },
}

/// Subscription key for [`BusEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    SiteDidStartLoading,
    SiteDidFinishLoading,
    SiteDidFailLoading,
    TabsChanged,
    ActiveTabChanged,
    SitesChanged,
    SiteIconRefreshRequested,
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::SiteDidStartLoading { .. } => Topic::SiteDidStartLoading,
            BusEvent::SiteDidFinishLoading { .. } => Topic::SiteDidFinishLoading,
            BusEvent::SiteDidFailLoading { .. } => Topic::SiteDidFailLoading,
            BusEvent::TabsChanged => Topic::TabsChanged,
            BusEvent::ActiveTabChanged => Topic::ActiveTabChanged,
            BusEvent::SitesChanged => Topic::SitesChanged,
            BusEvent::SiteIconRefreshRequested { .. } => Topic::SiteIconRefreshRequested,
        }
    }

    /// The site this event is tagged with, if any.
    pub fn site_id(&self) -> Option<&str> {
        match self {
            BusEvent::SiteDidStartLoading { site_id }
            | BusEvent::SiteDidFinishLoading { site_id }
            | BusEvent::SiteDidFailLoading { site_id, .. }
            | BusEvent::SiteIconRefreshRequested { site_id } => Some(site_id),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::SiteDidStartLoading => "site-did-start-loading",
            Topic::SiteDidFinishLoading => "site-did-finish-loading",
            Topic::SiteDidFailLoading => "site-did-fail-loading",
            Topic::TabsChanged => "tabs-changed",
            Topic::ActiveTabChanged => "active-tab-changed",
            Topic::SitesChanged => "sites-changed",
            Topic::SiteIconRefreshRequested => "site-icon-refresh-requested",
        };
        f.write_str(name)
    }
}
