use serde::{Deserialize, Serialize};

use crate::services::domain;

/// A configured site: one rail icon, one tab.
///
/// Equality is by `id` only; two entries with the same id are the same site
/// even if their display data differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl SiteConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Canonical host of the site's URL (lower-cased, `www.` stripped).
    pub fn canonical_host(&self) -> Option<String> {
        domain::canonical_host(&self.url)
    }

    /// Whether `url` belongs to this site for navigation-scoping purposes.
    pub fn matches_url(&self, url: &str) -> bool {
        domain::urls_share_site(&self.url, url)
    }
}

impl PartialEq for SiteConfig {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SiteConfig {}

/// On-disk shape of the site catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogFile {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}
