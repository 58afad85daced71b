//! Host canonicalisation and same-site matching.
//!
//! Two URLs belong to the same site when their canonical hosts are equal, or
//! when one host is (a subdomain of) the other's registrable root domain.

use url::{Host, Url};

/// Two-level public suffixes under which registrable roots have three labels.
const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk",
    "com.au", "net.au", "org.au", "edu.au",
    "co.jp", "ne.jp", "or.jp",
    "co.nz", "org.nz",
    "com.br", "com.cn", "com.mx", "com.tr", "com.sg", "com.hk",
    "co.in", "co.kr", "co.za", "co.il",
];

/// Lower-cased host of `url` with one leading `www.` removed.
///
/// Returns `None` for unparsable URLs and URLs without a host.
pub fn canonical_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Registrable root of a canonical host: the last two labels, or three when
/// the last two form a known multi-label public suffix. IP literals and
/// single-label hosts are their own root.
pub fn registrable_root(host: &str) -> String {
    if Host::parse(host).is_ok_and(|h| !matches!(h, Host::Domain(_))) {
        return host.to_string();
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }
    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if MULTI_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len().saturating_sub(keep)..].join(".")
}

fn is_within(host: &str, root: &str) -> bool {
    host == root || host.ends_with(&format!(".{}", root))
}

/// Whether two canonical hosts belong to the same site.
pub fn hosts_match(a: &str, b: &str) -> bool {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    let a = a.strip_prefix("www.").unwrap_or(&a);
    let b = b.strip_prefix("www.").unwrap_or(&b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    is_within(a, &registrable_root(b)) || is_within(b, &registrable_root(a))
}

/// Whether two URLs belong to the same site. Hostless URLs never match.
pub fn urls_share_site(a: &str, b: &str) -> bool {
    match (canonical_host(a), canonical_host(b)) {
        (Some(a), Some(b)) => hosts_match(&a, &b),
        _ => false,
    }
}

/// Whether `url` uses a scheme that the embedded surface should load itself.
pub fn is_web_scheme(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Schemes that are internal to the surface and never leave it.
pub fn is_internal_scheme(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "about" | "data" | "blob" | "javascript"))
        .unwrap_or(false)
}
