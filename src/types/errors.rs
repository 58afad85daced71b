use std::fmt;

// === TabError ===

/// Errors related to tab lookup and selection.
#[derive(Debug)]
pub enum TabError {
    /// No tab exists for the given site ID.
    NotFound(String),
    /// The provided tab index is out of bounds.
    InvalidIndex(usize),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotFound(id) => write!(f, "Tab not found for site: {}", id),
            TabError::InvalidIndex(index) => write!(f, "Invalid tab index: {}", index),
        }
    }
}

impl std::error::Error for TabError {}

// === CatalogError ===

/// Errors related to the site catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// An I/O error occurred while reading or writing the catalog file.
    IoError(String),
    /// Failed to serialize or deserialize the catalog.
    SerializationError(String),
    /// The site URL is not an absolute http(s) URL.
    InvalidUrl(String),
    /// No site with the given ID exists.
    NotFound(String),
    /// The target position is out of bounds.
    InvalidIndex(usize),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::IoError(msg) => write!(f, "Catalog I/O error: {}", msg),
            CatalogError::SerializationError(msg) => {
                write!(f, "Catalog serialization error: {}", msg)
            }
            CatalogError::InvalidUrl(url) => write!(f, "Invalid site URL: {}", url),
            CatalogError::NotFound(id) => write!(f, "Site not found: {}", id),
            CatalogError::InvalidIndex(index) => write!(f, "Invalid site index: {}", index),
        }
    }
}

impl std::error::Error for CatalogError {}

// === StoreError ===

/// Errors related to the persistent key-value store.
#[derive(Debug)]
pub enum StoreError {
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DatabaseError(msg) => write!(f, "Store database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === OpenError ===

/// Errors raised while handing a URL to the system browser.
#[derive(Debug)]
pub enum OpenError {
    /// The URL could not be parsed.
    InvalidUrl(String),
    /// The operating system refused to open the URL.
    LaunchFailed(String),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::InvalidUrl(url) => write!(f, "Cannot open invalid URL: {}", url),
            OpenError::LaunchFailed(msg) => write!(f, "Failed to open external browser: {}", msg),
        }
    }
}

impl std::error::Error for OpenError {}
