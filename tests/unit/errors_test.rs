use sitedeck::types::errors::*;

// === TabError Tests ===

#[test]
fn tab_error_not_found_display() {
    let err = TabError::NotFound("mail".to_string());
    assert_eq!(err.to_string(), "Tab not found for site: mail");
}

#[test]
fn tab_error_invalid_index_display() {
    let err = TabError::InvalidIndex(7);
    assert_eq!(err.to_string(), "Invalid tab index: 7");
}

#[test]
fn tab_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(TabError::NotFound("id".to_string()));
    assert!(err.source().is_none());
}

// === CatalogError Tests ===

#[test]
fn catalog_error_display_variants() {
    assert_eq!(
        CatalogError::IoError("disk full".to_string()).to_string(),
        "Catalog I/O error: disk full"
    );
    assert_eq!(
        CatalogError::SerializationError("expected value".to_string()).to_string(),
        "Catalog serialization error: expected value"
    );
    assert_eq!(
        CatalogError::InvalidUrl("ftp://x".to_string()).to_string(),
        "Invalid site URL: ftp://x"
    );
    assert_eq!(
        CatalogError::NotFound("chat".to_string()).to_string(),
        "Site not found: chat"
    );
    assert_eq!(
        CatalogError::InvalidIndex(12).to_string(),
        "Invalid site index: 12"
    );
}

// === StoreError Tests ===

#[test]
fn store_error_display() {
    assert_eq!(
        StoreError::DatabaseError("locked".to_string()).to_string(),
        "Store database error: locked"
    );
}

#[test]
fn store_error_from_rusqlite() {
    let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StoreError::DatabaseError(_)));
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::SerializationError("eof".to_string()).to_string(),
        "Settings serialization error: eof"
    );
    assert_eq!(
        SettingsError::InvalidKey("a.b".to_string()).to_string(),
        "Invalid settings key: a.b"
    );
    assert_eq!(
        SettingsError::InvalidValue("not a number".to_string()).to_string(),
        "Invalid settings value: not a number"
    );
}

// === OpenError Tests ===

#[test]
fn open_error_display_variants() {
    assert_eq!(
        OpenError::InvalidUrl("::".to_string()).to_string(),
        "Cannot open invalid URL: ::"
    );
    assert_eq!(
        OpenError::LaunchFailed("no handler".to_string()).to_string(),
        "Failed to open external browser: no handler"
    );
}

#[test]
fn all_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TabError>();
    assert_send_sync::<CatalogError>();
    assert_send_sync::<StoreError>();
    assert_send_sync::<SettingsError>();
    assert_send_sync::<OpenError>();
}
