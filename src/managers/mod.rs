// Sitedeck state managers
// Managers own stateful collections: the site catalog and the tabs built from it.

pub mod site_catalog;
pub mod tab;
pub mod tab_manager;
