// Sitedeck services
// Services provide shared behaviour used by tabs and the app shell.

pub mod context;
pub mod domain;
pub mod event_bus;
pub mod external_opener;
pub mod kv_store;
pub mod load_errors;
pub mod navigation_policy;
pub mod settings_engine;
pub mod telemetry;
