//! Sitedeck state database.
//!
//! A single SQLite file holding the small amount of shell state that must
//! survive a restart: which site was active, and the last URL visited in each
//! site. Settings and the site catalog live in JSON files instead.
//!
//! ```no_run
//! use sitedeck::database::{Database, DATABASE_FILE};
//!
//! let db = Database::open(DATABASE_FILE).expect("failed to open database");
//! let rows: i64 = db
//!     .connection()
//!     .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
//!     .expect("kv table");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;

/// File name of the state database inside the data directory.
pub const DATABASE_FILE: &str = "state.db";
