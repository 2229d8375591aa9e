//! Refrain Storage
//!
//! Durable player preferences for Refrain.
//!
//! # Architecture
//!
//! - **Preferences**: a key → JSON store ([`PreferenceStore`]), backed by `SQLite`
//!   or kept in memory
//! - **Snapshot**: the persisted player state under one fixed key, plus the
//!   track-duration cache under another
//! - **Commit on settle**: [`SnapshotWriter`] decides when a staged snapshot is
//!   worth writing, so bursts (seek drags, playhead updates) collapse into one write
//!
//! # Example
//!
//! ```rust,no_run
//! use refrain_storage::{snapshot, SqlitePreferences};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqlitePreferences::open("refrain.db").await?;
//!
//! // Restore whatever the previous session left behind
//! let restored = snapshot::load_snapshot(&store).await?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod preferences;
pub mod snapshot;

pub use error::{Result, StorageError};
pub use preferences::{MemoryPreferences, PreferenceStore, SqlitePreferences};
pub use snapshot::{SnapshotWriter, DURATIONS_KEY, SNAPSHOT_KEY};

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the first read.
pub async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool for a database file
pub async fn create_pool_at(path: &Path) -> std::result::Result<SqlitePool, sqlx::Error> {
    connect(SqliteConnectOptions::new().filename(path)).await
}

async fn connect(options: SqliteConnectOptions) -> std::result::Result<SqlitePool, sqlx::Error> {
    let options = options
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!("Preference database pool created");
    Ok(pool)
}
