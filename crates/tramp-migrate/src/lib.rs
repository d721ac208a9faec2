//! Schema change-set tracking for MySQL.
//!
//! `tramp-migrate` applies change-sets built with `tramp-schema` and
//! records each applied file in a `tramp_migrations` table:
//! - Change-set files are discovered in the configured directories and
//!   applied in file-name order
//! - Each file is recorded once, with the SQL that ran (or `skipped`)
//! - SQL for a change-set can be previewed without executing it
//!
//! # Architecture
//!
//! - **Config** - `tramp.json`: directories, table prefix, connection
//! - **Change-sets** - The [`ChangeSet`](changeset::ChangeSet) trait, JSON
//!   files and change-sets compiled into the binary
//! - **History** - Reads and writes the bookkeeping table
//! - **Migrator** - Discovery, preview and execution
//! - **MySQL** - The `sqlx` backed connection
//!
//! # Example
//!
//! ```rust,ignore
//! use tramp_migrate::prelude::*;
//!
//! let config = MigratorConfig::load("tramp.json")?;
//! let connection = MySqlConnection::new(config.connection.clone());
//! let mut migrator = Migrator::new(config, Box::new(connection));
//!
//! migrator.initialize().await?;
//! let summary = migrator.run(&RunOptions::default().skip(["0003_backfill.json"])).await?;
//! migrator.close().await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply pending change-sets
//! tramp migrate
//!
//! # Record a change-set as applied without running it
//! tramp migrate --skip 0003_backfill.json
//!
//! # Show pending change-sets and their SQL
//! tramp preview
//!
//! # Show the last 20 applied change-sets
//! tramp history
//! ```

pub mod changeset;
pub mod config;
pub mod error;
pub mod history;
pub mod json;
pub mod migrator;
pub mod mysql;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::changeset::{ChangeSet, ChangeSetLoader, ChangeSetRegistry, Direction};
    pub use crate::config::{MigratorConfig, CONFIG_FILE};
    pub use crate::error::{MigrateError, Result};
    pub use crate::history::{MigrationHistory, MigrationRecord, RanSql, MIGRATIONS_TABLE};
    pub use crate::json::{JsonChangeSet, JsonChangeSetLoader};
    pub use crate::migrator::{
        AuthorsLookup, Migrator, NoAuthors, PendingMigration, Preview, PreviewEntry, RunOptions,
        RunSummary,
    };
    pub use crate::mysql::MySqlConnection;
    pub use tramp_schema::Builder;
}
