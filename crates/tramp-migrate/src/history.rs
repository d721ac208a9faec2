//! Migration history tracking.
//!
//! This module manages the `tramp_migrations` table (subject to the table
//! prefix) that records which change-set files have been applied.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::{debug, info};
use tramp_schema::{Connection, Expression, Row, SqlValue};

use crate::error::{MigrateError, Result};

/// Unprefixed name of the bookkeeping table.
pub const MIGRATIONS_TABLE: &str = "tramp_migrations";

/// `ran_sql` value of change-sets recorded without running.
pub const SKIPPED: &str = "skipped";

const RAN_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What was executed for a recorded change-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RanSql {
    /// The statements that ran, in order.
    Statements(Vec<String>),
    /// Recorded without executing anything.
    Skipped,
}

impl RanSql {
    /// The stored form: statements joined by a blank line, or `skipped`.
    #[must_use]
    pub fn to_stored(&self) -> String {
        match self {
            Self::Statements(statements) => statements.join("\n\n"),
            Self::Skipped => String::from(SKIPPED),
        }
    }
}

/// A row to insert into the bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub migration: String,
    pub path: String,
    pub authors: String,
    pub ran_sql: RanSql,
}

/// A recorded change-set.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRecord {
    pub id: i64,
    /// Change-set file name.
    pub migration: String,
    /// Directory relative to the configuration, empty with a single root.
    pub path: String,
    pub authors: String,
    pub ran_sql: String,
    pub ran_at: NaiveDateTime,
}

impl MigrationRecord {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.ran_sql == SKIPPED
    }

    fn from_row(row: &Row) -> Result<Self> {
        let text = |column: &str| -> Result<String> {
            match row.get(column) {
                Some(SqlValue::Null) | None => Ok(String::new()),
                Some(value) => value.as_str().map(String::from).ok_or_else(|| {
                    MigrateError::InvalidRecord(format!("`{column}` is not text"))
                }),
            }
        };
        let id = row
            .get("id")
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| MigrateError::InvalidRecord(String::from("missing `id`")))?;
        let ran_at = text("ran_at")?;
        let ran_at = NaiveDateTime::parse_from_str(&ran_at, RAN_AT_FORMAT).map_err(|e| {
            MigrateError::InvalidRecord(format!("`ran_at` value '{ran_at}': {e}"))
        })?;
        Ok(Self {
            id,
            migration: text("migration")?,
            path: text("path")?,
            authors: text("authors")?,
            ran_sql: text("ran_sql")?,
            ran_at,
        })
    }
}

/// Reads and writes the bookkeeping table through a connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationHistory;

impl MigrationHistory {
    /// Creates a new migration history manager.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn table(connection: &dyn Connection) -> String {
        connection.schema_grammar().wrap_table(MIGRATIONS_TABLE)
    }

    /// Creates the bookkeeping table unless it exists.
    pub async fn ensure_table(&self, connection: &mut dyn Connection) -> Result<()> {
        let mut schema = connection.schema_builder();
        if schema.has_table(connection, MIGRATIONS_TABLE).await? {
            debug!(table = MIGRATIONS_TABLE, "bookkeeping table exists");
            return Ok(());
        }

        let table = schema.create(MIGRATIONS_TABLE);
        table.increments("id");
        table.string("migration", None).unique();
        table.string("path", None).default("");
        table.string("authors", None).default("");
        table.text("ran_sql");
        table
            .date_time("ran_at", 0)
            .default(Expression::new("CURRENT_TIMESTAMP"));
        schema.execute(connection).await?;
        info!(table = MIGRATIONS_TABLE, "created bookkeeping table");
        Ok(())
    }

    /// File names of every recorded change-set.
    pub async fn applied_set(&self, connection: &mut dyn Connection) -> Result<HashSet<String>> {
        let sql = format!("SELECT migration FROM {}", Self::table(connection));
        let rows = connection.query(&sql, &[]).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get_str("migration").map(String::from))
            .collect())
    }

    /// Checks if a change-set file has been recorded.
    pub async fn is_applied(&self, connection: &mut dyn Connection, migration: &str) -> Result<bool> {
        let sql = format!(
            "SELECT id FROM {} WHERE migration = ?",
            Self::table(connection)
        );
        let rows = connection
            .query(&sql, &[SqlValue::from(migration)])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Inserts one record.
    pub async fn record(&self, connection: &mut dyn Connection, record: &NewRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (migration, path, authors, ran_sql) VALUES (?, ?, ?, ?)",
            Self::table(connection)
        );
        let bindings = [
            SqlValue::from(record.migration.as_str()),
            SqlValue::from(record.path.as_str()),
            SqlValue::from(record.authors.as_str()),
            SqlValue::from(record.ran_sql.to_stored()),
        ];
        connection.query(&sql, &bindings).await?;
        debug!(migration = %record.migration, "recorded migration");
        Ok(())
    }

    /// The `limit` most recent records, newest first.
    pub async fn recent(
        &self,
        connection: &mut dyn Connection,
        limit: u32,
    ) -> Result<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY ran_at DESC, id DESC LIMIT ?",
            Self::table(connection)
        );
        let rows = connection.query(&sql, &[SqlValue::from(limit)]).await?;
        rows.iter().map(MigrationRecord::from_row).collect()
    }
}
