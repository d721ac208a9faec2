//! Migration runner.
//!
//! The [`Migrator`] discovers change-set files in the configured
//! directories, decides which are pending from the bookkeeping table,
//! materializes their SQL and applies them one statement at a time.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use tramp_schema::Connection;

use crate::changeset::{file_name, ChangeSet, ChangeSetLoader, Direction};
use crate::config::MigratorConfig;
use crate::error::{MigrateError, Result};
use crate::history::{MigrationHistory, MigrationRecord, NewRecord, RanSql};
use crate::json::JsonChangeSetLoader;

/// Attributes change-set files to their authors.
pub trait AuthorsLookup: Send + Sync {
    /// Authors of the file at `path`, if known.
    fn authors(&self, path: &Path) -> Option<String>;
}

/// Attributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthors;

impl AuthorsLookup for NoAuthors {
    fn authors(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// A change-set file that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMigration {
    /// Absolute directory holding the file.
    pub path: PathBuf,
    /// File name, the bookkeeping key.
    pub file: String,
}

impl PendingMigration {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
        }
    }

    /// Full path of the change-set file.
    #[must_use]
    pub fn full_path(&self) -> PathBuf {
        self.path.join(&self.file)
    }
}

/// Options for [`Migrator::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// File names to record as `skipped` without executing them.
    pub skip: Vec<String>,
}

impl RunOptions {
    #[must_use]
    pub fn skip<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(files.into_iter().map(Into::into));
        self
    }
}

/// Outcome of [`Migrator::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files whose statements were executed, in order.
    pub migrated: Vec<String>,
    /// Files recorded as skipped.
    pub skipped: Vec<String>,
}

impl RunSummary {
    /// Number of change-sets recorded by the run.
    #[must_use]
    pub fn total(&self) -> usize {
        self.migrated.len() + self.skipped.len()
    }
}

/// One pending change-set of a [`Preview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    /// Directory relative to the configuration.
    pub path: String,
    pub file: String,
    /// Statements, unless the preview is a summary.
    pub sql: Option<Vec<String>>,
}

/// Read-only listing of pending change-sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub entries: Vec<PreviewEntry>,
}

impl Preview {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "No pending migrations.");
        }
        writeln!(f, "{} pending migration(s):", self.entries.len())?;
        for entry in &self.entries {
            if entry.path.is_empty() {
                writeln!(f, "  {}", entry.file)?;
            } else {
                writeln!(f, "  {}/{}", entry.path, entry.file)?;
            }
            for sql in entry.sql.iter().flatten() {
                for line in sql.lines() {
                    writeln!(f, "      {line}")?;
                }
            }
        }
        Ok(())
    }
}

/// Applies change-sets against one connection.
pub struct Migrator {
    config: MigratorConfig,
    connection: Box<dyn Connection>,
    loaders: Vec<Box<dyn ChangeSetLoader>>,
    authors: Box<dyn AuthorsLookup>,
    history: MigrationHistory,
}

impl fmt::Debug for Migrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("config", &self.config)
            .field("loaders", &self.loaders.len())
            .finish_non_exhaustive()
    }
}

impl Migrator {
    /// Creates a migrator that loads JSON change-sets.
    #[must_use]
    pub fn new(config: MigratorConfig, connection: Box<dyn Connection>) -> Self {
        Self {
            config,
            connection,
            loaders: vec![Box::new(JsonChangeSetLoader)],
            authors: Box::new(NoAuthors),
            history: MigrationHistory::new(),
        }
    }

    /// Adds a loader. Loaders are consulted in the order they were added.
    #[must_use]
    pub fn with_loader(mut self, loader: impl ChangeSetLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    #[must_use]
    pub fn with_authors(mut self, authors: impl AuthorsLookup + 'static) -> Self {
        self.authors = Box::new(authors);
        self
    }

    #[must_use]
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn ChangeSetLoader> {
        self.loaders
            .iter()
            .map(|loader| &**loader)
            .find(|loader| loader.accepts(path))
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Connects, runs the grammar's initialization SQL and creates the
    /// bookkeeping table if needed.
    pub async fn initialize(&mut self) -> Result<()> {
        self.connection.connect().await?;
        let initial_sql = self.connection.schema_grammar().initial_sql();
        for sql in &initial_sql {
            debug!(sql = %sql, "running initialization statement");
            self.connection.query(sql, &[]).await?;
        }
        self.history.ensure_table(self.connection.as_mut()).await
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<()> {
        self.connection.close().await?;
        Ok(())
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Change-set files a loader accepts, in every configured directory.
    ///
    /// File names are the bookkeeping key, so a name found in two
    /// directories is an error.
    fn discover(&self) -> Result<Vec<PendingMigration>> {
        let mut found = Vec::new();
        for dir in self.config.paths() {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %dir.display(), "migration directory does not exist");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let path = entry.path();
                let Some(file) = file_name(&path) else {
                    continue;
                };
                if self.loader_for(&path).is_some() {
                    found.push(PendingMigration::new(dir.clone(), file));
                }
            }
        }
        found.sort_by(|a, b| a.file.cmp(&b.file));
        if let Some(pair) = found.windows(2).find(|pair| pair[0].file == pair[1].file) {
            return Err(MigrateError::DuplicateMigration {
                file: pair[0].file.clone(),
                first: pair[0].path.clone(),
                second: pair[1].path.clone(),
            });
        }
        Ok(found)
    }

    /// Unrecorded change-set files, sorted by file name.
    pub async fn pending_migrations(&mut self) -> Result<Vec<PendingMigration>> {
        let applied: HashSet<String> = self.history.applied_set(self.connection.as_mut()).await?;
        let pending: Vec<_> = self
            .discover()?
            .into_iter()
            .filter(|migration| !applied.contains(&migration.file))
            .collect();
        debug!(count = pending.len(), "pending migrations");
        Ok(pending)
    }

    /// Locates a change-set file by name, recorded or not.
    pub fn find_migration(&self, file: &str) -> Result<PendingMigration> {
        self.discover()?
            .into_iter()
            .find(|migration| migration.file == file)
            .ok_or_else(|| MigrateError::MigrationNotFound(String::from(file)))
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    fn load(&self, migration: &PendingMigration) -> Result<Arc<dyn ChangeSet>> {
        let path = migration.full_path();
        let loader = self.loader_for(&path).ok_or_else(|| MigrateError::Load {
            path: path.clone(),
            message: String::from("no loader accepts this file"),
        })?;
        loader.load(&path)
    }

    /// Loads the change-set and renders one half of it on a fresh builder.
    pub fn migration_sql(
        &self,
        migration: &PendingMigration,
        direction: Direction,
    ) -> Result<Vec<String>> {
        let change_set = self.load(migration)?;
        let mut schema = self.connection.schema_builder();
        change_set.apply(direction, &mut schema);
        Ok(schema.to_sql()?)
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Records a change-set file as applied.
    pub async fn mark_as_migrated(
        &mut self,
        migration: &PendingMigration,
        ran_sql: RanSql,
    ) -> Result<()> {
        if self
            .history
            .is_applied(self.connection.as_mut(), &migration.file)
            .await?
        {
            return Err(MigrateError::AlreadyMigrated(migration.file.clone()));
        }
        let path = if self.config.paths().len() > 1 {
            self.config.relative_path(&migration.path)
        } else {
            String::new()
        };
        let authors = self
            .authors
            .authors(&migration.full_path())
            .unwrap_or_default();
        let record = NewRecord {
            migration: migration.file.clone(),
            path,
            authors,
            ran_sql,
        };
        self.history.record(self.connection.as_mut(), &record).await
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Applies every pending change-set in order.
    ///
    /// All change-sets are materialized before anything executes, so a load
    /// failure leaves the database untouched. A failing statement stops the
    /// run; its change-set is not recorded.
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunSummary> {
        let pending = self.pending_migrations().await?;
        let mut planned = Vec::with_capacity(pending.len());
        for migration in pending {
            let sql = self.migration_sql(&migration, Direction::Up)?;
            planned.push((migration, sql));
        }

        let mut summary = RunSummary::default();
        for (migration, statements) in planned {
            if options.skip.contains(&migration.file) {
                info!(file = %migration.file, "skipping migration");
                self.mark_as_migrated(&migration, RanSql::Skipped).await?;
                summary.skipped.push(migration.file);
                continue;
            }

            info!(file = %migration.file, statements = statements.len(), "migrating");
            for (completed, sql) in statements.iter().enumerate() {
                debug!(file = %migration.file, sql = %sql, "executing statement");
                if let Err(source) = self.connection.query(sql, &[]).await {
                    return Err(MigrateError::Statement {
                        file: migration.file.clone(),
                        sql: sql.clone(),
                        completed,
                        source,
                    });
                }
            }
            self.mark_as_migrated(&migration, RanSql::Statements(statements))
                .await?;
            summary.migrated.push(migration.file);
        }
        Ok(summary)
    }

    /// Lists pending change-sets, with their SQL unless `summary`.
    pub async fn dump_preview(&mut self, summary: bool) -> Result<Preview> {
        let pending = self.pending_migrations().await?;
        let mut entries = Vec::with_capacity(pending.len());
        for migration in pending {
            let sql = if summary {
                None
            } else {
                Some(self.migration_sql(&migration, Direction::Up)?)
            };
            entries.push(PreviewEntry {
                path: self.config.relative_path(&migration.path),
                file: migration.file,
                sql,
            });
        }
        Ok(Preview { entries })
    }

    /// The most recent records, newest first.
    pub async fn history(&mut self, limit: u32) -> Result<Vec<MigrationRecord>> {
        self.history.recent(self.connection.as_mut(), limit).await
    }
}
