//! Migrator configuration.
//!
//! Read from a `tramp.json` file:
//!
//! ```json
//! {
//!   "paths": ["migrations", "vendor/migrations"],
//!   "tablePrefix": "app_",
//!   "connection": { "host": "127.0.0.1", "user": "root", "database": "app" }
//! }
//! ```
//!
//! `paths` may also be a comma-separated string. Relative paths resolve
//! against the directory holding the configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tramp_schema::ConnectionConfig;

use crate::error::{MigrateError, Result};
use crate::mysql::database_from_url;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "tramp.json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathsSetting {
    List(Vec<String>),
    Joined(String),
}

impl PathsSetting {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(paths) => paths,
            Self::Joined(paths) => paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
    paths: Option<PathsSetting>,
    table_prefix: Option<String>,
    connection: ConnectionConfig,
}

/// Resolved migrator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MigratorConfig {
    base_dir: PathBuf,
    paths: Vec<PathBuf>,
    /// Connection settings. Its `table_prefix` is the configured prefix.
    pub connection: ConnectionConfig,
}

impl MigratorConfig {
    /// Creates an empty configuration resolving paths against `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            paths: Vec::new(),
            connection: ConnectionConfig::default(),
        }
    }

    /// Loads a configuration file. Paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MigrateError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let absolute = std::fs::canonicalize(path)?;
        let base_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| MigrateError::Config(format!("{} has no parent", path.display())))?;
        Self::from_json(&contents, base_dir)
    }

    /// Parses a configuration document.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let mut config = Self::new(base_dir);
        config.connection = raw.connection;
        if config.connection.database.is_none() {
            config.connection.database =
                config.connection.url.as_deref().and_then(database_from_url);
        }
        if let Some(prefix) = raw.table_prefix {
            config.connection.table_prefix = prefix;
        }
        for path in raw.paths.map(PathsSetting::into_vec).unwrap_or_default() {
            config.add_path(path);
        }
        Ok(config)
    }

    /// Overrides the connection URL, and the database when the URL names one.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if let Some(database) = database_from_url(&url) {
            self.connection.database = Some(database);
        }
        self.connection.url = Some(url);
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The change-set directories, absolute, in configuration order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.connection.table_prefix
    }

    /// Adds a change-set directory unless it is already configured.
    pub fn add_path(&mut self, path: impl AsRef<Path>) {
        let path = self.absolute_path(path);
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Resolves `path` against the base directory, dropping trailing `/`.
    #[must_use]
    pub fn absolute_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        // Component iteration drops trailing separators.
        let trimmed: PathBuf = path.components().collect();
        if trimmed.is_absolute() {
            trimmed
        } else {
            self.base_dir.join(trimmed)
        }
    }

    /// `path` relative to the base directory when it lies below it.
    #[must_use]
    pub fn relative_path(&self, path: impl AsRef<Path>) -> String {
        let path: PathBuf = path.as_ref().components().collect();
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path.as_path());
        relative.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_as_array() {
        let config = MigratorConfig::from_json(
            r#"{"paths": ["migrations/", "/opt/shared"], "tablePrefix": "app_"}"#,
            "/srv/app",
        )
        .unwrap();
        assert_eq!(
            config.paths(),
            &[PathBuf::from("/srv/app/migrations"), PathBuf::from("/opt/shared")]
        );
        assert_eq!(config.table_prefix(), "app_");
    }

    #[test]
    fn test_paths_as_comma_string() {
        let config =
            MigratorConfig::from_json(r#"{"paths": "a, b,a"}"#, "/srv/app").unwrap();
        assert_eq!(
            config.paths(),
            &[PathBuf::from("/srv/app/a"), PathBuf::from("/srv/app/b")]
        );
    }

    #[test]
    fn test_connection_section() {
        let config = MigratorConfig::from_json(
            r#"{"connection": {"url": "mysql://root@db/app", "tablePrefix": "x_"}}"#,
            "/srv",
        )
        .unwrap();
        assert_eq!(config.connection.url.as_deref(), Some("mysql://root@db/app"));
        assert_eq!(config.table_prefix(), "x_");
        assert!(config.paths().is_empty());
        assert_eq!(config.connection.database.as_deref(), Some("app"));

        let config = config.with_database_url("mysql://other/billing");
        assert_eq!(config.connection.url.as_deref(), Some("mysql://other/billing"));
        assert_eq!(config.connection.database.as_deref(), Some("billing"));
    }

    #[test]
    fn test_explicit_database_wins_over_url() {
        let config = MigratorConfig::from_json(
            r#"{"connection": {"url": "mysql://root@db/app", "database": "reports"}}"#,
            "/srv",
        )
        .unwrap();
        assert_eq!(config.connection.database.as_deref(), Some("reports"));

        let config = config.with_database_url("mysql://root@db");
        assert_eq!(config.connection.database.as_deref(), Some("reports"));
    }

    #[test]
    fn test_relative_path() {
        let config = MigratorConfig::new("/srv/app");
        assert_eq!(config.relative_path("/srv/app/migrations/"), "migrations");
        assert_eq!(config.relative_path("/opt/shared"), "/opt/shared");
        assert_eq!(config.relative_path("local"), "local");
    }

    #[test]
    fn test_add_path_deduplicates() {
        let mut config = MigratorConfig::new("/srv/app");
        config.add_path("migrations");
        config.add_path("/srv/app/migrations/");
        assert_eq!(config.paths().len(), 1);
    }

    #[test]
    fn test_invalid_json() {
        let err = MigratorConfig::from_json(r#"{"paths": 3}"#, "/srv").unwrap_err();
        assert!(matches!(err, MigrateError::Serialization(_)));
    }
}
