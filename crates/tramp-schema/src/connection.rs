//! The database connection seam.
//!
//! Schema compilation itself is pure; executing statements, introspection
//! and migration bookkeeping go through a [`Connection`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::builder::Builder;
use crate::error::ConnectionError;
use crate::grammar::Grammar;
use crate::value::{Row, SqlValue};

/// Connection settings.
///
/// Either `url` or the individual `host`/`port`/`user`/`password`/`database`
/// fields identify the server. `charset`, `collation` and `engine` are the
/// table defaults used by `CREATE TABLE` when a blueprint sets none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub engine: Option<String>,
    /// Prepended to every table name.
    pub table_prefix: String,
}

impl ConnectionConfig {
    /// Creates a configuration from a connection URL.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    #[must_use]
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

/// A single database session that executes one statement at a time.
#[async_trait]
pub trait Connection: Send {
    /// Opens the session. Calling it on an open connection is a no-op.
    async fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Executes one SQL text, binding `bindings` to its `?` placeholders.
    ///
    /// Statements that return no result set yield an empty vector.
    async fn query(&mut self, sql: &str, bindings: &[SqlValue])
        -> Result<Vec<Row>, ConnectionError>;

    /// Closes the session.
    async fn close(&mut self) -> Result<(), ConnectionError>;

    fn config(&self) -> &ConnectionConfig;

    fn table_prefix(&self) -> &str {
        &self.config().table_prefix
    }

    /// The schema the connection operates on, if known.
    fn database_name(&self) -> Option<&str> {
        self.config().database.as_deref()
    }

    /// The grammar that renders DDL for this connection's dialect.
    fn schema_grammar(&self) -> Arc<dyn Grammar>;

    /// A fresh schema builder bound to this connection's grammar and config.
    fn schema_builder(&self) -> Builder {
        Builder::new(self.schema_grammar(), self.config().clone())
    }
}
