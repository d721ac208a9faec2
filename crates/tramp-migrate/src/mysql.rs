//! MySQL [`Connection`] over a single `sqlx` connection.
//!
//! Statements without bindings go through the text protocol so that
//! multi-statement DDL (the `TRAMP_ALTER_COLUMN` round trips) runs as one
//! call. Statements with bindings are prepared.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column as _, Connection as _, Executor as _, MySql, Row as _};
use tracing::{debug, info};
use tramp_schema::{
    Connection, ConnectionConfig, ConnectionError, Grammar, MySqlGrammar, Row, SqlValue,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A lazily opened MySQL session.
pub struct MySqlConnection {
    config: ConnectionConfig,
    grammar: Arc<MySqlGrammar>,
    inner: Option<sqlx::MySqlConnection>,
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("database", &self.config.database)
            .field("connected", &self.inner.is_some())
            .finish()
    }
}

impl MySqlConnection {
    /// Creates an unopened connection. The grammar uses the configured
    /// table prefix.
    ///
    /// A database named only in the URL is copied into the configuration,
    /// so introspection queries bind the right schema.
    #[must_use]
    pub fn new(mut config: ConnectionConfig) -> Self {
        if config.database.is_none() {
            config.database = config.url.as_deref().and_then(database_from_url);
        }
        let grammar = Arc::new(MySqlGrammar::new(config.table_prefix.clone()));
        Self {
            config,
            grammar,
            inner: None,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.is_some()
    }

    fn connect_options(&self) -> Result<MySqlConnectOptions, ConnectionError> {
        let mut options = match &self.config.url {
            Some(url) => url
                .parse::<MySqlConnectOptions>()
                .map_err(ConnectionError::driver)?,
            None => MySqlConnectOptions::new(),
        };
        if let Some(host) = &self.config.host {
            options = options.host(host);
        }
        if let Some(port) = self.config.port {
            options = options.port(port);
        }
        if let Some(user) = &self.config.user {
            options = options.username(user);
        }
        if let Some(password) = &self.config.password {
            options = options.password(password);
        }
        if let Some(database) = &self.config.database {
            options = options.database(database);
        }
        if let Some(charset) = &self.config.charset {
            options = options.charset(charset);
        }
        Ok(options)
    }
}

/// The database named in a MySQL connection URL.
#[must_use]
pub fn database_from_url(url: &str) -> Option<String> {
    url.parse::<MySqlConnectOptions>()
        .ok()
        .and_then(|options| options.get_database().map(String::from))
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

fn convert_row(mysql_row: &MySqlRow) -> Row {
    let mut row = Row::new();
    for column in mysql_row.columns() {
        let name = column.name();
        let value = if let Ok(value) = mysql_row.try_get::<Option<i64>, _>(name) {
            SqlValue::from(value)
        } else if let Ok(value) = mysql_row.try_get::<Option<u64>, _>(name) {
            // Unsigned values above i64::MAX do not occur in bookkeeping rows.
            SqlValue::from(value.and_then(|v| i64::try_from(v).ok()))
        } else if let Ok(value) = mysql_row.try_get::<Option<f64>, _>(name) {
            SqlValue::from(value)
        } else if let Ok(value) = mysql_row.try_get::<Option<String>, _>(name) {
            SqlValue::from(value)
        } else if let Ok(value) = mysql_row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
            SqlValue::from(value.map(|v| v.format(DATETIME_FORMAT).to_string()))
        } else if let Ok(value) = mysql_row.try_get::<Option<Vec<u8>>, _>(name) {
            // information_schema columns can arrive as binary strings.
            match value.map(String::from_utf8) {
                Some(Ok(text)) => SqlValue::Text(text),
                Some(Err(e)) => SqlValue::Blob(e.into_bytes()),
                None => SqlValue::Null,
            }
        } else {
            SqlValue::Null
        };
        row.push(name, value);
    }
    row
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.inner.is_some() {
            return Ok(());
        }
        let options = self.connect_options()?;
        let connection = sqlx::MySqlConnection::connect_with(&options)
            .await
            .map_err(ConnectionError::driver)?;
        info!(database = ?self.config.database, "connected to MySQL");
        self.inner = Some(connection);
        Ok(())
    }

    async fn query(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<Vec<Row>, ConnectionError> {
        let connection = self.inner.as_mut().ok_or(ConnectionError::NotConnected)?;
        debug!(sql = %sql, bindings = bindings.len(), "query");
        let rows = if bindings.is_empty() {
            connection
                .fetch_all(sqlx::raw_sql(sql))
                .await
                .map_err(ConnectionError::driver)?
        } else {
            let mut query = sqlx::query(sql);
            for value in bindings {
                query = bind_value(query, value);
            }
            connection
                .fetch_all(query)
                .await
                .map_err(ConnectionError::driver)?
        };
        Ok(rows.iter().map(convert_row).collect())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        if let Some(connection) = self.inner.take() {
            connection.close().await.map_err(ConnectionError::driver)?;
            debug!("closed MySQL connection");
        }
        Ok(())
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn schema_grammar(&self) -> Arc<dyn Grammar> {
        self.grammar.clone()
    }
}
