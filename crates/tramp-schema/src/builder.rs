//! Schema builder.
//!
//! The [`Builder`] accumulates blueprints and raw statements in order, then
//! either renders them ([`Builder::to_sql`]) or runs them against a
//! connection ([`Builder::execute`]).

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::blueprint::Blueprint;
use crate::connection::{Connection, ConnectionConfig};
use crate::error::{Result, SchemaError};
use crate::expression::Expression;
use crate::grammar::Grammar;
use crate::value::SqlValue;

enum Entry {
    Blueprint(usize),
    Raw(Expression),
}

/// An ordered sequence of schema changes.
///
/// ```rust
/// use std::sync::Arc;
/// use tramp_schema::{Builder, ConnectionConfig, MySqlGrammar};
///
/// let mut schema = Builder::new(Arc::new(MySqlGrammar::new("")), ConnectionConfig::default());
/// schema.create("tags").increments("id");
/// schema.raw("SET FOREIGN_KEY_CHECKS=0");
/// schema.drop_if_exists("legacy_tags");
///
/// assert_eq!(
///     schema.to_sql().unwrap(),
///     vec![
///         "CREATE TABLE `tags` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);",
///         "SET FOREIGN_KEY_CHECKS=0",
///         "DROP TABLE IF EXISTS `legacy_tags`;",
///     ]
/// );
/// ```
pub struct Builder {
    grammar: Arc<dyn Grammar>,
    config: ConnectionConfig,
    blueprints: Vec<Blueprint>,
    entries: Vec<Entry>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("grammar", &self.grammar.name())
            .field("blueprints", &self.blueprints)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Builder {
    /// Creates an empty builder for a grammar and connection configuration.
    #[must_use]
    pub fn new(grammar: Arc<dyn Grammar>, config: ConnectionConfig) -> Self {
        Self {
            grammar,
            config,
            blueprints: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Creates an empty builder bound to a connection's grammar and config.
    #[must_use]
    pub fn for_connection(connection: &dyn Connection) -> Self {
        connection.schema_builder()
    }

    #[must_use]
    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // =========================================================================
    // Queueing
    // =========================================================================

    /// Queues a blueprint that alters an existing table.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Blueprint {
        self.push_blueprint(Blueprint::new(table))
    }

    /// Queues a blueprint that creates a table.
    pub fn create(&mut self, table: impl Into<String>) -> &mut Blueprint {
        let blueprint = self.table(table);
        blueprint.create();
        blueprint
    }

    pub fn drop(&mut self, table: impl Into<String>) -> &mut Blueprint {
        let blueprint = self.table(table);
        blueprint.drop();
        blueprint
    }

    pub fn drop_if_exists(&mut self, table: impl Into<String>) -> &mut Blueprint {
        let blueprint = self.table(table);
        blueprint.drop_if_exists();
        blueprint
    }

    /// Queues a table rename.
    pub fn rename(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Blueprint {
        let blueprint = self.table(from);
        blueprint.rename(to);
        blueprint
    }

    /// Queues a raw statement, emitted verbatim.
    pub fn raw(&mut self, sql: impl Into<Expression>) -> &mut Self {
        self.entries.push(Entry::Raw(sql.into()));
        self
    }

    /// Queues an already built blueprint.
    pub fn push_blueprint(&mut self, blueprint: Blueprint) -> &mut Blueprint {
        let index = self.blueprints.len();
        self.blueprints.push(blueprint);
        self.entries.push(Entry::Blueprint(index));
        &mut self.blueprints[index]
    }

    // =========================================================================
    // Rendering and Execution
    // =========================================================================

    /// Renders every queued entry, in order.
    pub fn to_sql(&self) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for entry in &self.entries {
            statements.extend(self.render(entry)?);
        }
        Ok(statements)
    }

    fn render(&self, entry: &Entry) -> Result<Vec<String>> {
        match entry {
            Entry::Raw(expr) => Ok(vec![String::from(expr.value())]),
            Entry::Blueprint(index) => {
                self.blueprints[*index].to_sql(self.grammar.as_ref(), &self.config)
            }
        }
    }

    /// Drains the queue, executing statements one at a time.
    ///
    /// Stops at the first failing statement; the queue is emptied either
    /// way. Returns the number of statements executed.
    pub async fn execute(&mut self, connection: &mut dyn Connection) -> Result<usize> {
        let entries = std::mem::take(&mut self.entries);
        let outcome = self.execute_entries(&entries, connection).await;
        self.blueprints.clear();
        outcome
    }

    async fn execute_entries(
        &self,
        entries: &[Entry],
        connection: &mut dyn Connection,
    ) -> Result<usize> {
        let mut executed = 0;
        for entry in entries {
            for sql in self.render(entry)? {
                debug!(sql = %sql, "executing schema statement");
                connection
                    .query(&sql, &[])
                    .await
                    .map_err(|source| SchemaError::Execution {
                        sql: sql.clone(),
                        source,
                    })?;
                executed += 1;
            }
        }
        Ok(executed)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    fn introspection_bindings(&self, connection: &dyn Connection, table: &str) -> [SqlValue; 2] {
        [
            SqlValue::from(connection.database_name().map(String::from)),
            SqlValue::from(format!("{}{}", self.grammar.table_prefix(), table)),
        ]
    }

    /// Whether the (prefixed) table exists in the connection's schema.
    pub async fn has_table(&self, connection: &mut dyn Connection, table: &str) -> Result<bool> {
        let sql = self.grammar.compile_table_exists()?;
        let bindings = self.introspection_bindings(&*connection, table);
        let rows = connection
            .query(&sql, &bindings)
            .await
            .map_err(|source| SchemaError::Execution { sql, source })?;
        Ok(!rows.is_empty())
    }

    /// Column names of the (prefixed) table.
    pub async fn column_listing(
        &self,
        connection: &mut dyn Connection,
        table: &str,
    ) -> Result<Vec<String>> {
        let sql = self.grammar.compile_column_listing()?;
        let bindings = self.introspection_bindings(&*connection, table);
        let rows = connection
            .query(&sql, &bindings)
            .await
            .map_err(|source| SchemaError::Execution { sql, source })?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get_str("column_name").map(String::from))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionError;
    use crate::grammar::MySqlGrammar;
    use crate::value::Row;
    use async_trait::async_trait;

    fn builder() -> Builder {
        Builder::new(Arc::new(MySqlGrammar::new("")), ConnectionConfig::default())
    }

    /// Rejects statements containing `reject`, remembers the rest.
    struct Rejecting {
        config: ConnectionConfig,
        reject: &'static str,
        seen: Vec<(String, Vec<SqlValue>)>,
    }

    impl Rejecting {
        fn new(reject: &'static str) -> Self {
            Self {
                config: ConnectionConfig {
                    database: Some(String::from("app")),
                    ..ConnectionConfig::default()
                },
                reject,
                seen: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl Connection for Rejecting {
        async fn connect(&mut self) -> std::result::Result<(), ConnectionError> {
            Ok(())
        }

        async fn query(
            &mut self,
            sql: &str,
            bindings: &[SqlValue],
        ) -> std::result::Result<Vec<Row>, ConnectionError> {
            if sql.contains(self.reject) {
                return Err(ConnectionError::driver(format!("rejected: {sql}")));
            }
            self.seen.push((String::from(sql), bindings.to_vec()));
            Ok(Vec::new())
        }

        async fn close(&mut self) -> std::result::Result<(), ConnectionError> {
            Ok(())
        }

        fn config(&self) -> &ConnectionConfig {
            &self.config
        }

        fn schema_grammar(&self) -> Arc<dyn Grammar> {
            Arc::new(MySqlGrammar::new(""))
        }
    }

    #[tokio::test]
    async fn test_failed_execute_empties_the_queue() {
        let mut connection = Rejecting::new("DROP");
        let mut schema = builder();
        schema.create("a").increments("id");
        schema.drop("b");
        schema.raw("SELECT 1");

        let err = schema.execute(&mut connection).await.unwrap_err();
        assert!(matches!(err, SchemaError::Execution { ref sql, .. } if sql == "DROP TABLE `b`;"));
        assert!(schema.is_empty());
        assert_eq!(schema.to_sql().unwrap(), Vec::<String>::new());

        schema.raw("SELECT 2");
        assert_eq!(schema.execute(&mut connection).await.unwrap(), 1);
        let seen: Vec<&str> = connection.seen.iter().map(|(sql, _)| sql.as_str()).collect();
        assert_eq!(
            seen,
            vec!["CREATE TABLE `a` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);", "SELECT 2"]
        );
    }

    #[tokio::test]
    async fn test_introspection_binds_database_name() {
        let mut connection = Rejecting::new("never");
        let schema = builder();
        assert!(!schema.has_table(&mut connection, "users").await.unwrap());
        assert_eq!(
            connection.seen[0].1,
            vec![SqlValue::from("app"), SqlValue::from("users")]
        );
    }

    #[test]
    fn test_entries_render_in_order() {
        let mut schema = builder();
        schema.rename("a", "b");
        schema.raw("SELECT 1");
        schema.drop("c");
        assert_eq!(schema.len(), 3);
        assert_eq!(
            schema.to_sql().unwrap(),
            vec!["RENAME TABLE `a` TO `b`;", "SELECT 1", "DROP TABLE `c`;"]
        );
    }

    #[test]
    fn test_to_sql_is_repeatable() {
        let mut schema = builder();
        let table = schema.table("users");
        table.string("email", None).unique();
        table.integer("age").change().nullable();
        let first = schema.to_sql().unwrap();
        let second = schema.to_sql().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_table_prefix_applies_to_every_blueprint() {
        let mut schema = Builder::new(
            Arc::new(MySqlGrammar::new("app_")),
            ConnectionConfig::default().with_table_prefix("app_"),
        );
        schema.drop_if_exists("users");
        schema.rename("posts", "articles");
        assert_eq!(
            schema.to_sql().unwrap(),
            vec![
                "DROP TABLE IF EXISTS `app_users`;",
                "RENAME TABLE `app_posts` TO `app_articles`;"
            ]
        );
    }
}
