//! Shared test fixtures: an in-memory connection that records statements
//! and emulates the bookkeeping table.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tramp_migrate::prelude::{Migrator, MigratorConfig, MIGRATIONS_TABLE};
use tramp_schema::{
    Connection, ConnectionConfig, ConnectionError, Grammar, MySqlGrammar, Row, SqlValue,
};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub migration: String,
    pub path: String,
    pub authors: String,
    pub ran_sql: String,
}

#[derive(Debug, Default)]
pub struct State {
    /// Every statement received, in order, with its bindings.
    pub executed: Vec<(String, Vec<SqlValue>)>,
    pub records: Vec<StoredRecord>,
    pub table_created: bool,
    /// Statements containing this text fail.
    pub fail_on: Option<String>,
    pub connected: bool,
    pub closed: bool,
}

impl State {
    /// Statements other than bookkeeping and introspection queries.
    pub fn schema_statements(&self) -> Vec<String> {
        self.executed
            .iter()
            .map(|(sql, _)| sql.clone())
            .filter(|sql| !sql.contains("tramp_migrations") && !sql.contains("information_schema"))
            .filter(|sql| !sql.contains("TRAMP_ALTER_COLUMN`"))
            .collect()
    }

    pub fn record(&mut self, migration: &str, ran_sql: &str) {
        self.records.push(StoredRecord {
            migration: String::from(migration),
            path: String::new(),
            authors: String::new(),
            ran_sql: String::from(ran_sql),
        });
    }

    pub fn recorded(&self) -> Vec<String> {
        self.records.iter().map(|r| r.migration.clone()).collect()
    }
}

/// Connection double with shared, inspectable state.
pub struct RecordingConnection {
    config: ConnectionConfig,
    grammar: Arc<MySqlGrammar>,
    state: Arc<Mutex<State>>,
}

impl RecordingConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        let grammar = Arc::new(MySqlGrammar::new(config.table_prefix.clone()));
        Self {
            config,
            grammar,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// A handle on the state that outlives the boxed connection.
    pub fn handle(&self) -> StateHandle {
        StateHandle(self.state.clone())
    }

    fn bookkeeping_table(&self) -> String {
        self.grammar.wrap_table(MIGRATIONS_TABLE)
    }

    fn respond(&self, state: &mut State, sql: &str, bindings: &[SqlValue]) -> Vec<Row> {
        let table = self.bookkeeping_table();
        let prefixed = format!("{}{}", self.config.table_prefix, MIGRATIONS_TABLE);

        if sql.starts_with("SELECT * FROM information_schema.tables") {
            // `table_schema = NULL` matches nothing, as on a real server.
            let schema = bindings.first().and_then(SqlValue::as_str);
            let wanted = bindings.get(1).and_then(SqlValue::as_str);
            if state.table_created
                && schema.is_some()
                && schema == self.config.database.as_deref()
                && wanted == Some(prefixed.as_str())
            {
                return vec![Row::new().with("table_name", prefixed)];
            }
            return Vec::new();
        }
        if sql.starts_with("CREATE TABLE") && sql.contains(&table) {
            state.table_created = true;
            return Vec::new();
        }
        if sql.starts_with(&format!("SELECT migration FROM {table}")) {
            return state
                .records
                .iter()
                .map(|r| Row::new().with("migration", r.migration.clone()))
                .collect();
        }
        if sql.starts_with(&format!("SELECT id FROM {table}")) {
            let wanted = bindings.first().and_then(SqlValue::as_str);
            return state
                .records
                .iter()
                .enumerate()
                .filter(|(_, r)| Some(r.migration.as_str()) == wanted)
                .map(|(i, _)| Row::new().with("id", i as i64 + 1))
                .collect();
        }
        if sql.starts_with(&format!("INSERT INTO {table}")) {
            let text = |i: usize| {
                bindings
                    .get(i)
                    .and_then(SqlValue::as_str)
                    .map(String::from)
                    .unwrap_or_default()
            };
            state.records.push(StoredRecord {
                migration: text(0),
                path: text(1),
                authors: text(2),
                ran_sql: text(3),
            });
            return Vec::new();
        }
        if sql.starts_with(&format!("SELECT * FROM {table}")) {
            let limit = bindings
                .first()
                .and_then(SqlValue::as_i64)
                .unwrap_or(i64::MAX);
            return state
                .records
                .iter()
                .enumerate()
                .rev()
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .map(|(i, r)| {
                    Row::new()
                        .with("id", i as i64 + 1)
                        .with("migration", r.migration.clone())
                        .with("path", r.path.clone())
                        .with("authors", r.authors.clone())
                        .with("ran_sql", r.ran_sql.clone())
                        .with("ran_at", format!("2024-01-01 00:00:{:02}", i))
                })
                .collect();
        }
        Vec::new()
    }
}

#[derive(Clone)]
pub struct StateHandle(Arc<Mutex<State>>);

impl StateHandle {
    pub fn lock(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        self.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn query(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<Vec<Row>, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(ConnectionError::NotConnected);
        }
        state.executed.push((String::from(sql), bindings.to_vec()));
        if let Some(needle) = &state.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(ConnectionError::driver(format!("rejected: {sql}")));
            }
        }
        Ok(self.respond(&mut state, sql, bindings))
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.closed = true;
        Ok(())
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn schema_grammar(&self) -> Arc<dyn Grammar> {
        self.grammar.clone()
    }
}

/// Writes a change-set file.
pub fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// A JSON change-set creating `table` and dropping it on the way down.
pub fn create_table_json(table: &str) -> String {
    format!(
        r#"{{
            "up": [{{"action": "create", "table": "{table}", "columns": [
                {{"name": "id", "type": "integer", "unsigned": true, "autoIncrement": true}}
            ]}}],
            "down": [{{"action": "dropIfExists", "table": "{table}"}}]
        }}"#
    )
}

/// A migrator over a fresh recording connection.
pub fn migrator(config: MigratorConfig) -> (Migrator, StateHandle) {
    let connection = RecordingConnection::new(config.connection.clone());
    let handle = connection.handle();
    (Migrator::new(config, Box::new(connection)), handle)
}

/// Database name the fixtures connect to.
pub const DATABASE: &str = "app";

/// A configuration with a single directory.
pub fn single_root(dir: &Path) -> MigratorConfig {
    let mut config = MigratorConfig::new(dir);
    config.add_path(dir);
    config.connection.database = Some(String::from(DATABASE));
    config
}

/// The schema bound to every information_schema lookup so far.
pub fn introspected_schemas(state: &State) -> Vec<SqlValue> {
    state
        .executed
        .iter()
        .filter(|(sql, _)| sql.contains("information_schema"))
        .filter_map(|(_, bindings)| bindings.first().cloned())
        .collect()
}
