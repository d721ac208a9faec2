//! Declarative JSON change-sets.
//!
//! ```json
//! {
//!   "up": [
//!     {
//!       "action": "create",
//!       "table": "users",
//!       "engine": "InnoDB",
//!       "columns": [
//!         { "name": "id", "type": "integer", "unsigned": true, "autoIncrement": true },
//!         { "name": "email", "type": "string", "length": 191, "unique": true }
//!       ]
//!     }
//!   ],
//!   "down": [{ "action": "dropIfExists", "table": "users" }]
//! }
//! ```
//!
//! Steps run in order. Inside a `create` or `table` step, table attributes
//! and columns are applied first, then commands in this order: column
//! renames, column drops, index drops, new indexes, foreign keys.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tramp_schema::{
    Blueprint, Builder, ColumnDefinition, ForeignKey, Index, IndexTarget,
};

use crate::changeset::{ChangeSet, ChangeSetLoader};
use crate::error::{MigrateError, Result};

/// Loads `*.json` change-set files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChangeSetLoader;

impl ChangeSetLoader for JsonChangeSetLoader {
    fn accepts(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "json")
    }

    fn load(&self, path: &Path) -> Result<Arc<dyn ChangeSet>> {
        let contents = std::fs::read_to_string(path).map_err(|e| MigrateError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let change_set = JsonChangeSet::parse(&contents).map_err(|e| MigrateError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Arc::new(change_set))
    }
}

/// A parsed declarative change-set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonChangeSet {
    up: Vec<Step>,
    down: Vec<Step>,
}

impl JsonChangeSet {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl ChangeSet for JsonChangeSet {
    fn up(&self, schema: &mut Builder) {
        apply_steps(&self.up, schema);
    }

    fn down(&self, schema: &mut Builder) {
        apply_steps(&self.down, schema);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum Step {
    Create {
        table: String,
        #[serde(flatten)]
        changes: TableChanges,
    },
    Table {
        table: String,
        #[serde(flatten)]
        changes: TableChanges,
    },
    Drop {
        table: String,
    },
    DropIfExists {
        table: String,
    },
    Rename {
        from: String,
        to: String,
    },
    Raw {
        sql: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IndexSpec {
    Columns(Vec<String>),
    Detailed {
        columns: Vec<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        algorithm: Option<String>,
    },
}

impl From<&IndexSpec> for Index {
    fn from(spec: &IndexSpec) -> Self {
        match spec {
            IndexSpec::Columns(columns) => Index::new(columns.iter().cloned()),
            IndexSpec::Detailed {
                columns,
                name,
                algorithm,
            } => {
                let mut index = Index::new(columns.iter().cloned());
                if let Some(name) = name {
                    index = index.name(name.clone());
                }
                if let Some(algorithm) = algorithm {
                    index = index.algorithm(algorithm.clone());
                }
                index
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ColumnRename {
    from: String,
    to: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TableChanges {
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    comment: Option<String>,
    temporary: bool,
    columns: Vec<ColumnDefinition>,
    rename_column: Vec<ColumnRename>,
    drop_column: Vec<String>,
    drop_primary: bool,
    drop_unique: Vec<IndexTarget>,
    drop_index: Vec<IndexTarget>,
    drop_foreign: Vec<IndexTarget>,
    primary: Vec<IndexSpec>,
    unique: Vec<IndexSpec>,
    index: Vec<IndexSpec>,
    foreign: Vec<ForeignKey>,
}

impl TableChanges {
    fn apply(&self, table: &mut Blueprint) {
        if let Some(engine) = &self.engine {
            table.engine(engine.clone());
        }
        if let Some(charset) = &self.charset {
            table.charset(charset.clone());
        }
        if let Some(collation) = &self.collation {
            table.collation(collation.clone());
        }
        if let Some(comment) = &self.comment {
            // On an existing table the comment is an ALTER of its own.
            if table.creating() {
                table.with_table_comment(comment.clone());
            } else {
                table.comment(comment.clone());
            }
        }
        if self.temporary {
            table.temporary();
        }
        for column in &self.columns {
            table.add_column(column.clone());
        }
        for rename in &self.rename_column {
            table.rename_column(rename.from.clone(), rename.to.clone());
        }
        if !self.drop_column.is_empty() {
            table.drop_column(self.drop_column.iter().cloned());
        }
        if self.drop_primary {
            table.drop_primary();
        }
        for target in &self.drop_unique {
            table.drop_unique(target.clone());
        }
        for target in &self.drop_index {
            table.drop_index(target.clone());
        }
        for target in &self.drop_foreign {
            table.drop_foreign(target.clone());
        }
        for spec in &self.primary {
            table.primary(spec);
        }
        for spec in &self.unique {
            table.unique(spec);
        }
        for spec in &self.index {
            table.index(spec);
        }
        for foreign in &self.foreign {
            table.foreign(foreign.clone());
        }
    }
}

fn apply_steps(steps: &[Step], schema: &mut Builder) {
    for step in steps {
        match step {
            Step::Create { table, changes } => changes.apply(schema.create(table.clone())),
            Step::Table { table, changes } => changes.apply(schema.table(table.clone())),
            Step::Drop { table } => {
                schema.drop(table.clone());
            }
            Step::DropIfExists { table } => {
                schema.drop_if_exists(table.clone());
            }
            Step::Rename { from, to } => {
                schema.rename(from.clone(), to.clone());
            }
            Step::Raw { sql } => {
                schema.raw(sql.clone());
            }
        }
    }
}
