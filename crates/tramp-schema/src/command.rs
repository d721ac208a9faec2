//! Table commands.
//!
//! Every change a [`Blueprint`](crate::Blueprint) requests is recorded as a
//! [`Command`]. Grammars dispatch on [`CommandKind`].

use serde::Deserialize;

/// A single requested change to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the table.
    Create,
    /// Add the blueprint's new columns to an existing table.
    Add,
    /// Alter the blueprint's changed columns.
    Change,
    /// Drop the table.
    Drop,
    /// Drop the table if it exists.
    DropIfExists,
    /// Rename the table.
    Rename { to: String },
    /// Add a primary key.
    Primary(IndexCommand),
    /// Add a unique index.
    Unique(IndexCommand),
    /// Add a plain index.
    Index(IndexCommand),
    /// Add a foreign key constraint.
    Foreign(ForeignKeyCommand),
    DropPrimary(IndexCommand),
    DropUnique(IndexCommand),
    DropIndex(IndexCommand),
    DropForeign(IndexCommand),
    /// Drop one or more columns.
    DropColumn { columns: Vec<String> },
    /// Rename a column, keeping every other property.
    RenameColumn { from: String, to: String },
    /// Set the table comment.
    Comment { comment: String },
}

/// Fieldless discriminant of [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Add,
    Change,
    Drop,
    DropIfExists,
    Rename,
    Primary,
    Unique,
    Index,
    Foreign,
    DropPrimary,
    DropUnique,
    DropIndex,
    DropForeign,
    DropColumn,
    RenameColumn,
    Comment,
}

impl CommandKind {
    /// Returns the command name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Add => "add",
            Self::Change => "change",
            Self::Drop => "drop",
            Self::DropIfExists => "dropIfExists",
            Self::Rename => "rename",
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
            Self::Foreign => "foreign",
            Self::DropPrimary => "dropPrimary",
            Self::DropUnique => "dropUnique",
            Self::DropIndex => "dropIndex",
            Self::DropForeign => "dropForeign",
            Self::DropColumn => "dropColumn",
            Self::RenameColumn => "renameColumn",
            Self::Comment => "comment",
        }
    }
}

impl Command {
    /// Returns the dispatch key of this command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Create => CommandKind::Create,
            Self::Add => CommandKind::Add,
            Self::Change => CommandKind::Change,
            Self::Drop => CommandKind::Drop,
            Self::DropIfExists => CommandKind::DropIfExists,
            Self::Rename { .. } => CommandKind::Rename,
            Self::Primary(_) => CommandKind::Primary,
            Self::Unique(_) => CommandKind::Unique,
            Self::Index(_) => CommandKind::Index,
            Self::Foreign(_) => CommandKind::Foreign,
            Self::DropPrimary(_) => CommandKind::DropPrimary,
            Self::DropUnique(_) => CommandKind::DropUnique,
            Self::DropIndex(_) => CommandKind::DropIndex,
            Self::DropForeign(_) => CommandKind::DropForeign,
            Self::DropColumn { .. } => CommandKind::DropColumn,
            Self::RenameColumn { .. } => CommandKind::RenameColumn,
            Self::Comment { .. } => CommandKind::Comment,
        }
    }

    /// Returns the index payload of index-like commands.
    #[must_use]
    pub const fn index_command(&self) -> Option<&IndexCommand> {
        match self {
            Self::Primary(index)
            | Self::Unique(index)
            | Self::Index(index)
            | Self::DropPrimary(index)
            | Self::DropUnique(index)
            | Self::DropIndex(index)
            | Self::DropForeign(index) => Some(index),
            _ => None,
        }
    }
}

// =============================================================================
// Index Commands
// =============================================================================

/// Payload of the index commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    /// Index name.
    pub index: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Index algorithm (e.g. `BTREE`, `HASH`).
    pub algorithm: Option<String>,
    /// Rendered inside `CREATE TABLE` instead of as a standalone statement.
    pub inline: bool,
}

impl IndexCommand {
    /// Creates an index command with no algorithm.
    #[must_use]
    pub fn new<I, S>(index: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index: index.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            algorithm: None,
            inline: false,
        }
    }

    /// Sets the index algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }
}

/// An index request: the columns plus an optional name and algorithm.
///
/// ```rust
/// use tramp_schema::{Blueprint, Index};
///
/// let mut table = Blueprint::new("posts");
/// table.index("author_id");
/// table.unique(Index::new(["slug", "lang"]).name("posts_slug").algorithm("BTREE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub(crate) columns: Vec<String>,
    pub(crate) name: Option<String>,
    pub(crate) algorithm: Option<String>,
}

impl Index {
    /// Creates an index request over the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            name: None,
            algorithm: None,
        }
    }

    /// Uses an explicit index name instead of the derived one.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }
}

impl From<&str> for Index {
    fn from(column: &str) -> Self {
        Self::new([column])
    }
}

impl From<String> for Index {
    fn from(column: String) -> Self {
        Self::new([column])
    }
}

impl<const N: usize> From<[&str; N]> for Index {
    fn from(columns: [&str; N]) -> Self {
        Self::new(columns)
    }
}

impl From<Vec<String>> for Index {
    fn from(columns: Vec<String>) -> Self {
        Self::new(columns)
    }
}

/// Identifies an index to drop: by name, or by the columns it covers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IndexTarget {
    Name(String),
    /// The index name is derived from the columns.
    Columns(Vec<String>),
}

impl From<&str> for IndexTarget {
    fn from(name: &str) -> Self {
        Self::Name(String::from(name))
    }
}

impl From<String> for IndexTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<const N: usize> From<[&str; N]> for IndexTarget {
    fn from(columns: [&str; N]) -> Self {
        Self::Columns(columns.iter().map(|c| String::from(*c)).collect())
    }
}

impl From<Vec<String>> for IndexTarget {
    fn from(columns: Vec<String>) -> Self {
        Self::Columns(columns)
    }
}

// =============================================================================
// Foreign Keys
// =============================================================================

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Payload of the [`Command::Foreign`] command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyCommand {
    /// Constraint name.
    pub index: String,
    /// Local columns.
    pub columns: Vec<String>,
    /// Referenced columns.
    pub references: Vec<String>,
    /// Referenced table.
    pub on: String,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

/// A foreign key request.
///
/// ```rust
/// use tramp_schema::{Blueprint, ForeignKey, ForeignKeyAction};
///
/// let mut table = Blueprint::new("posts");
/// table.foreign(
///     ForeignKey::new(["author_id"])
///         .references(["id"])
///         .on("users")
///         .on_delete(ForeignKeyAction::Cascade),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub(crate) columns: Vec<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) references: Vec<String>,
    #[serde(default)]
    pub(crate) on: String,
    #[serde(default)]
    pub(crate) on_delete: Option<ForeignKeyAction>,
    #[serde(default)]
    pub(crate) on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Creates a foreign key over the given local columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            name: None,
            references: Vec::new(),
            on: String::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Uses an explicit constraint name instead of the derived one.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the referenced columns.
    #[must_use]
    pub fn references<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the referenced table.
    #[must_use]
    pub fn on(mut self, table: impl Into<String>) -> Self {
        self.on = table.into();
        self
    }

    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }
}
