//! Table blueprints.
//!
//! A [`Blueprint`] collects the columns and commands requested for one
//! table. Compiling it never mutates it: the implied `Add`/`Change` commands
//! and the indexes requested through column attributes are computed into a
//! separate resolved list on every call to [`Blueprint::to_sql`].

use tracing::trace;

use crate::column::{ColumnDefinition, ColumnType, IndexFlag};
use crate::command::{Command, ForeignKey, ForeignKeyCommand, Index, IndexCommand, IndexTarget};
use crate::connection::ConnectionConfig;
use crate::error::Result;
use crate::grammar::Grammar;

/// The requested changes for a single table.
///
/// ```rust
/// use tramp_schema::{Blueprint, ConnectionConfig, MySqlGrammar};
///
/// let mut table = Blueprint::new("users");
/// table.create();
/// table.increments("id");
/// table.string("email", None).unique();
///
/// let sql = table
///     .to_sql(&MySqlGrammar::new(""), &ConnectionConfig::default())
///     .unwrap();
/// assert_eq!(
///     sql,
///     vec![
///         "CREATE TABLE `users` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY, \
///          `email` VARCHAR(255), UNIQUE KEY `users_email_unique` (`email`));"
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    columns: Vec<ColumnDefinition>,
    commands: Vec<Command>,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    comment: Option<String>,
    temporary: bool,
}

impl Blueprint {
    /// Creates an empty blueprint for a table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            commands: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
            comment: None,
            temporary: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the unprefixed table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the explicitly added commands, without implied ones.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Columns that are new to the table.
    pub fn added_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| !c.is_change())
    }

    /// Columns that alter existing ones.
    pub fn changed_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_change())
    }

    /// Whether this blueprint creates its table.
    #[must_use]
    pub fn creating(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::Create))
    }

    #[must_use]
    pub fn table_engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    #[must_use]
    pub fn table_charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    #[must_use]
    pub fn table_collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    #[must_use]
    pub fn table_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    // =========================================================================
    // Table Attributes
    // =========================================================================

    /// Sets the storage engine used when the table is created.
    pub fn engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.engine = Some(engine.into());
        self
    }

    /// Sets the default character set used when the table is created.
    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the default collation used when the table is created.
    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Sets the comment written into `CREATE TABLE`.
    ///
    /// Use [`Blueprint::comment`] to change the comment of an existing table.
    pub fn with_table_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Creates the table as a temporary table.
    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Appends a command as is.
    pub fn add_command(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Marks the table as being created.
    pub fn create(&mut self) -> &mut Self {
        self.add_command(Command::Create)
    }

    pub fn drop(&mut self) -> &mut Self {
        self.add_command(Command::Drop)
    }

    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.add_command(Command::DropIfExists)
    }

    /// Renames the table.
    pub fn rename(&mut self, to: impl Into<String>) -> &mut Self {
        self.add_command(Command::Rename { to: to.into() })
    }

    /// Drops one or more columns.
    pub fn drop_column<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.add_command(Command::DropColumn { columns })
    }

    /// Renames a column, keeping its other properties.
    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.add_command(Command::RenameColumn {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Changes the comment of an existing table.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.add_command(Command::Comment {
            comment: comment.into(),
        })
    }

    pub fn primary(&mut self, index: impl Into<Index>) -> &mut Self {
        let index = self.index_command("primary", index.into());
        self.add_command(Command::Primary(index))
    }

    pub fn unique(&mut self, index: impl Into<Index>) -> &mut Self {
        let index = self.index_command("unique", index.into());
        self.add_command(Command::Unique(index))
    }

    pub fn index(&mut self, index: impl Into<Index>) -> &mut Self {
        let index = self.index_command("index", index.into());
        self.add_command(Command::Index(index))
    }

    /// Adds a foreign key constraint.
    pub fn foreign(&mut self, foreign: ForeignKey) -> &mut Self {
        let index = foreign
            .name
            .unwrap_or_else(|| self.create_index_name("foreign", &foreign.columns));
        self.add_command(Command::Foreign(ForeignKeyCommand {
            index,
            columns: foreign.columns,
            references: foreign.references,
            on: foreign.on,
            on_delete: foreign.on_delete,
            on_update: foreign.on_update,
        }))
    }

    pub fn drop_primary(&mut self) -> &mut Self {
        let index = IndexCommand::new(self.create_index_name("primary", &[]), Vec::<String>::new());
        self.add_command(Command::DropPrimary(index))
    }

    pub fn drop_unique(&mut self, target: impl Into<IndexTarget>) -> &mut Self {
        let index = self.drop_index_command("unique", target.into());
        self.add_command(Command::DropUnique(index))
    }

    pub fn drop_index(&mut self, target: impl Into<IndexTarget>) -> &mut Self {
        let index = self.drop_index_command("index", target.into());
        self.add_command(Command::DropIndex(index))
    }

    pub fn drop_foreign(&mut self, target: impl Into<IndexTarget>) -> &mut Self {
        let index = self.drop_index_command("foreign", target.into());
        self.add_command(Command::DropForeign(index))
    }

    fn index_command(&self, role: &str, index: Index) -> IndexCommand {
        let name = index
            .name
            .unwrap_or_else(|| self.create_index_name(role, &index.columns));
        IndexCommand {
            index: name,
            columns: index.columns,
            algorithm: index.algorithm,
            inline: false,
        }
    }

    fn drop_index_command(&self, role: &str, target: IndexTarget) -> IndexCommand {
        match target {
            IndexTarget::Name(name) => IndexCommand::new(name, Vec::<String>::new()),
            IndexTarget::Columns(columns) => {
                IndexCommand::new(self.create_index_name(role, &columns), columns)
            }
        }
    }

    /// Derives an index name: `{table}_{columns}_{role}` without `-` or `.`.
    #[must_use]
    pub fn create_index_name(&self, role: &str, columns: &[String]) -> String {
        let name = format!("{}_{}_{}", self.table, columns.join("_"), role);
        name.chars().filter(|c| !matches!(c, '-' | '.')).collect()
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Appends a column and returns it for further configuration.
    pub fn add_column(&mut self, column: ColumnDefinition) -> &mut ColumnDefinition {
        self.columns.push(column);
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    fn column(&mut self, name: impl Into<String>, column_type: ColumnType) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::new(name, column_type))
    }

    /// Auto-incrementing unsigned integer primary key.
    pub fn increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Integer).unsigned().auto_increment()
    }

    pub fn tiny_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::TinyInteger).unsigned().auto_increment()
    }

    pub fn small_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::SmallInteger).unsigned().auto_increment()
    }

    pub fn medium_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::MediumInteger).unsigned().auto_increment()
    }

    pub fn big_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::BigInteger).unsigned().auto_increment()
    }

    /// Fixed-length string column.
    pub fn char(&mut self, name: impl Into<String>, length: Option<u32>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Char { length })
    }

    /// Variable-length string column; the grammar's default length applies
    /// when `length` is `None`.
    pub fn string(&mut self, name: impl Into<String>, length: Option<u32>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::String { length })
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Text)
    }

    pub fn medium_text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::MediumText)
    }

    pub fn long_text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::LongText)
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Integer)
    }

    pub fn tiny_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::TinyInteger)
    }

    pub fn small_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::SmallInteger)
    }

    pub fn medium_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::MediumInteger)
    }

    pub fn big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::BigInteger)
    }

    pub fn unsigned_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.integer(name).unsigned()
    }

    pub fn unsigned_tiny_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.tiny_integer(name).unsigned()
    }

    pub fn unsigned_small_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.small_integer(name).unsigned()
    }

    pub fn unsigned_medium_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.medium_integer(name).unsigned()
    }

    pub fn unsigned_big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.big_integer(name).unsigned()
    }

    pub fn float(
        &mut self,
        name: impl Into<String>,
        total: Option<u32>,
        places: Option<u32>,
    ) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Float { total, places })
    }

    pub fn double(
        &mut self,
        name: impl Into<String>,
        total: Option<u32>,
        places: Option<u32>,
    ) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Double { total, places })
    }

    pub fn decimal(
        &mut self,
        name: impl Into<String>,
        total: Option<u32>,
        places: Option<u32>,
    ) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Decimal { total, places })
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Boolean)
    }

    /// Enumeration column restricted to `allowed`.
    pub fn enumeration<I, S>(&mut self, name: impl Into<String>, allowed: I) -> &mut ColumnDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed.into_iter().map(Into::into).collect();
        self.column(name, ColumnType::Enum { allowed })
    }

    pub fn json(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Json)
    }

    pub fn jsonb(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Jsonb)
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: impl Into<String>, precision: u8) -> &mut ColumnDefinition {
        self.column(name, ColumnType::DateTime { precision })
    }

    pub fn date_time_tz(&mut self, name: impl Into<String>, precision: u8) -> &mut ColumnDefinition {
        self.column(name, ColumnType::DateTimeTz { precision })
    }

    pub fn time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Time)
    }

    pub fn time_tz(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::TimeTz)
    }

    pub fn timestamp(&mut self, name: impl Into<String>, precision: u8) -> &mut ColumnDefinition {
        self.column(
            name,
            ColumnType::Timestamp {
                precision,
                use_current: false,
            },
        )
    }

    pub fn timestamp_tz(&mut self, name: impl Into<String>, precision: u8) -> &mut ColumnDefinition {
        self.column(
            name,
            ColumnType::TimestampTz {
                precision,
                use_current: false,
            },
        )
    }

    pub fn binary(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Binary)
    }

    pub fn uuid(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Uuid)
    }

    pub fn ip_address(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::IpAddress)
    }

    pub fn mac_address(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::MacAddress)
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// Index commands derived from column attributes, in column order.
    ///
    /// Per column only the first requested role counts: primary, then
    /// unique, then index. On a creating blueprint the commands are marked
    /// inline.
    #[must_use]
    pub fn fluent_indexes(&self) -> Vec<Command> {
        let creating = self.creating();
        let mut commands = Vec::new();
        for column in &self.columns {
            let roles: [(&str, Option<&IndexFlag>, fn(IndexCommand) -> Command); 3] = [
                ("primary", column.primary.as_ref(), Command::Primary),
                ("unique", column.unique.as_ref(), Command::Unique),
                ("index", column.index.as_ref(), Command::Index),
            ];
            let requested = roles.into_iter().find_map(|(role, flag, make)| {
                flag.filter(|f| f.is_enabled()).map(|f| (role, f, make))
            });
            if let Some((role, flag, make)) = requested {
                let columns = vec![column.name.clone()];
                let index = flag
                    .name()
                    .map_or_else(|| self.create_index_name(role, &columns), String::from);
                commands.push(make(IndexCommand {
                    index,
                    columns,
                    algorithm: None,
                    inline: creating,
                }));
            }
        }
        commands
    }

    /// The full command list compiled by [`Blueprint::to_sql`]: implied
    /// `Change` and `Add` first, then explicit commands, then fluent indexes.
    #[must_use]
    pub fn resolved_commands(&self) -> Vec<Command> {
        let mut commands = self.commands.clone();
        if !self.creating() {
            if self.added_columns().next().is_some() {
                commands.insert(0, Command::Add);
            }
            if self.changed_columns().next().is_some() {
                commands.insert(0, Command::Change);
            }
        }
        commands.extend(self.fluent_indexes());
        commands
    }

    /// Compiles the blueprint into complete statements, each ending in `;`.
    ///
    /// Commands the grammar has no compiler for are skipped.
    pub fn to_sql(&self, grammar: &dyn Grammar, config: &ConnectionConfig) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for command in self.resolved_commands() {
            let Some(sql) = grammar.compile_command(self, &command, config)? else {
                trace!(table = %self.table, command = command.kind().name(), "no compiler, skipped");
                continue;
            };
            let sql = sql.trim().trim_end_matches(';').trim_end();
            if sql.is_empty() {
                continue;
            }
            statements.push(format!("{sql};"));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;

    #[test]
    fn test_index_name_strips_separators() {
        let table = Blueprint::new("my-app.users");
        assert_eq!(
            table.create_index_name("unique", &["e-mail".into(), "org.id".into()]),
            "myappusers_email_orgid_unique"
        );
    }

    #[test]
    fn test_implied_commands_order() {
        let mut table = Blueprint::new("users");
        table.string("name", None);
        table.integer("age").change();
        table.drop_column(["legacy"]);
        let kinds: Vec<_> = table.resolved_commands().iter().map(Command::kind).collect();
        assert_eq!(
            kinds,
            vec![CommandKind::Change, CommandKind::Add, CommandKind::DropColumn]
        );
        // Resolution never writes back.
        assert_eq!(table.commands().len(), 1);
    }

    #[test]
    fn test_no_implied_commands_when_creating() {
        let mut table = Blueprint::new("users");
        table.create();
        table.string("name", None);
        let kinds: Vec<_> = table.resolved_commands().iter().map(Command::kind).collect();
        assert_eq!(kinds, vec![CommandKind::Create]);
    }

    #[test]
    fn test_fluent_index_first_role_wins() {
        let mut table = Blueprint::new("users");
        table.string("email", None).index().unique();
        table.string("slug", None).index_named("slug_idx");
        table.string("plain", None);

        let fluent = table.fluent_indexes();
        assert_eq!(fluent.len(), 2);
        assert_eq!(
            fluent[0],
            Command::Unique(IndexCommand::new("users_email_unique", ["email"]))
        );
        assert_eq!(
            fluent[1],
            Command::Index(IndexCommand::new("slug_idx", ["slug"]))
        );
    }

    #[test]
    fn test_fluent_indexes_inline_when_creating() {
        let mut table = Blueprint::new("users");
        table.create();
        table.integer("id").primary();
        let fluent = table.fluent_indexes();
        assert_eq!(fluent.len(), 1);
        assert!(fluent[0].index_command().is_some_and(|i| i.inline));
    }

    #[test]
    fn test_drop_index_by_columns_derives_name() {
        let mut table = Blueprint::new("posts");
        table.drop_index(["author_id", "created_at"]);
        table.drop_unique("posts_slug_unique");
        let commands = table.commands();
        assert_eq!(
            commands[0].index_command().map(|i| i.index.as_str()),
            Some("posts_author_id_created_at_index")
        );
        assert_eq!(
            commands[1].index_command().map(|i| i.index.as_str()),
            Some("posts_slug_unique")
        );
    }

    #[test]
    fn test_foreign_key_name() {
        let mut table = Blueprint::new("posts");
        table.foreign(ForeignKey::new(["author_id"]).references(["id"]).on("users"));
        match &table.commands()[0] {
            Command::Foreign(fk) => assert_eq!(fk.index, "posts_author_id_foreign"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
