//! MySQL grammar.

use std::collections::HashMap;
use std::fmt;

use super::{quote_string, Grammar};
use crate::blueprint::Blueprint;
use crate::column::{ColumnDefinition, ColumnType, TypeKind};
use crate::command::{Command, CommandKind, IndexCommand};
use crate::connection::ConnectionConfig;
use crate::error::{Result, SchemaError};

type CompileFn = fn(&MySqlGrammar, &Blueprint, &Command, &ConnectionConfig) -> Result<Option<String>>;
type TypeFn = fn(&MySqlGrammar, &ColumnType) -> String;
type ModifyFn = fn(&MySqlGrammar, &ColumnDefinition) -> Result<Option<String>>;

const DEFAULT_STRING_LENGTH: u32 = 255;

/// A column modifier, appended after the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    VirtualAs,
    StoredAs,
    Unsigned,
    Charset,
    Collation,
    Nullable,
    Default,
    AutoIncrement,
    Comment,
    After,
    First,
}

impl Modifier {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::VirtualAs => "virtualAs",
            Self::StoredAs => "storedAs",
            Self::Unsigned => "unsigned",
            Self::Charset => "charset",
            Self::Collation => "collation",
            Self::Nullable => "nullable",
            Self::Default => "default",
            Self::AutoIncrement => "autoIncrement",
            Self::Comment => "comment",
            Self::After => "after",
            Self::First => "first",
        }
    }

    /// Whether the column carries the attribute this modifier renders.
    #[must_use]
    pub fn is_present(self, column: &ColumnDefinition) -> bool {
        match self {
            Self::VirtualAs => column.virtual_as.is_some(),
            Self::StoredAs => column.stored_as.is_some(),
            Self::Unsigned => column.unsigned.is_some(),
            Self::Charset => column.charset.is_some(),
            Self::Collation => column.collation.is_some(),
            Self::Nullable => column.nullable.is_some(),
            Self::Default => column.default.is_some(),
            Self::AutoIncrement => column.auto_increment.is_some(),
            Self::Comment => column.comment.is_some(),
            Self::After => column.after.is_some(),
            Self::First => column.first.is_some(),
        }
    }
}

/// Grammar for MySQL 5.7+.
///
/// Column changes and renames go through the `TRAMP_ALTER_COLUMN` stored
/// function installed by [`Grammar::initial_sql`], which keeps every
/// property the change does not mention.
///
/// ```rust
/// use tramp_schema::{Blueprint, ConnectionConfig, MySqlGrammar};
///
/// let mut table = Blueprint::new("dummy_table");
/// table
///     .unsigned_integer("created_at")
///     .default(0)
///     .comment("created at timestamp");
///
/// let sql = table.to_sql(&MySqlGrammar::new(""), &ConnectionConfig::default());
/// assert_eq!(
///     sql.unwrap(),
///     vec!["ALTER TABLE `dummy_table` ADD `created_at` INT UNSIGNED DEFAULT '0' \
///           COMMENT 'created at timestamp';"]
/// );
/// ```
pub struct MySqlGrammar {
    table_prefix: String,
    default_string_length: u32,
    compilers: HashMap<CommandKind, CompileFn>,
    types: HashMap<TypeKind, TypeFn>,
    modifiers: Vec<(Modifier, ModifyFn)>,
}

impl fmt::Debug for MySqlGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlGrammar")
            .field("table_prefix", &self.table_prefix)
            .field("default_string_length", &self.default_string_length)
            .finish_non_exhaustive()
    }
}

impl Default for MySqlGrammar {
    fn default() -> Self {
        Self::new("")
    }
}

impl MySqlGrammar {
    /// Creates the grammar with the given table prefix.
    #[must_use]
    pub fn new(table_prefix: impl Into<String>) -> Self {
        let compilers: HashMap<CommandKind, CompileFn> = HashMap::from([
            (CommandKind::Create, Self::compile_create as CompileFn),
            (CommandKind::Add, Self::compile_add),
            (CommandKind::Change, Self::compile_change),
            (CommandKind::Drop, Self::compile_drop),
            (CommandKind::DropIfExists, Self::compile_drop_if_exists),
            (CommandKind::Rename, Self::compile_rename),
            (CommandKind::Primary, Self::compile_primary),
            (CommandKind::Unique, Self::compile_unique),
            (CommandKind::Index, Self::compile_index),
            (CommandKind::Foreign, Self::compile_foreign_command),
            (CommandKind::DropPrimary, Self::compile_drop_primary),
            (CommandKind::DropUnique, Self::compile_drop_index),
            (CommandKind::DropIndex, Self::compile_drop_index),
            (CommandKind::DropForeign, Self::compile_drop_foreign),
            (CommandKind::DropColumn, Self::compile_drop_column),
            (CommandKind::RenameColumn, Self::compile_rename_column),
            (CommandKind::Comment, Self::compile_comment),
        ]);

        let types: HashMap<TypeKind, TypeFn> = HashMap::from([
            (TypeKind::Char, Self::type_char as TypeFn),
            (TypeKind::String, Self::type_string),
            (TypeKind::Text, |_, _| String::from("TEXT")),
            (TypeKind::MediumText, |_, _| String::from("MEDIUMTEXT")),
            (TypeKind::LongText, |_, _| String::from("LONGTEXT")),
            (TypeKind::TinyInteger, |_, _| String::from("TINYINT")),
            (TypeKind::SmallInteger, |_, _| String::from("SMALLINT")),
            (TypeKind::MediumInteger, |_, _| String::from("MEDIUMINT")),
            (TypeKind::Integer, |_, _| String::from("INT")),
            (TypeKind::BigInteger, |_, _| String::from("BIGINT")),
            (TypeKind::Float, Self::type_double),
            (TypeKind::Double, Self::type_double),
            (TypeKind::Decimal, Self::type_decimal),
            (TypeKind::Boolean, |_, _| String::from("TINYINT(1)")),
            (TypeKind::Enum, Self::type_enum),
            (TypeKind::Json, |_, _| String::from("JSON")),
            (TypeKind::Jsonb, |_, _| String::from("JSON")),
            (TypeKind::Date, |_, _| String::from("DATE")),
            (TypeKind::DateTime, Self::type_date_time),
            (TypeKind::DateTimeTz, Self::type_date_time),
            (TypeKind::Time, |_, _| String::from("TIME")),
            (TypeKind::TimeTz, |_, _| String::from("TIME")),
            (TypeKind::Timestamp, Self::type_timestamp),
            (TypeKind::TimestampTz, Self::type_timestamp),
            (TypeKind::Binary, |_, _| String::from("BLOB")),
            (TypeKind::Uuid, |_, _| String::from("CHAR(36)")),
            (TypeKind::IpAddress, |_, _| String::from("VARCHAR(45)")),
            (TypeKind::MacAddress, |_, _| String::from("VARCHAR(17)")),
        ]);

        // Order matters: fragments are appended in this sequence.
        let modifiers: Vec<(Modifier, ModifyFn)> = vec![
            (Modifier::VirtualAs, Self::modify_virtual_as),
            (Modifier::StoredAs, Self::modify_stored_as),
            (Modifier::Unsigned, Self::modify_unsigned),
            (Modifier::Charset, Self::modify_charset),
            (Modifier::Collation, Self::modify_collation),
            (Modifier::Nullable, Self::modify_nullable),
            (Modifier::Default, Self::modify_default),
            (Modifier::AutoIncrement, Self::modify_auto_increment),
            (Modifier::Comment, Self::modify_comment),
            (Modifier::After, Self::modify_after),
            (Modifier::First, Self::modify_first),
        ];

        Self {
            table_prefix: table_prefix.into(),
            default_string_length: DEFAULT_STRING_LENGTH,
            compilers,
            types,
            modifiers,
        }
    }

    /// Sets the `VARCHAR` length used when a string column has none.
    #[must_use]
    pub fn with_default_string_length(mut self, length: u32) -> Self {
        self.default_string_length = length;
        self
    }

    /// The modifiers in the order they are applied.
    pub fn modifier_order(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().map(|(modifier, _)| *modifier)
    }

    /// Renders a single modifier, whether or not the column carries it.
    pub fn modify(&self, modifier: Modifier, column: &ColumnDefinition) -> Result<Option<String>> {
        match self.modifiers.iter().find(|(m, _)| *m == modifier) {
            Some((_, modify)) => modify(self, column),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Table Creation
    // =========================================================================

    fn compile_create(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let sql = self.compile_create_table(blueprint)?;
        let sql = self.compile_create_encoding(&sql, blueprint, config);
        let mut sql = self.compile_create_engine(&sql, blueprint, config);
        if let Some(comment) = blueprint.table_comment() {
            sql.push_str(" COMMENT ");
            sql.push_str(&quote_string(comment));
        }
        Ok(Some(sql))
    }

    fn compile_create_table(&self, blueprint: &Blueprint) -> Result<String> {
        let mut definitions = self.column_definitions(blueprint)?;
        definitions.extend(
            blueprint
                .fluent_indexes()
                .iter()
                .filter_map(|command| self.inline_index(command)),
        );
        Ok(format!(
            "{} TABLE {} ({})",
            if blueprint.is_temporary() {
                "CREATE TEMPORARY"
            } else {
                "CREATE"
            },
            self.wrap_table(blueprint.table()),
            definitions.join(", ")
        ))
    }

    fn inline_index(&self, command: &Command) -> Option<String> {
        let (keyword, index) = match command {
            Command::Primary(index) if index.inline => {
                return Some(format!("PRIMARY KEY ({})", self.columnize(&index.columns)));
            }
            Command::Unique(index) if index.inline => ("UNIQUE KEY", index),
            Command::Index(index) if index.inline => ("INDEX", index),
            _ => return None,
        };
        Some(format!(
            "{keyword} {} ({})",
            self.wrap(&index.index),
            self.columnize(&index.columns)
        ))
    }

    /// Appends the table character set and collation, taken from the
    /// blueprint or else from the connection.
    #[must_use]
    pub fn compile_create_encoding(
        &self,
        sql: &str,
        blueprint: &Blueprint,
        config: &ConnectionConfig,
    ) -> String {
        let mut sql = String::from(sql);
        if let Some(charset) = blueprint.table_charset().or(config.charset.as_deref()) {
            sql.push_str(" DEFAULT CHARACTER SET ");
            sql.push_str(charset);
        }
        if let Some(collation) = blueprint.table_collation().or(config.collation.as_deref()) {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        sql
    }

    /// Appends the storage engine, taken from the blueprint or else from
    /// the connection.
    #[must_use]
    pub fn compile_create_engine(
        &self,
        sql: &str,
        blueprint: &Blueprint,
        config: &ConnectionConfig,
    ) -> String {
        match blueprint.table_engine().or(config.engine.as_deref()) {
            Some(engine) => format!("{sql} ENGINE = {engine}"),
            None => String::from(sql),
        }
    }

    // =========================================================================
    // Column Commands
    // =========================================================================

    fn compile_add(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let columns = self.column_definitions(blueprint)?;
        if columns.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "ALTER TABLE {} {}",
            self.wrap_table(blueprint.table()),
            self.prefix_array("ADD", &columns).join(", ")
        )))
    }

    fn compile_change(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let table = format!("{}{}", self.table_prefix, blueprint.table());
        let mut blocks = Vec::new();
        for column in blueprint.changed_columns() {
            let new_name = match &column.rename_to {
                Some(name) => serde_json::to_string(name)?,
                None => String::from("NULL"),
            };
            let new_type = serde_json::to_string(&self.column_type(column)?)?;
            blocks.push(alter_column_call(
                &table,
                &column.name,
                [
                    new_name,
                    new_type,
                    self.change_fragment(Modifier::Charset, column)?,
                    self.change_fragment(Modifier::Collation, column)?,
                    self.change_fragment(Modifier::Nullable, column)?,
                    String::from("NULL"),
                    self.change_fragment(Modifier::Default, column)?,
                    self.change_fragment(Modifier::Comment, column)?,
                ],
            ));
        }
        if blocks.is_empty() {
            return Ok(None);
        }
        Ok(Some(blocks.join(";\n\n")))
    }

    // A JSON-encoded modifier fragment, or NULL to keep the current value.
    fn change_fragment(&self, modifier: Modifier, column: &ColumnDefinition) -> Result<String> {
        if !modifier.is_present(column) {
            return Ok(String::from("NULL"));
        }
        match self.modify(modifier, column)? {
            Some(fragment) => Ok(serde_json::to_string(&fragment)?),
            None => Ok(String::from("NULL")),
        }
    }

    fn compile_rename_column(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let Command::RenameColumn { from, to } = command else {
            return Ok(None);
        };
        let table = format!("{}{}", self.table_prefix, blueprint.table());
        let null = || String::from("NULL");
        Ok(Some(alter_column_call(
            &table,
            from,
            [
                serde_json::to_string(to)?,
                null(),
                null(),
                null(),
                null(),
                null(),
                null(),
                null(),
            ],
        )))
    }

    fn compile_drop_column(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let Command::DropColumn { columns } = command else {
            return Ok(None);
        };
        let columns = self.prefix_array("DROP", &self.wrap_array(columns));
        Ok(Some(format!(
            "ALTER TABLE {} {}",
            self.wrap_table(blueprint.table()),
            columns.join(", ")
        )))
    }

    // =========================================================================
    // Table Commands
    // =========================================================================

    fn compile_drop(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(Some(format!("DROP TABLE {}", self.wrap_table(blueprint.table()))))
    }

    fn compile_drop_if_exists(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(Some(format!(
            "DROP TABLE IF EXISTS {}",
            self.wrap_table(blueprint.table())
        )))
    }

    fn compile_rename(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let Command::Rename { to } = command else {
            return Ok(None);
        };
        Ok(Some(format!(
            "RENAME TABLE {} TO {}",
            self.wrap_table(blueprint.table()),
            self.wrap_table(to)
        )))
    }

    fn compile_comment(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let Command::Comment { comment } = command else {
            return Ok(None);
        };
        Ok(Some(format!(
            "ALTER TABLE {} COMMENT {}",
            self.wrap_table(blueprint.table()),
            quote_string(comment)
        )))
    }

    // =========================================================================
    // Index Commands
    // =========================================================================

    fn compile_primary(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(self.standalone_key(blueprint, command, "PRIMARY KEY"))
    }

    fn compile_unique(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(self.standalone_key(blueprint, command, "UNIQUE"))
    }

    fn compile_index(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(self.standalone_key(blueprint, command, "INDEX"))
    }

    fn compile_foreign_command(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        let Command::Foreign(foreign) = command else {
            return Ok(None);
        };
        Ok(Some(self.compile_foreign(blueprint, foreign)))
    }

    // Inline indexes were already rendered inside CREATE TABLE.
    fn standalone_key(&self, blueprint: &Blueprint, command: &Command, kind: &str) -> Option<String> {
        command
            .index_command()
            .filter(|index| !index.inline)
            .map(|index| self.compile_key(blueprint, index, kind))
    }

    /// `ALTER TABLE t ADD <kind> name [USING algorithm] (columns)`.
    ///
    /// An empty `kind` is omitted.
    #[must_use]
    pub fn compile_key(&self, blueprint: &Blueprint, index: &IndexCommand, kind: &str) -> String {
        let mut parts = vec![
            String::from("ALTER TABLE"),
            self.wrap_table(blueprint.table()),
            String::from("ADD"),
        ];
        if !kind.is_empty() {
            parts.push(String::from(kind));
        }
        parts.push(self.wrap(&index.index));
        if let Some(algorithm) = index.algorithm.as_deref().filter(|a| !a.is_empty()) {
            parts.push(format!("USING {algorithm}"));
        }
        parts.push(format!("({})", self.columnize(&index.columns)));
        parts.join(" ")
    }

    fn compile_drop_primary(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(Some(format!(
            "ALTER TABLE {} DROP PRIMARY KEY",
            self.wrap_table(blueprint.table())
        )))
    }

    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(command.index_command().map(|index| {
            format!(
                "ALTER TABLE {} DROP INDEX {}",
                self.wrap_table(blueprint.table()),
                self.wrap(&index.index)
            )
        }))
    }

    fn compile_drop_foreign(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        Ok(command.index_command().map(|index| {
            format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                self.wrap_table(blueprint.table()),
                self.wrap(&index.index)
            )
        }))
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn type_char(&self, column_type: &ColumnType) -> String {
        let length = match column_type {
            ColumnType::Char { length } => *length,
            _ => None,
        };
        format!("CHAR({})", length.unwrap_or(self.default_string_length))
    }

    fn type_string(&self, column_type: &ColumnType) -> String {
        let length = match column_type {
            ColumnType::String { length } => *length,
            _ => None,
        };
        format!("VARCHAR({})", length.unwrap_or(self.default_string_length))
    }

    fn type_double(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Float {
                total: Some(total),
                places: Some(places),
            }
            | ColumnType::Double {
                total: Some(total),
                places: Some(places),
            } => format!("DOUBLE({total}, {places})"),
            _ => String::from("DOUBLE"),
        }
    }

    fn type_decimal(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Decimal {
                total: Some(total),
                places: Some(places),
            } => format!("DECIMAL({total}, {places})"),
            _ => String::from("DECIMAL"),
        }
    }

    fn type_enum(&self, column_type: &ColumnType) -> String {
        let allowed: Vec<String> = match column_type {
            ColumnType::Enum { allowed } => allowed.iter().map(|v| quote_string(v)).collect(),
            _ => Vec::new(),
        };
        format!("ENUM({})", allowed.join(", "))
    }

    fn type_date_time(&self, column_type: &ColumnType) -> String {
        let precision = match column_type {
            ColumnType::DateTime { precision } | ColumnType::DateTimeTz { precision } => *precision,
            _ => 0,
        };
        format!("DATETIME({precision})")
    }

    fn type_timestamp(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Timestamp {
                precision,
                use_current,
            }
            | ColumnType::TimestampTz {
                precision,
                use_current,
            } => {
                if *use_current {
                    format!("TIMESTAMP({precision}) DEFAULT CURRENT_TIMESTAMP")
                } else {
                    format!("TIMESTAMP({precision})")
                }
            }
            _ => String::from("TIMESTAMP"),
        }
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    fn modify_virtual_as(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok(column
            .virtual_as
            .as_deref()
            .filter(|expr| !expr.is_empty())
            .map(|expr| format!(" AS ({expr})")))
    }

    fn modify_stored_as(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok(column
            .stored_as
            .as_deref()
            .filter(|expr| !expr.is_empty())
            .map(|expr| format!(" AS ({expr}) STORED")))
    }

    fn modify_unsigned(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        if column.unsigned.is_none() {
            return Ok(None);
        }
        if !column.column_type.is_numeric() {
            return Err(unsupported(Modifier::Unsigned, column));
        }
        Ok((column.unsigned == Some(true)).then(|| String::from(" UNSIGNED")))
    }

    fn modify_charset(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        let Some(charset) = column.charset.as_deref() else {
            return Ok(None);
        };
        if !column.column_type.is_textual() {
            return Err(unsupported(Modifier::Charset, column));
        }
        Ok(Some(format!(" CHARACTER SET {charset}")))
    }

    fn modify_collation(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        let Some(collation) = column.collation.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        if !column.column_type.is_textual() {
            return Err(unsupported(Modifier::Collation, column));
        }
        Ok(Some(format!(" COLLATE {collation}")))
    }

    fn modify_nullable(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        if column.is_generated() {
            return Ok(None);
        }
        Ok(Some(String::from(if column.nullable == Some(true) {
            " NULL"
        } else {
            " NOT NULL"
        })))
    }

    fn modify_default(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok(column
            .default
            .as_ref()
            .map(|value| format!(" DEFAULT {}", self.default_value(value))))
    }

    fn modify_auto_increment(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        let enabled = column.column_type.is_serial() && column.auto_increment == Some(true);
        Ok(enabled.then(|| String::from(" AUTO_INCREMENT PRIMARY KEY")))
    }

    fn modify_comment(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok(column
            .comment
            .as_deref()
            .map(|comment| format!(" COMMENT {}", quote_string(comment))))
    }

    fn modify_after(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok(column
            .after
            .as_deref()
            .filter(|after| !after.is_empty())
            .map(|after| format!(" AFTER {}", self.wrap(after))))
    }

    fn modify_first(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok((column.first == Some(true)).then(|| String::from(" FIRST")))
    }
}

fn unsupported(modifier: Modifier, column: &ColumnDefinition) -> SchemaError {
    SchemaError::UnsupportedModifier {
        modifier: modifier.name(),
        column: column.name.clone(),
        column_type: column.column_type.name(),
    }
}

// One prepared `TRAMP_ALTER_COLUMN` round trip. `args` are, in order: new
// name, type, charset, collation, nullable, extra, default and comment.
fn alter_column_call(table: &str, column: &str, args: [String; 8]) -> String {
    format!(
        "SET @ddl_sql=TRAMP_ALTER_COLUMN({}, {}, {}); \
         PREPARE stmt FROM @ddl_sql; SET @ddl_sql=''; EXECUTE stmt; DROP PREPARE stmt",
        quote_string(table),
        quote_string(column),
        args.join(", ")
    )
}

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn column_type(&self, column: &ColumnDefinition) -> Result<String> {
        let kind = column.column_type.kind();
        match self.types.get(&kind) {
            Some(render) => Ok(render(self, &column.column_type)),
            None => Err(SchemaError::MissingTypeRenderer {
                grammar: self.name(),
                column: column.name.clone(),
                column_type: kind.name(),
            }),
        }
    }

    fn add_modifiers(
        &self,
        mut sql: String,
        _blueprint: &Blueprint,
        column: &ColumnDefinition,
    ) -> Result<String> {
        for (modifier, modify) in &self.modifiers {
            if !modifier.is_present(column) {
                continue;
            }
            if let Some(fragment) = modify(self, column)? {
                sql.push_str(&fragment);
            }
        }
        Ok(sql)
    }

    fn compile_command(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        match self.compilers.get(&command.kind()) {
            Some(compile) => compile(self, blueprint, command, config),
            None => Ok(None),
        }
    }

    fn compile_table_exists(&self) -> Result<String> {
        Ok(String::from(
            "SELECT * FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
        ))
    }

    fn compile_column_listing(&self) -> Result<String> {
        Ok(String::from(
            "SELECT column_name FROM information_schema.columns WHERE table_schema = ? AND table_name = ?",
        ))
    }

    fn compile_enable_foreign_key_constraints(&self) -> Result<String> {
        Ok(String::from("SET FOREIGN_KEY_CHECKS=1;"))
    }

    fn compile_disable_foreign_key_constraints(&self) -> Result<String> {
        Ok(String::from("SET FOREIGN_KEY_CHECKS=0;"))
    }

    fn initial_sql(&self) -> Vec<String> {
        vec![
            String::from("DROP FUNCTION IF EXISTS `TRAMP_ALTER_COLUMN`"),
            String::from(include_str!("mysql_initialize.sql")),
        ]
    }
}
