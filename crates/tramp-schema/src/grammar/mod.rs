//! Dialect grammars.
//!
//! A [`Grammar`] turns blueprint commands into SQL text. The trait's default
//! methods implement the dialect-neutral parts: identifier wrapping, table
//! prefixes, aliases, parameter placeholders and default-value literals.
//! Dialects supply the command compilers, type renderers and modifiers.

mod mysql;

pub use mysql::{Modifier, MySqlGrammar};

use crate::blueprint::Blueprint;
use crate::column::{ColumnDefinition, DefaultValue};
use crate::command::{Command, ForeignKeyCommand};
use crate::connection::ConnectionConfig;
use crate::error::{Result, SchemaError};
use crate::value::Parameter;

/// Renders schema commands for one SQL dialect.
pub trait Grammar: Send + Sync {
    /// Returns the grammar name.
    fn name(&self) -> &'static str;

    /// Prefix prepended to every table name.
    fn table_prefix(&self) -> &str;

    /// The identifier quote character.
    fn quote_char(&self) -> char {
        '"'
    }

    // =========================================================================
    // Identifier Wrapping
    // =========================================================================

    /// Quotes a single identifier segment, doubling embedded quotes.
    /// `*` is never quoted.
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return String::from(value);
        }
        let q = self.quote_char();
        let escaped = value.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Wraps a possibly dotted and aliased identifier.
    ///
    /// In `users.id` the first segment is a table and receives the prefix.
    /// `col as alias` is split case-insensitively.
    fn wrap(&self, value: &str) -> String {
        wrap_identifier(self, value, false, true)
    }

    /// Wraps a table name, applying the prefix once to the table and to its
    /// alias.
    fn wrap_table(&self, table: &str) -> String {
        let prefixed = format!("{}{}", self.table_prefix(), table);
        wrap_identifier(self, &prefixed, true, false)
    }

    /// Wraps each value.
    fn wrap_array(&self, values: &[String]) -> Vec<String> {
        values.iter().map(|v| self.wrap(v)).collect()
    }

    /// Wraps columns and joins them with `, `.
    fn columnize(&self, columns: &[String]) -> String {
        self.wrap_array(columns).join(", ")
    }

    /// Prepends `prefix` and a space to each value.
    fn prefix_array(&self, prefix: &str, values: &[String]) -> Vec<String> {
        values.iter().map(|v| format!("{prefix} {v}")).collect()
    }

    // =========================================================================
    // Literals
    // =========================================================================

    /// `?` for bound values, the literal text for expressions.
    fn parameter(&self, parameter: &Parameter) -> String {
        match parameter {
            Parameter::Value(_) => String::from("?"),
            Parameter::Expression(expr) => String::from(expr.value()),
        }
    }

    fn parameterize(&self, parameters: &[Parameter]) -> String {
        parameters
            .iter()
            .map(|p| self.parameter(p))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders a column default as a SQL literal.
    fn default_value(&self, value: &DefaultValue) -> String {
        match value {
            DefaultValue::Expression(expr) => String::from(expr.value()),
            DefaultValue::Null => String::from("NULL"),
            DefaultValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
            DefaultValue::Int(i) => quote_string(&i.to_string()),
            DefaultValue::Float(f) => quote_string(&f.to_string()),
            DefaultValue::Text(s) => quote_string(s),
        }
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Renders the SQL type of a column.
    fn column_type(&self, column: &ColumnDefinition) -> Result<String>;

    /// Appends the column's modifiers to its definition.
    fn add_modifiers(
        &self,
        sql: String,
        _blueprint: &Blueprint,
        _column: &ColumnDefinition,
    ) -> Result<String> {
        Ok(sql)
    }

    /// Full definitions of the blueprint's added columns.
    fn column_definitions(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        blueprint
            .added_columns()
            .map(|column| {
                let sql = format!("{} {}", self.wrap(&column.name), self.column_type(column)?);
                self.add_modifiers(sql, blueprint, column)
            })
            .collect()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Compiles one command. `Ok(None)` means the grammar emits nothing for
    /// it.
    fn compile_command(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        _config: &ConnectionConfig,
    ) -> Result<Option<String>> {
        match command {
            Command::Foreign(foreign) => Ok(Some(self.compile_foreign(blueprint, foreign))),
            _ => Ok(None),
        }
    }

    /// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY ...`.
    fn compile_foreign(&self, blueprint: &Blueprint, foreign: &ForeignKeyCommand) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.wrap_table(blueprint.table()),
            self.wrap(&foreign.index),
            self.columnize(&foreign.columns),
            self.wrap_table(&foreign.on),
            self.columnize(&foreign.references),
        );
        if let Some(action) = foreign.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = foreign.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    /// Query checking that a table exists; binds schema and table name.
    fn compile_table_exists(&self) -> Result<String> {
        Err(self.not_implemented("compile_table_exists"))
    }

    /// Query listing a table's columns; binds schema and table name.
    fn compile_column_listing(&self) -> Result<String> {
        Err(self.not_implemented("compile_column_listing"))
    }

    fn compile_enable_foreign_key_constraints(&self) -> Result<String> {
        Err(self.not_implemented("compile_enable_foreign_key_constraints"))
    }

    fn compile_disable_foreign_key_constraints(&self) -> Result<String> {
        Err(self.not_implemented("compile_disable_foreign_key_constraints"))
    }

    /// Statements a migration run executes before anything else.
    fn initial_sql(&self) -> Vec<String> {
        Vec::new()
    }

    #[doc(hidden)]
    fn not_implemented(&self, capability: &'static str) -> SchemaError {
        SchemaError::NotImplemented {
            capability,
            grammar: self.name(),
        }
    }
}

/// Single-quotes a string literal, doubling embedded quotes.
#[must_use]
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Finds ` as ` case-insensitively, returning the byte range of the keyword.
fn find_alias(value: &str) -> Option<(usize, usize)> {
    let lower = value.to_ascii_lowercase();
    lower.find(" as ").map(|start| (start, start + 4))
}

fn wrap_identifier<G: Grammar + ?Sized>(
    grammar: &G,
    value: &str,
    prefix_alias: bool,
    prefix_first_segment: bool,
) -> String {
    if let Some((start, end)) = find_alias(value) {
        let target = value[..start].trim();
        let alias = value[end..].trim();
        let alias = if prefix_alias {
            format!("{}{}", grammar.table_prefix(), alias)
        } else {
            String::from(alias)
        };
        return format!(
            "{} AS {}",
            wrap_identifier(grammar, target, false, prefix_first_segment),
            grammar.wrap_value(&alias)
        );
    }

    let segments: Vec<&str> = value.split('.').collect();
    let dotted = segments.len() > 1;
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i == 0 && dotted && prefix_first_segment {
                grammar.wrap_value(&format!("{}{}", grammar.table_prefix(), segment))
            } else {
                grammar.wrap_value(segment)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::value::SqlValue;

    struct AnsiGrammar {
        prefix: String,
    }

    impl Grammar for AnsiGrammar {
        fn name(&self) -> &'static str {
            "ansi"
        }

        fn table_prefix(&self) -> &str {
            &self.prefix
        }

        fn column_type(&self, column: &ColumnDefinition) -> Result<String> {
            Ok(String::from(column.column_type.name()))
        }
    }

    fn grammar(prefix: &str) -> AnsiGrammar {
        AnsiGrammar {
            prefix: String::from(prefix),
        }
    }

    #[test]
    fn test_wrap_value() {
        let g = grammar("");
        assert_eq!(g.wrap_value("users"), "\"users\"");
        assert_eq!(g.wrap_value("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(g.wrap_value("*"), "*");
    }

    #[test]
    fn test_wrap_segments_and_prefix() {
        let g = grammar("app_");
        assert_eq!(g.wrap("id"), "\"id\"");
        assert_eq!(g.wrap("users.id"), "\"app_users\".\"id\"");
        assert_eq!(g.wrap("users.*"), "\"app_users\".*");
        assert_eq!(g.wrap_table("users"), "\"app_users\"");
    }

    #[test]
    fn test_wrap_alias() {
        let g = grammar("app_");
        assert_eq!(g.wrap("name AS n"), "\"name\" AS \"n\"");
        assert_eq!(g.wrap("users.name as n"), "\"app_users\".\"name\" AS \"n\"");
        assert_eq!(g.wrap_table("users as u"), "\"app_users\" AS \"app_u\"");
    }

    #[test]
    fn test_columnize() {
        let g = grammar("");
        let cols = vec![String::from("a"), String::from("b")];
        assert_eq!(g.columnize(&cols), "\"a\", \"b\"");
        assert_eq!(g.prefix_array("DROP", &cols), vec!["DROP a", "DROP b"]);
    }

    #[test]
    fn test_parameterize() {
        let g = grammar("");
        let params = vec![
            Parameter::Value(SqlValue::Int(1)),
            Parameter::Expression(Expression::new("NOW()")),
            Parameter::from("x"),
        ];
        assert_eq!(g.parameterize(&params), "?, NOW(), ?");
    }

    #[test]
    fn test_default_value() {
        let g = grammar("");
        assert_eq!(g.default_value(&DefaultValue::Null), "NULL");
        assert_eq!(g.default_value(&DefaultValue::Bool(true)), "1");
        assert_eq!(g.default_value(&DefaultValue::Bool(false)), "0");
        assert_eq!(g.default_value(&DefaultValue::Int(3)), "'3'");
        assert_eq!(g.default_value(&DefaultValue::from("it's")), "'it''s'");
        assert_eq!(
            g.default_value(&DefaultValue::Expression(Expression::new("CURRENT_TIMESTAMP"))),
            "CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_unimplemented_capabilities() {
        let g = grammar("");
        let err = g.compile_table_exists().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::NotImplemented {
                capability: "compile_table_exists",
                grammar: "ansi"
            }
        ));
        assert!(g.compile_column_listing().is_err());
        assert!(g.initial_sql().is_empty());
    }

    #[test]
    fn test_base_grammar_only_compiles_foreign_keys() {
        let g = grammar("");
        let mut table = Blueprint::new("posts");
        table.foreign(
            crate::command::ForeignKey::new(["author_id"])
                .references(["id"])
                .on("users")
                .on_delete(crate::command::ForeignKeyAction::Cascade),
        );
        table.drop();
        let sql = table.to_sql(&g, &ConnectionConfig::default()).unwrap();
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_author_id_foreign\" \
                 FOREIGN KEY (\"author_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE;"
            ]
        );
    }
}
