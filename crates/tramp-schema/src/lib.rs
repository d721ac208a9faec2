//! # tramp-schema
//!
//! Dialect-neutral table blueprints compiled into DDL statements.
//!
//! This crate provides:
//! - A column and command model for create/alter/drop table changes
//! - [`Blueprint`], the requested changes for one table
//! - The [`Grammar`] trait with shared identifier quoting, and a MySQL
//!   implementation ([`MySqlGrammar`])
//! - A [`Builder`] façade that renders or executes a sequence of blueprints
//! - The [`Connection`] trait that execution and introspection go through
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tramp_schema::{Builder, ConnectionConfig, Expression, ForeignKey, ForeignKeyAction, MySqlGrammar};
//!
//! let mut schema = Builder::new(
//!     Arc::new(MySqlGrammar::new("")),
//!     ConnectionConfig::default().with_engine("InnoDB"),
//! );
//!
//! let posts = schema.create("posts");
//! posts.increments("id");
//! posts.string("title", Some(120)).comment("post title");
//! posts.unsigned_integer("author_id").index();
//! posts.timestamp("created_at", 0).default(Expression::new("CURRENT_TIMESTAMP"));
//! posts.foreign(
//!     ForeignKey::new(["author_id"])
//!         .references(["id"])
//!         .on("users")
//!         .on_delete(ForeignKeyAction::Cascade),
//! );
//!
//! let sql = schema.to_sql().unwrap();
//! assert_eq!(sql.len(), 2);
//! assert!(sql[0].starts_with("CREATE TABLE `posts` ("));
//! assert!(sql[0].ends_with(") ENGINE = InnoDB;"));
//! assert!(sql[1].starts_with("ALTER TABLE `posts` ADD CONSTRAINT `posts_author_id_foreign`"));
//! ```

pub mod blueprint;
pub mod builder;
pub mod column;
pub mod command;
pub mod connection;
pub mod error;
pub mod expression;
pub mod grammar;
pub mod value;

pub use blueprint::Blueprint;
pub use builder::Builder;
pub use column::{ColumnDefinition, ColumnType, DefaultValue, IndexFlag, TypeKind};
pub use command::{
    Command, CommandKind, ForeignKey, ForeignKeyAction, ForeignKeyCommand, Index, IndexCommand,
    IndexTarget,
};
pub use connection::{Connection, ConnectionConfig};
pub use error::{BoxError, ConnectionError, Result, SchemaError};
pub use expression::Expression;
pub use grammar::{Grammar, Modifier, MySqlGrammar};
pub use value::{Parameter, Row, SqlValue};
