//! Migrator behavior against a recording connection.

mod common;

use std::path::Path;

use common::{create_table_json, introspected_schemas, migrator, single_root, write_file};
use tempfile::TempDir;
use tramp_migrate::prelude::*;
use tramp_schema::SqlValue;

fn names(pending: &[PendingMigration]) -> Vec<&str> {
    pending.iter().map(|m| m.file.as_str()).collect()
}

#[tokio::test]
async fn test_initialize_runs_setup_once() {
    let dir = TempDir::new().unwrap();
    let (mut migrator, state) = migrator(single_root(dir.path()));

    migrator.initialize().await.unwrap();
    {
        let state = state.lock();
        assert!(state.connected);
        assert!(state.table_created);
        let executed: Vec<&str> = state.executed.iter().map(|(sql, _)| sql.as_str()).collect();
        assert_eq!(executed[0], "DROP FUNCTION IF EXISTS `TRAMP_ALTER_COLUMN`");
        assert!(executed[1].starts_with("CREATE FUNCTION `TRAMP_ALTER_COLUMN`"));
        let create = executed
            .iter()
            .find(|sql| sql.starts_with("CREATE TABLE"))
            .unwrap();
        assert!(create.starts_with("CREATE TABLE `tramp_migrations` ("));
        assert!(create.contains("`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY"));
        assert!(create.contains("`path` VARCHAR(255) DEFAULT ''"));
        assert!(create.contains("`ran_sql` TEXT"));
        assert!(create.contains("DEFAULT CURRENT_TIMESTAMP"));
        assert!(create.contains("(`migration`)"));
    }

    migrator.initialize().await.unwrap();
    let creates = state
        .lock()
        .executed
        .iter()
        .filter(|(sql, _)| sql.starts_with("CREATE TABLE"))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn test_initialize_with_url_only_config() {
    let dir = TempDir::new().unwrap();
    let config = MigratorConfig::from_json(
        r#"{"paths": ["."], "connection": {"url": "mysql://root@db/app"}}"#,
        dir.path(),
    )
    .unwrap();
    let (mut migrator, state) = migrator(config);

    migrator.initialize().await.unwrap();
    migrator.initialize().await.unwrap();

    let state = state.lock();
    assert_eq!(
        introspected_schemas(&state),
        vec![SqlValue::from("app"), SqlValue::from("app")]
    );
    let creates = state
        .executed
        .iter()
        .filter(|(sql, _)| sql.starts_with("CREATE TABLE"))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn test_database_url_override_is_introspected() {
    let dir = TempDir::new().unwrap();
    let config = single_root(dir.path()).with_database_url("mysql://root@db/billing");
    let (mut migrator, state) = migrator(config);

    migrator.initialize().await.unwrap();
    assert_eq!(
        introspected_schemas(&state.lock()),
        vec![SqlValue::from("billing")]
    );
}

#[tokio::test]
async fn test_pending_excludes_recorded_files() {
    let dir = TempDir::new().unwrap();
    for name in ["D.json", "B.json", "A.json", "C.json"] {
        write_file(dir.path(), name, &create_table_json("t"));
    }
    write_file(dir.path(), "notes.txt", "not a change-set");
    std::fs::create_dir(dir.path().join("nested.json")).unwrap();

    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    {
        let mut state = state.lock();
        state.record("A.json", "");
        state.record("C.json", "");
    }

    let pending = migrator.pending_migrations().await.unwrap();
    assert_eq!(names(&pending), vec!["B.json", "D.json"]);
    assert_eq!(pending[0].path, dir.path());
}

#[tokio::test]
async fn test_pending_sorted_across_roots() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_file(first.path(), "0002_b.json", &create_table_json("b"));
    write_file(second.path(), "0001_a.json", &create_table_json("a"));
    write_file(second.path(), "0003_c.json", &create_table_json("c"));

    let mut config = MigratorConfig::new(first.path());
    config.add_path(first.path());
    config.add_path(second.path());
    config.add_path(first.path().join("missing"));
    let (mut migrator, _state) = migrator(config);
    migrator.initialize().await.unwrap();

    let pending = migrator.pending_migrations().await.unwrap();
    assert_eq!(names(&pending), vec!["0001_a.json", "0002_b.json", "0003_c.json"]);
    assert_eq!(pending[0].path, second.path());
}

#[tokio::test]
async fn test_duplicate_file_names_fail_before_execution() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_file(first.path(), "0001_x.json", &create_table_json("from_first"));
    write_file(second.path(), "0001_x.json", &create_table_json("from_second"));

    let mut config = single_root(first.path());
    config.add_path(second.path());
    let (mut migrator, state) = migrator(config);
    migrator.initialize().await.unwrap();

    let err = migrator.run(&RunOptions::default()).await.unwrap_err();
    match err {
        MigrateError::DuplicateMigration { file, first: a, second: b } => {
            assert_eq!(file, "0001_x.json");
            let mut dirs = vec![a, b];
            dirs.sort();
            let mut expected = vec![first.path().to_path_buf(), second.path().to_path_buf()];
            expected.sort();
            assert_eq!(dirs, expected);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        migrator.pending_migrations().await,
        Err(MigrateError::DuplicateMigration { .. })
    ));

    let state = state.lock();
    assert!(state.schema_statements().is_empty());
    assert!(state.records.is_empty());
}

#[tokio::test]
async fn test_migration_sql_both_directions() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    let (migrator, _state) = migrator(single_root(dir.path()));

    let migration = migrator.find_migration("0001_users.json").unwrap();
    assert_eq!(
        migrator.migration_sql(&migration, Direction::Up).unwrap(),
        vec!["CREATE TABLE `users` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);"]
    );
    assert_eq!(
        migrator.migration_sql(&migration, Direction::Down).unwrap(),
        vec!["DROP TABLE IF EXISTS `users`;"]
    );

    let err = migrator.find_migration("0009_missing.json").unwrap_err();
    assert!(matches!(err, MigrateError::MigrationNotFound(_)));
}

#[tokio::test]
async fn test_run_executes_and_records() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    write_file(dir.path(), "0002_posts.json", &create_table_json("posts"));
    write_file(dir.path(), "0003_empty.json", r#"{"up": []}"#);

    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    let summary = migrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(
        summary.migrated,
        vec!["0001_users.json", "0002_posts.json", "0003_empty.json"]
    );
    assert!(summary.skipped.is_empty());

    let state = state.lock();
    assert_eq!(
        state.schema_statements(),
        vec![
            "CREATE TABLE `users` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);",
            "CREATE TABLE `posts` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);",
        ]
    );
    assert_eq!(
        state.recorded(),
        vec!["0001_users.json", "0002_posts.json", "0003_empty.json"]
    );
    assert_eq!(
        state.records[0].ran_sql,
        "CREATE TABLE `users` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);"
    );
    assert_eq!(state.records[0].path, "");
    assert_eq!(state.records[2].ran_sql, "");
}

#[tokio::test]
async fn test_skipped_migration_is_recorded_not_run() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    write_file(dir.path(), "0002_posts.json", &create_table_json("posts"));

    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    let summary = migrator
        .run(&RunOptions::default().skip(["0001_users.json"]))
        .await
        .unwrap();

    assert_eq!(summary.skipped, vec!["0001_users.json"]);
    assert_eq!(summary.migrated, vec!["0002_posts.json"]);
    {
        let state = state.lock();
        assert_eq!(state.records[0].ran_sql, "skipped");
        assert!(state
            .schema_statements()
            .iter()
            .all(|sql| !sql.contains("`users`")));
    }

    assert!(migrator.pending_migrations().await.unwrap().is_empty());
    let history = migrator.history(20).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].migration, "0002_posts.json");
    assert!(history[1].is_skipped());
}

#[tokio::test]
async fn test_failing_statement_stops_the_run() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    write_file(
        dir.path(),
        "0002_cleanup.json",
        r#"{"up": [
            {"action": "raw", "sql": "SET FOREIGN_KEY_CHECKS=0"},
            {"action": "drop", "table": "legacy"},
            {"action": "raw", "sql": "SET FOREIGN_KEY_CHECKS=1"}
        ]}"#,
    );
    write_file(dir.path(), "0003_posts.json", &create_table_json("posts"));

    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    state.lock().fail_on = Some(String::from("DROP TABLE `legacy`"));

    let err = migrator.run(&RunOptions::default()).await.unwrap_err();
    match err {
        MigrateError::Statement {
            file,
            sql,
            completed,
            ..
        } => {
            assert_eq!(file, "0002_cleanup.json");
            assert_eq!(sql, "DROP TABLE `legacy`;");
            assert_eq!(completed, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    let state = state.lock();
    assert_eq!(state.recorded(), vec!["0001_users.json"]);
    assert!(state
        .schema_statements()
        .iter()
        .all(|sql| !sql.contains("`posts`")));
}

#[tokio::test]
async fn test_load_failure_aborts_before_execution() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    write_file(dir.path(), "0002_broken.json", r#"{"up": [{"action": "#);

    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();

    let err = migrator.run(&RunOptions::default()).await.unwrap_err();
    match err {
        MigrateError::Load { path, .. } => {
            assert_eq!(path, dir.path().join("0002_broken.json"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let state = state.lock();
    assert!(state.schema_statements().is_empty());
    assert!(state.records.is_empty());
}

#[tokio::test]
async fn test_mark_as_migrated_twice_fails() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));

    let (mut migrator, _state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    let migration = PendingMigration::new(dir.path(), "0001_users.json");

    migrator
        .mark_as_migrated(&migration, RanSql::Skipped)
        .await
        .unwrap();
    let err = migrator
        .mark_as_migrated(&migration, RanSql::Skipped)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::AlreadyMigrated(file) if file == "0001_users.json"));
}

#[tokio::test]
async fn test_path_recorded_with_several_roots() {
    let base = TempDir::new().unwrap();
    std::fs::create_dir(base.path().join("core")).unwrap();
    std::fs::create_dir(base.path().join("billing")).unwrap();
    write_file(&base.path().join("billing"), "0001_invoices.json", &create_table_json("invoices"));

    let config = MigratorConfig::from_json(r#"{"paths": "core,billing/"}"#, base.path()).unwrap();
    let (mut migrator, state) = migrator(config);
    migrator.initialize().await.unwrap();
    migrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(state.lock().records[0].path, "billing");
}

struct Team;

impl AuthorsLookup for Team {
    fn authors(&self, path: &Path) -> Option<String> {
        path.file_name()
            .map(|name| format!("alice <{}>", name.to_string_lossy()))
    }
}

#[tokio::test]
async fn test_authors_are_recorded() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));

    let (migrator, state) = migrator(single_root(dir.path()));
    let mut migrator = migrator.with_authors(Team);
    migrator.initialize().await.unwrap();
    migrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(state.lock().records[0].authors, "alice <0001_users.json>");
}

#[tokio::test]
async fn test_dump_preview() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    write_file(dir.path(), "0002_posts.json", &create_table_json("posts"));

    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    state.lock().record("0001_users.json", "");

    let preview = migrator.dump_preview(false).await.unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview.entries[0].file, "0002_posts.json");
    assert_eq!(
        preview.entries[0].sql.as_deref(),
        Some(&["CREATE TABLE `posts` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);".to_string()][..])
    );

    let summary = migrator.dump_preview(true).await.unwrap();
    assert!(summary.entries[0].sql.is_none());
    assert!(summary.to_string().contains("0002_posts.json"));

    // Previewing never executes or records anything.
    let state = state.lock();
    assert!(state.schema_statements().is_empty());
    assert_eq!(state.records.len(), 1);
}

#[tokio::test]
async fn test_table_prefix_applies_to_bookkeeping() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    let config = MigratorConfig::from_json(r#"{"tablePrefix": "app_", "paths": ["."]}"#, dir.path())
        .unwrap();

    let (mut migrator, state) = migrator(config);
    migrator.initialize().await.unwrap();
    migrator.run(&RunOptions::default()).await.unwrap();

    let state = state.lock();
    assert!(state
        .executed
        .iter()
        .any(|(sql, _)| sql.starts_with("INSERT INTO `app_tramp_migrations`")));
    assert_eq!(
        state.schema_statements(),
        vec!["CREATE TABLE `app_users` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY);"]
    );
}

struct AddSlug;

impl ChangeSet for AddSlug {
    fn up(&self, schema: &mut Builder) {
        schema.table("users").string("slug", Some(64)).nullable();
    }
}

#[tokio::test]
async fn test_registered_change_sets_mix_with_json() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "0001_users.json", &create_table_json("users"));
    write_file(dir.path(), "0002_slug.rs", "");
    write_file(dir.path(), "0003_unregistered.rs", "");

    let (migrator, state) = migrator(single_root(dir.path()));
    let mut migrator =
        migrator.with_loader(ChangeSetRegistry::new().register("0002_slug.rs", AddSlug));
    migrator.initialize().await.unwrap();
    let summary = migrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(summary.migrated, vec!["0001_users.json", "0002_slug.rs"]);
    assert_eq!(
        state.lock().schema_statements()[1],
        "ALTER TABLE `users` ADD `slug` VARCHAR(64) NULL;"
    );
}

#[tokio::test]
async fn test_close() {
    let dir = TempDir::new().unwrap();
    let (mut migrator, state) = migrator(single_root(dir.path()));
    migrator.initialize().await.unwrap();
    migrator.close().await.unwrap();
    assert!(state.lock().closed);
}
