use rusqlite::Connection;
use shelf_core::db::migrations::{apply_migrations, latest_version};
use shelf_core::db::{ensure_schema_current, open_connection, DbError};
use shelf_core::{DaoError, SqliteSessionFactory, StoreConfig};
use std::time::Duration;

#[test]
fn factory_bootstrap_applies_all_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelf.db");
    SqliteSessionFactory::new(&StoreConfig::file(&path)).unwrap();

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "authors");
    assert_table_exists(&conn, "books");
}

#[test]
fn bootstrapping_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelf.db");

    drop(SqliteSessionFactory::new(&StoreConfig::file(&path)).unwrap());
    drop(SqliteSessionFactory::new(&StoreConfig::file(&path)).unwrap());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn database_with_newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = SqliteSessionFactory::new(&StoreConfig::file(&path))
        .err()
        .expect("newer schema must be rejected");
    match err {
        DaoError::Db(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unmigrated_connection_is_not_current() {
    let conn = open_connection(":memory:", Duration::from_millis(100), true).unwrap();
    match ensure_schema_current(&conn) {
        Err(DbError::SchemaNotCurrent {
            db_version: 0,
            expected_version,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(()) => panic!("expected schema check to fail"),
    }
}

#[test]
fn migrated_connection_enforces_isbn_uniqueness() {
    let mut conn = open_connection(":memory:", Duration::from_millis(100), true).unwrap();
    apply_migrations(&mut conn).unwrap();
    ensure_schema_current(&conn).unwrap();

    conn.execute(
        "INSERT INTO books (title, isbn) VALUES ('A', '978-1');",
        [],
    )
    .unwrap();
    let err = conn
        .execute("INSERT INTO books (title, isbn) VALUES ('B', '978-1');", [])
        .unwrap_err();
    assert!(matches!(
        DaoError::from(err),
        DaoError::ConstraintViolation { .. }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
