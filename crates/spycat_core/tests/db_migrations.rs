use rusqlite::Connection;
use spycat_core::db::migrations::latest_version;
use spycat_core::db::{open_db, open_db_in_memory, DbError};
use spycat_core::{RepoError, SqliteCatRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "cats");
    assert_table_exists(&conn, "missions");
    assert_table_exists(&conn, "targets");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agency.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "missions");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let result = SqliteCatRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::Db(DbError::SchemaNotReady { .. }))
    ));
}

#[test]
fn storage_rejects_half_linked_mission() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO missions (id, description, status) VALUES ('m-1', 'Recon', 'assigned');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

#[test]
fn storage_keeps_target_completion_monotonic() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO missions (id, description) VALUES ('m-1', 'Recon');
         INSERT INTO targets (id, mission_id, seq, name, country, is_completed)
         VALUES ('t-1', 'm-1', 0, 'Mr. Mouse', 'France', 1);",
    )
    .unwrap();

    let err = conn
        .execute("UPDATE targets SET is_completed = 0 WHERE id = 't-1';", [])
        .unwrap_err();
    assert!(err.to_string().contains("cannot be reverted"));

    let err = conn
        .execute_batch(
            "INSERT INTO missions (id, description) VALUES ('m-2', 'Other');
             UPDATE targets SET mission_id = 'm-2' WHERE id = 't-1';",
        )
        .unwrap_err();
    assert!(err.to_string().contains("immutable"));
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
