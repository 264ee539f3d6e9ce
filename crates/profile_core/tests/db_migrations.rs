use profile_core::db::migrations::{latest_version, schema_version};
use profile_core::db::{open_db, open_db_in_memory, DbError};
use profile_core::repo::{DocumentBackend, SqliteDocumentBackend};
use profile_core::{Collection, Storage};
use rusqlite::Connection;
use std::sync::Arc;

#[test]
fn in_memory_database_gets_documents_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "documents");
    assert_index_exists(&conn, "idx_documents_owner");
}

#[test]
fn reopening_file_keeps_schema_and_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.db");

    let backend = SqliteDocumentBackend::open(&path).unwrap();
    let stored = backend
        .insert(Collection::Topics, Some("owner"), serde_json::Map::new())
        .unwrap();
    drop(backend);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let owner: String = conn
        .query_row(
            "SELECT owner_id FROM documents WHERE collection = 'topics' AND id = ?1;",
            [stored["id"].as_str().unwrap()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(owner, "owner");
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::NewerSchema { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn open_failure_names_the_database_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("profile.db");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Open { .. }));
    assert!(err.to_string().contains("profile.db"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn user_keys_are_unique_ignoring_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    assert_index_exists(&conn, "idx_users_unique_username");
    assert_index_exists(&conn, "idx_users_unique_email");

    conn.execute(
        "INSERT INTO documents (collection, id, body)
         VALUES ('users', 'a', '{\"username\":\"ada\",\"email\":\"ada@example.com\"}');",
        [],
    )
    .unwrap();
    let clash = conn.execute(
        "INSERT INTO documents (collection, id, body)
         VALUES ('users', 'b', '{\"username\":\"ADA\",\"email\":\"other@example.com\"}');",
        [],
    );
    assert!(clash.is_err());

    conn.execute(
        "INSERT INTO documents (collection, id, owner_id, body)
         VALUES ('topics', 't', 'a', '{\"username\":\"ada\"}');",
        [],
    )
    .unwrap();
}

#[test]
fn malformed_json_body_cannot_be_stored() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO documents (collection, id, body) VALUES ('topics', 'x', 'not json');",
        [],
    );
    assert!(result.is_err());

    let storage = Storage::with_backend(Arc::new(SqliteDocumentBackend::from_connection(conn)));
    assert!(storage.get_user("x").unwrap().is_none());
}

fn assert_table_exists(conn: &Connection, name: &str) {
    assert_schema_object(conn, "table", name);
}

fn assert_index_exists(conn: &Connection, name: &str) {
    assert_schema_object(conn, "index", name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
