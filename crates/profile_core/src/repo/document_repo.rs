//! SQLite-backed JSON document backend.
//!
//! # Responsibility
//! - Persist every collection in the `documents` table as JSON text.
//! - Keep insertion order via the table's `seq` column.
//!
//! # Invariants
//! - Ids are random 32-hex strings, unique per collection.
//! - Merges run inside a transaction and bump `updated_at`.
//! - Unique writes check and write in one transaction; the `users` unique
//!   indexes catch writers in other processes.

use super::{
    merge_shallow, BackendKind, Document, DocumentBackend, RepoError, RepoResult, ID_FIELD,
    OWNER_FIELD,
};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::Collection;
use rusqlite::{ffi, params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Document backend over one serialized SQLite connection.
#[derive(Debug)]
pub struct SqliteDocumentBackend {
    conn: Mutex<Connection>,
}

impl SqliteDocumentBackend {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_body(collection: Collection, body: &str) -> RepoResult<Document> {
    serde_json::from_str::<Document>(body).map_err(|err| {
        RepoError::InvalidData(format!(
            "collection `{}` holds a malformed body: {err}",
            collection.name()
        ))
    })
}

fn find_body(conn: &Connection, collection: Collection, id: &str) -> RepoResult<Option<String>> {
    let body = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection.name(), id],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(body)
}

fn insert_row(
    conn: &Connection,
    collection: Collection,
    owner_id: Option<&str>,
    mut document: Document,
) -> RepoResult<Document> {
    let id = Uuid::new_v4().simple().to_string();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    if let Some(owner_id) = owner_id {
        document.insert(OWNER_FIELD.to_string(), Value::String(owner_id.to_string()));
    }
    let body = serde_json::to_string(&document)?;

    conn.execute(
        "INSERT INTO documents (collection, id, owner_id, body) VALUES (?1, ?2, ?3, ?4);",
        params![collection.name(), id, owner_id, body],
    )?;
    Ok(document)
}

/// Fails when `candidate` clashes with any document other than `own_id`.
fn ensure_unique(
    conn: &Connection,
    collection: Collection,
    own_id: &str,
    candidate: &Document,
    unique_fields: &[&str],
) -> RepoResult<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT EXISTS(
            SELECT 1 FROM documents
            WHERE collection = ?1
              AND id <> ?2
              AND json_type(body, ?3) = 'text'
              AND json_extract(body, ?3) = ?4 COLLATE NOCASE
         );",
    )?;
    let mut fields = Vec::new();
    for field in unique_fields {
        let Some(value) = candidate.get(*field).and_then(Value::as_str) else {
            continue;
        };
        let taken: bool = stmt.query_row(
            params![collection.name(), own_id, format!("$.{field}"), value],
            |row| row.get(0),
        )?;
        if taken {
            fields.push((*field).to_string());
        }
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(RepoError::Conflict { fields })
    }
}

/// Maps a unique-index violation from another writer to a conflict.
///
/// Index names follow `idx_<collection>_unique_<field>`.
fn unique_violation(err: RepoError, collection: Collection, unique_fields: &[&str]) -> RepoError {
    let RepoError::Db(DbError::Query(rusqlite::Error::SqliteFailure(failure, message))) =
        &err
    else {
        return err;
    };
    if failure.extended_code != ffi::SQLITE_CONSTRAINT_UNIQUE {
        return err;
    }
    let message = message.as_deref().unwrap_or_default();
    let fields: Vec<String> = unique_fields
        .iter()
        .filter(|field| message.contains(&format!("idx_{}_unique_{field}", collection.name())))
        .map(|field| (*field).to_string())
        .collect();
    if fields.is_empty() {
        err
    } else {
        RepoError::Conflict { fields }
    }
}

fn merge_row(
    conn: &Connection,
    collection: Collection,
    id: &str,
    patch: Document,
) -> RepoResult<Option<Document>> {
    let Some(body) = find_body(conn, collection, id)? else {
        return Ok(None);
    };
    let mut document = parse_body(collection, &body)?;
    merge_shallow(&mut document, patch);

    conn.execute(
        "UPDATE documents
         SET body = ?3,
             updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
         WHERE collection = ?1 AND id = ?2;",
        params![collection.name(), id, serde_json::to_string(&document)?],
    )?;
    Ok(Some(document))
}

impl DocumentBackend for SqliteDocumentBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn insert(
        &self,
        collection: Collection,
        owner_id: Option<&str>,
        document: Document,
    ) -> RepoResult<Document> {
        insert_row(&self.conn(), collection, owner_id, document)
    }

    fn insert_unique(
        &self,
        collection: Collection,
        document: Document,
        unique_fields: &[&str],
    ) -> RepoResult<Document> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ensure_unique(&tx, collection, "", &document, unique_fields)?;
        let stored = insert_row(&tx, collection, None, document)
            .map_err(|err| unique_violation(err, collection, unique_fields))?;
        tx.commit()?;
        Ok(stored)
    }

    fn find_by_id(&self, collection: Collection, id: &str) -> RepoResult<Option<Document>> {
        let conn = self.conn();
        find_body(&conn, collection, id)?
            .map(|body| parse_body(collection, &body))
            .transpose()
    }

    fn find_by_owner(&self, collection: Collection, owner_id: &str) -> RepoResult<Vec<Document>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT body FROM documents
             WHERE collection = ?1 AND owner_id = ?2
             ORDER BY seq ASC;",
        )?;
        let bodies = stmt
            .query_map(params![collection.name(), owner_id], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| parse_body(collection, body))
            .collect()
    }

    fn find_one_ignore_case(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> RepoResult<Option<Document>> {
        let conn = self.conn();
        let body = conn
            .query_row(
                "SELECT body FROM documents
                 WHERE collection = ?1
                   AND json_type(body, ?2) = 'text'
                   AND json_extract(body, ?2) = ?3 COLLATE NOCASE
                 ORDER BY seq ASC
                 LIMIT 1;",
                params![collection.name(), format!("$.{field}"), value],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        body.map(|body| parse_body(collection, &body)).transpose()
    }

    fn merge(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> RepoResult<Option<Document>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let merged = merge_row(&tx, collection, id, patch)?;
        tx.commit()?;
        Ok(merged)
    }

    fn merge_unique(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
        unique_fields: &[&str],
    ) -> RepoResult<Option<Document>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ensure_unique(&tx, collection, id, &patch, unique_fields)?;
        let merged = merge_row(&tx, collection, id, patch)
            .map_err(|err| unique_violation(err, collection, unique_fields))?;
        tx.commit()?;
        Ok(merged)
    }

    fn remove(&self, collection: Collection, id: &str) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection.name(), id],
        )?;
        Ok(changed > 0)
    }

    fn remove_by_owner(&self, collection: Collection, owner_id: &str) -> RepoResult<usize> {
        let changed = self.conn().execute(
            "DELETE FROM documents WHERE collection = ?1 AND owner_id = ?2;",
            params![collection.name(), owner_id],
        )?;
        Ok(changed)
    }
}
