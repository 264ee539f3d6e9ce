//! Persistence backends behind one document-oriented contract.
//!
//! # Responsibility
//! - Define [`DocumentBackend`], the strategy interface every backend implements.
//! - Keep JSON document handling (merge, conversion) in one place.
//!
//! # Invariants
//! - Backends assign `id` on insert and stamp `userId` for owned collections.
//! - `id` and `userId` are never rewritten by a merge.
//! - Absence is reported as `None`/`false`, never as an error.
//! - Backends do not validate; callers validate before writing. The one
//!   exception is uniqueness, which only the backend can check atomically.

use crate::db::DbError;
use crate::model::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document_repo;
pub mod memory_repo;

pub use document_repo::SqliteDocumentBackend;
pub use memory_repo::MemoryBackend;

/// One stored JSON object.
pub type Document = serde_json::Map<String, Value>;

pub type RepoResult<T> = Result<T, RepoError>;

pub const ID_FIELD: &str = "id";
pub const OWNER_FIELD: &str = "userId";

/// Persistence-level failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    /// Another document already holds these unique fields.
    Conflict { fields: Vec<String> },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document: {message}"),
            Self::Conflict { fields } => {
                write!(f, "duplicate value for unique field(s): {}", fields.join(", "))
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::Conflict { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Which backend a storage facade runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Document,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Document => "document",
        }
    }
}

/// Document store contract shared by the memory and SQLite backends.
pub trait DocumentBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Stores `document`, assigning a fresh id; returns the stored document.
    fn insert(
        &self,
        collection: Collection,
        owner_id: Option<&str>,
        document: Document,
    ) -> RepoResult<Document>;

    /// Inserts an ownerless document unless another document already holds
    /// one of its `unique_fields` (text, ASCII case-insensitive).
    ///
    /// The check and the write happen atomically; a clash yields
    /// [`RepoError::Conflict`] naming every clashing field.
    fn insert_unique(
        &self,
        collection: Collection,
        document: Document,
        unique_fields: &[&str],
    ) -> RepoResult<Document>;

    fn find_by_id(&self, collection: Collection, id: &str) -> RepoResult<Option<Document>>;

    /// Lists an owner's documents in insertion order.
    fn find_by_owner(&self, collection: Collection, owner_id: &str) -> RepoResult<Vec<Document>>;

    /// Finds the first document whose string `field` equals `value`, ignoring ASCII case.
    fn find_one_ignore_case(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> RepoResult<Option<Document>>;

    /// Shallow-merges `patch` into a stored document; `None` when absent.
    fn merge(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> RepoResult<Option<Document>>;

    /// Like [`merge`](Self::merge), but refuses a patch whose `unique_fields`
    /// clash with another document, atomically.
    fn merge_unique(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
        unique_fields: &[&str],
    ) -> RepoResult<Option<Document>>;

    /// Deletes one document; `false` when absent.
    fn remove(&self, collection: Collection, id: &str) -> RepoResult<bool>;

    /// Deletes every document of `owner_id`; returns the number removed.
    fn remove_by_owner(&self, collection: Collection, owner_id: &str) -> RepoResult<usize>;
}

/// Overwrites top-level keys of `target` with `patch`, except `id`/`userId`.
pub fn merge_shallow(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        if key == ID_FIELD || key == OWNER_FIELD {
            continue;
        }
        target.insert(key, value);
    }
}

/// Serializes a typed value into a JSON object document.
pub fn to_document<T: Serialize>(value: &T) -> RepoResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(RepoError::InvalidData(format!(
            "expected a JSON object, got `{other}`"
        ))),
    }
}

/// Deserializes a stored document into a typed record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> RepoResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// The `unique_fields` of `candidate` whose text value one of `others` already holds.
fn clashing_fields<'a>(
    candidate: &Document,
    unique_fields: &[&str],
    others: impl Iterator<Item = &'a Document> + Clone,
) -> Vec<String> {
    let mut clashes = Vec::new();
    for field in unique_fields {
        let Some(value) = candidate.get(*field).and_then(Value::as_str) else {
            continue;
        };
        if others
            .clone()
            .any(|other| field_matches_ignore_case(other, field, value))
        {
            clashes.push((*field).to_string());
        }
    }
    clashes
}

fn field_matches_ignore_case(document: &Document, field: &str, value: &str) -> bool {
    document
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|stored| stored.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::{
        clashing_fields, field_matches_ignore_case, merge_shallow, to_document, Document,
    };
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    #[test]
    fn merge_keeps_identity_fields() {
        let mut target = doc(json!({"id": "edu_1", "userId": "1", "degree": "BSc"}));
        merge_shallow(
            &mut target,
            doc(json!({"id": "hijack", "userId": "2", "degree": "MSc", "description": null})),
        );
        assert_eq!(target["id"], "edu_1");
        assert_eq!(target["userId"], "1");
        assert_eq!(target["degree"], "MSc");
        assert!(target["description"].is_null());
    }

    #[test]
    fn to_document_rejects_non_objects() {
        assert!(to_document(&"plain string").is_err());
    }

    #[test]
    fn ignore_case_match_is_ascii_only_and_typed() {
        let document = doc(json!({"username": "Ada", "age": 3}));
        assert!(field_matches_ignore_case(&document, "username", "aDA"));
        assert!(!field_matches_ignore_case(&document, "age", "3"));
        assert!(!field_matches_ignore_case(&document, "missing", "x"));
    }

    #[test]
    fn clashes_report_only_taken_text_fields() {
        let stored = [doc(json!({"username": "Ada", "email": "ada@example.com"}))];
        let candidate = doc(json!({"username": "ADA", "email": "new@example.com", "age": 3}));
        assert_eq!(
            clashing_fields(&candidate, &["username", "email", "age"], stored.iter()),
            vec!["username".to_string()]
        );
        assert!(clashing_fields(&candidate, &["username"], std::iter::empty()).is_empty());
    }
}
