//! Typed storage facade over a [`DocumentBackend`].
//!
//! # Responsibility
//! - Turn typed users and owned records into documents and back.
//! - Provide the user operations and the generic owned-record operations.
//!
//! # Invariants
//! - The facade never checks ownership; services do.
//! - Deleting a user deletes every record it owns.
//! - User writes that would duplicate a username or email fail with
//!   [`RepoError::Conflict`](crate::repo::RepoError::Conflict).
//! - Listings are ordered by [`OwnedRecord::sort_listing`].

use crate::model::user::{NewUser, ProfilePatch, User};
use crate::model::{Collection, OwnedRecord};
use crate::repo::{
    from_document, to_document, BackendKind, DocumentBackend, MemoryBackend, RepoResult,
    SqliteDocumentBackend,
};
use log::info;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

/// User fields that are unique under ASCII case folding.
pub const USER_UNIQUE_FIELDS: &[&str] = &["username", "email"];

/// Which backend to construct at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Process-local maps; data is lost on exit.
    Memory,
    /// SQLite JSON document file at `path`.
    Document { path: PathBuf },
}

/// Cheaply clonable handle shared by request handlers.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn DocumentBackend>,
}

impl Debug for Storage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.backend.kind())
            .finish()
    }
}

impl Storage {
    /// Builds the backend chosen by `config`.
    pub fn open(config: &BackendConfig) -> RepoResult<Self> {
        let storage = match config {
            BackendConfig::Memory => Self::in_memory(),
            BackendConfig::Document { path } => {
                Self::with_backend(Arc::new(SqliteDocumentBackend::open(path)?))
            }
        };
        info!(
            "event=storage_open module=storage status=ok backend={}",
            storage.backend_kind().label()
        );
        Ok(storage)
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        self.backend
            .find_by_id(Collection::Users, id)?
            .map(from_document)
            .transpose()
    }

    /// Case-insensitive username lookup.
    pub fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.backend
            .find_one_ignore_case(Collection::Users, "username", username)?
            .map(from_document)
            .transpose()
    }

    /// Case-insensitive email lookup.
    pub fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.backend
            .find_one_ignore_case(Collection::Users, "email", email)?
            .map(from_document)
            .transpose()
    }

    pub fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let stored = self
            .backend
            .insert_unique(Collection::Users, to_document(user)?, USER_UNIQUE_FIELDS)?;
        from_document(stored)
    }

    /// Applies a profile patch; `None` when the user does not exist.
    pub fn update_user(&self, id: &str, patch: &ProfilePatch) -> RepoResult<Option<User>> {
        self.backend
            .merge_unique(
                Collection::Users,
                id,
                to_document(patch)?,
                USER_UNIQUE_FIELDS,
            )?
            .map(from_document)
            .transpose()
    }

    /// Removes a user and everything it owns; `false` when absent.
    pub fn delete_user(&self, id: &str) -> RepoResult<bool> {
        let mut cascaded = 0;
        for collection in Collection::OWNED {
            cascaded += self.backend.remove_by_owner(collection, id)?;
        }
        let removed = self.backend.remove(Collection::Users, id)?;
        if removed {
            info!(
                "event=user_delete module=storage status=ok cascaded_records={cascaded}"
            );
        }
        Ok(removed)
    }

    /// Every record of kind `R` owned by `owner_id`, in listing order.
    pub fn list<R: OwnedRecord>(&self, owner_id: &str) -> RepoResult<Vec<R>> {
        let mut records = self
            .backend
            .find_by_owner(R::COLLECTION, owner_id)?
            .into_iter()
            .map(from_document)
            .collect::<RepoResult<Vec<R>>>()?;
        R::sort_listing(&mut records);
        Ok(records)
    }

    pub fn get<R: OwnedRecord>(&self, id: &str) -> RepoResult<Option<R>> {
        self.backend
            .find_by_id(R::COLLECTION, id)?
            .map(from_document)
            .transpose()
    }

    /// Stores a new record owned by `owner_id`.
    pub fn create<R: OwnedRecord>(&self, owner_id: &str, new: &R::New) -> RepoResult<R> {
        let stored = self
            .backend
            .insert(R::COLLECTION, Some(owner_id), to_document(new)?)?;
        from_document(stored)
    }

    /// Shallow-merges `patch`; `None` when the record does not exist.
    pub fn update<R: OwnedRecord>(&self, id: &str, patch: &R::Patch) -> RepoResult<Option<R>> {
        self.backend
            .merge(R::COLLECTION, id, to_document(patch)?)?
            .map(from_document)
            .transpose()
    }

    pub fn delete<R: OwnedRecord>(&self, id: &str) -> RepoResult<bool> {
        self.backend.remove(R::COLLECTION, id)
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendConfig, Storage};
    use crate::repo::BackendKind;

    #[test]
    fn memory_config_builds_memory_backend() {
        let storage = Storage::open(&BackendConfig::Memory).unwrap();
        assert_eq!(storage.backend_kind(), BackendKind::Memory);
        assert!(format!("{storage:?}").contains("Memory"));
    }
}
