//! Generic CRUD use cases for every [`OwnedRecord`] kind.

use super::ownership::authorize;
use super::{ServiceError, ServiceResult};
use crate::model::validation::Validate;
use crate::model::OwnedRecord;
use crate::repo::{from_document, merge_shallow, to_document};
use crate::storage::Storage;

/// Owner-scoped CRUD over the storage facade.
#[derive(Debug, Clone)]
pub struct RecordService {
    storage: Storage,
}

impl RecordService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Lists the actor's records of kind `R`.
    pub fn list<R: OwnedRecord>(&self, actor_id: &str) -> ServiceResult<Vec<R>> {
        Ok(self.storage.list::<R>(actor_id)?)
    }

    pub fn get<R: OwnedRecord>(&self, actor_id: &str, id: &str) -> ServiceResult<R> {
        authorize(self.storage.get::<R>(id)?, actor_id)
    }

    /// Validates `new` and stores it under the actor.
    pub fn create<R: OwnedRecord>(&self, actor_id: &str, new: &R::New) -> ServiceResult<R> {
        new.validate()?;
        Ok(self.storage.create::<R>(actor_id, new)?)
    }

    /// Merges `patch` into a record the actor owns.
    ///
    /// The merged result is checked as a whole before anything is written.
    pub fn update<R: OwnedRecord>(
        &self,
        actor_id: &str,
        id: &str,
        mut patch: R::Patch,
    ) -> ServiceResult<R> {
        patch.validate()?;
        R::normalize_patch(&mut patch);
        let current = authorize(self.storage.get::<R>(id)?, actor_id)?;

        let mut preview = to_document(&current)?;
        merge_shallow(&mut preview, to_document(&patch)?);
        from_document::<R>(preview)?.check_record()?;

        self.storage
            .update::<R>(id, &patch)?
            .ok_or(ServiceError::NotFound(R::LABEL))
    }

    /// Deletes a record the actor owns.
    pub fn delete<R: OwnedRecord>(&self, actor_id: &str, id: &str) -> ServiceResult<()> {
        authorize(self.storage.get::<R>(id)?, actor_id)?;
        if self.storage.delete::<R>(id)? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(R::LABEL))
        }
    }
}
