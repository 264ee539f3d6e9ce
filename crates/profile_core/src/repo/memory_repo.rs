//! In-process map backend.
//!
//! # Invariants
//! - One counter, shared by every collection, numbers both ids and insertion
//!   order, so ids are never reused within a process.
//! - Ids are `<collection prefix><counter>` (`1`, `edu_2`, `work_3`, ...).
//! - Data lives only as long as the backend value.
//! - Unique checks and the write they guard run under one lock.

use super::{
    clashing_fields, field_matches_ignore_case, merge_shallow, BackendKind, Document,
    DocumentBackend, RepoError, RepoResult, ID_FIELD, OWNER_FIELD,
};
use crate::model::Collection;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct CollectionRows {
    /// Documents keyed by insertion sequence.
    rows: BTreeMap<u64, Document>,
    /// Document id to insertion sequence.
    index: HashMap<String, u64>,
}

impl CollectionRows {
    fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).and_then(|seq| self.rows.get(seq))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        let seq = self.index.get(id)?;
        self.rows.get_mut(seq)
    }

    fn owned_by<'a>(&'a self, owner_id: &'a str) -> impl Iterator<Item = (&'a u64, &'a Document)> {
        self.rows.iter().filter(move |(_, document)| {
            document.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner_id)
        })
    }
}

#[derive(Debug)]
struct MemoryState {
    next_seq: u64,
    collections: HashMap<Collection, CollectionRows>,
}

impl MemoryState {
    fn insert(
        &mut self,
        collection: Collection,
        owner_id: Option<&str>,
        mut document: Document,
    ) -> Document {
        let seq = self.next_seq;
        self.next_seq += 1;

        let id = format!("{}{seq}", collection.id_prefix());
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        if let Some(owner_id) = owner_id {
            document.insert(OWNER_FIELD.to_string(), Value::String(owner_id.to_string()));
        }

        let rows = self.collections.entry(collection).or_default();
        rows.index.insert(id, seq);
        rows.rows.insert(seq, document.clone());
        document
    }

    /// Fails when `candidate` clashes with any document other than `own_id`.
    fn ensure_unique(
        &self,
        collection: Collection,
        own_id: Option<&str>,
        candidate: &Document,
        unique_fields: &[&str],
    ) -> RepoResult<()> {
        let Some(rows) = self.collections.get(&collection) else {
            return Ok(());
        };
        let own_seq = own_id.and_then(|id| rows.index.get(id)).copied();
        let others = rows
            .rows
            .iter()
            .filter(move |(seq, _)| Some(**seq) != own_seq)
            .map(|(_, document)| document);
        let fields = clashing_fields(candidate, unique_fields, others);
        if fields.is_empty() {
            Ok(())
        } else {
            Err(RepoError::Conflict { fields })
        }
    }
}

/// Mutex-guarded map store for development and tests.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_seq: 1,
                collections: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn insert(
        &self,
        collection: Collection,
        owner_id: Option<&str>,
        document: Document,
    ) -> RepoResult<Document> {
        Ok(self.state().insert(collection, owner_id, document))
    }

    fn insert_unique(
        &self,
        collection: Collection,
        document: Document,
        unique_fields: &[&str],
    ) -> RepoResult<Document> {
        let mut state = self.state();
        state.ensure_unique(collection, None, &document, unique_fields)?;
        Ok(state.insert(collection, None, document))
    }

    fn find_by_id(&self, collection: Collection, id: &str) -> RepoResult<Option<Document>> {
        let state = self.state();
        Ok(state
            .collections
            .get(&collection)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    fn find_by_owner(&self, collection: Collection, owner_id: &str) -> RepoResult<Vec<Document>> {
        let state = self.state();
        Ok(state
            .collections
            .get(&collection)
            .map(|rows| {
                rows.owned_by(owner_id)
                    .map(|(_, document)| document.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_one_ignore_case(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> RepoResult<Option<Document>> {
        let state = self.state();
        Ok(state.collections.get(&collection).and_then(|rows| {
            rows.rows
                .values()
                .find(|document| field_matches_ignore_case(document, field, value))
                .cloned()
        }))
    }

    fn merge(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> RepoResult<Option<Document>> {
        let mut state = self.state();
        let Some(document) = state
            .collections
            .get_mut(&collection)
            .and_then(|rows| rows.get_mut(id))
        else {
            return Ok(None);
        };
        merge_shallow(document, patch);
        Ok(Some(document.clone()))
    }

    fn merge_unique(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
        unique_fields: &[&str],
    ) -> RepoResult<Option<Document>> {
        let mut state = self.state();
        state.ensure_unique(collection, Some(id), &patch, unique_fields)?;
        let Some(document) = state
            .collections
            .get_mut(&collection)
            .and_then(|rows| rows.get_mut(id))
        else {
            return Ok(None);
        };
        merge_shallow(document, patch);
        Ok(Some(document.clone()))
    }

    fn remove(&self, collection: Collection, id: &str) -> RepoResult<bool> {
        let mut state = self.state();
        let Some(rows) = state.collections.get_mut(&collection) else {
            return Ok(false);
        };
        match rows.index.remove(id) {
            Some(seq) => Ok(rows.rows.remove(&seq).is_some()),
            None => Ok(false),
        }
    }

    fn remove_by_owner(&self, collection: Collection, owner_id: &str) -> RepoResult<usize> {
        let mut state = self.state();
        let Some(rows) = state.collections.get_mut(&collection) else {
            return Ok(0);
        };
        let doomed: HashSet<u64> = rows.owned_by(owner_id).map(|(seq, _)| *seq).collect();
        rows.index.retain(|_, seq| !doomed.contains(seq));
        for seq in &doomed {
            rows.rows.remove(seq);
        }
        Ok(doomed.len())
    }
}
