//! Profile domain model.
//!
//! # Responsibility
//! - Define the user record and the five user-owned record kinds.
//! - Describe each owned kind once through [`OwnedRecord`] so storage and
//!   services stay generic.
//!
//! # Invariants
//! - Every owned record carries exactly one `userId`; it is fixed at creation.
//! - Records serialize with camelCase JSON field names.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod education;
pub mod patch;
pub mod social_media;
pub mod tags;
pub mod user;
pub mod validation;
pub mod work_experience;

use validation::{Validate, ValidationErrors};

/// Named document collection inside a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Educations,
    WorkExperiences,
    Languages,
    Topics,
    SocialMedias,
}

impl Collection {
    /// Every collection holding user-owned rows.
    pub const OWNED: [Collection; 5] = [
        Collection::Educations,
        Collection::WorkExperiences,
        Collection::Languages,
        Collection::Topics,
        Collection::SocialMedias,
    ];

    /// Stable storage name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Educations => "educations",
            Self::WorkExperiences => "workExperiences",
            Self::Languages => "languages",
            Self::Topics => "topics",
            Self::SocialMedias => "socialMedias",
        }
    }

    /// Prefix of sequential ids handed out by the memory backend.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Users => "",
            Self::Educations => "edu_",
            Self::WorkExperiences => "work_",
            Self::Languages => "lang_",
            Self::Topics => "topic_",
            Self::SocialMedias => "social_",
        }
    }
}

/// A record kind that belongs to exactly one user.
///
/// `New` is the create payload, `Patch` the partial-update payload. The stored
/// record is `New` plus `id` and `userId`.
pub trait OwnedRecord: Serialize + DeserializeOwned + Clone + Send + 'static {
    type New: Serialize + DeserializeOwned + Validate + Send;
    type Patch: Serialize + DeserializeOwned + Validate + Default + Send;

    const COLLECTION: Collection;
    /// Human-readable kind name used in not-found messages.
    const LABEL: &'static str;

    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;

    /// Checks rules spanning several fields of a complete record.
    fn check_record(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }

    /// Rewrites a patch before it is merged (e.g. clearing a conflicting field).
    fn normalize_patch(_patch: &mut Self::Patch) {}

    /// Orders a listing in place. Insertion order is kept by default.
    fn sort_listing(_records: &mut [Self]) {}
}
