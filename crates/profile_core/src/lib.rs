//! Core domain logic for the profile service.
//! This crate owns every business invariant; transport crates stay thin.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use auth::{PasswordError, SessionStore};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::education::{Education, EducationPatch, NewEducation};
pub use model::social_media::{NewSocialMedia, SocialMedia, SocialMediaPatch};
pub use model::tags::{Language, LanguagePatch, NewLanguage, NewTopic, Topic, TopicPatch};
pub use model::user::{LoginRequest, ProfilePatch, PublicUser, RegisterRequest, User};
pub use model::validation::{FieldError, Validate, ValidationErrors};
pub use model::work_experience::{NewWorkExperience, WorkExperience, WorkExperiencePatch};
pub use model::{Collection, OwnedRecord};
pub use repo::{BackendKind, DocumentBackend, RepoError, RepoResult};
pub use service::{ProfileService, RecordService, ServiceError, ServiceResult};
pub use storage::{BackendConfig, Storage};

/// Core crate version, reported by the health endpoint.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
