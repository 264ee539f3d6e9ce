//! Account use cases: sign-up, sign-in and the signed-in user's profile.
//!
//! # Invariants
//! - Username and email stay unique under ASCII case folding.
//! - Unknown usernames and wrong passwords fail identically.

use super::{ServiceError, ServiceResult};
use crate::auth::{hash_password, verify_password};
use crate::model::user::{LoginRequest, NewUser, ProfilePatch, RegisterRequest, User};
use crate::model::validation::{Validate, ValidationErrors};
use crate::storage::Storage;
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct ProfileService {
    storage: Storage,
}

impl ProfileService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Creates an account after field checks.
    ///
    /// Username and email are trimmed first. Duplicates are reported as field
    /// errors on `username`/`email`; the storage write itself enforces them, so
    /// concurrent sign-ups cannot both win.
    pub fn register(&self, request: &RegisterRequest) -> ServiceResult<User> {
        let request = request.normalized();
        if let Err(mut errors) = request.validate() {
            self.flag_taken(&mut errors, &request)?;
            return Err(errors.into());
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .storage
            .create_user(&NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                profile: request.profile,
            })
            .map_err(|err| {
                let err = ServiceError::from(err);
                if matches!(err, ServiceError::Validation(_)) {
                    warn!("event=user_register module=service status=error reason=duplicate");
                }
                err
            })?;
        info!("event=user_register module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Adds duplicate errors for identity fields that passed their own checks,
    /// so a rejected sign-up reports everything at once.
    fn flag_taken(
        &self,
        errors: &mut ValidationErrors,
        request: &RegisterRequest,
    ) -> ServiceResult<()> {
        if !errors.has_field("username")
            && self
                .storage
                .get_user_by_username(&request.username)?
                .is_some()
        {
            errors.push("username", "Username already exists");
        }
        if !errors.has_field("email") && self.storage.get_user_by_email(&request.email)?.is_some()
        {
            errors.push("email", "Email already exists");
        }
        Ok(())
    }

    /// Checks credentials and returns the matching user.
    pub fn login(&self, request: &LoginRequest) -> ServiceResult<User> {
        request.validate()?;
        let Some(user) = self.storage.get_user_by_username(request.username.trim())? else {
            warn!("event=user_login module=service status=error reason=unknown_user");
            return Err(ServiceError::InvalidCredentials);
        };
        if !verify_password(&request.password, &user.password_hash)? {
            warn!(
                "event=user_login module=service status=error reason=bad_password user_id={}",
                user.id
            );
            return Err(ServiceError::InvalidCredentials);
        }
        info!("event=user_login module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Loads the acting user.
    pub fn current_user(&self, actor_id: &str) -> ServiceResult<User> {
        self.storage
            .get_user(actor_id)?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Applies a partial profile update to the acting user.
    ///
    /// A new email that another user holds is a field error on `email`.
    pub fn update_profile(&self, actor_id: &str, patch: &ProfilePatch) -> ServiceResult<User> {
        let patch = patch.normalized();
        patch.validate()?;
        self.storage
            .update_user(actor_id, &patch)?
            .ok_or(ServiceError::NotFound("User"))
    }
}
