//! User identity and profile fields.
//!
//! # Invariants
//! - `username` and `email` are unique under ASCII case folding.
//! - `password` holds an argon2 PHC hash and never leaves the core unredacted;
//!   callers render [`PublicUser`].

use crate::model::patch::{nullable, Nullable};
use crate::model::validation::{
    check_email, check_range, require_min_chars, Validate, ValidationErrors,
};
use serde::{Deserialize, Serialize};

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;
const MAX_AGE: i64 = 150;

/// Optional personal details shown on the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// URL or server-relative path of the avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl Validate for ProfileFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_range(&mut errors, "age", self.age.map(i64::from), 0, MAX_AGE);
        errors.into_result()
    }
}

/// Stored user record, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

impl User {
    /// Drops the password hash for rendering.
    pub fn redacted(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// User shape returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

/// User row to insert; the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

/// Sign-up payload; missing fields read as blank and fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

impl RegisterRequest {
    /// Copy with surrounding whitespace stripped from `username` and `email`,
    /// the form that is checked, stored and compared.
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        }
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_min_chars(
            &mut errors,
            "username",
            "Username",
            &self.username,
            MIN_USERNAME_CHARS,
        );
        check_email(&mut errors, "email", &self.email);
        require_min_chars(
            &mut errors,
            "password",
            "Password",
            &self.password,
            MIN_PASSWORD_CHARS,
        );
        check_range(&mut errors, "age", self.profile.age.map(i64::from), 0, MAX_AGE);
        errors.into_result()
    }
}

/// Sign-in payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_min_chars(
            &mut errors,
            "username",
            "Username",
            &self.username,
            MIN_USERNAME_CHARS,
        );
        require_min_chars(
            &mut errors,
            "password",
            "Password",
            &self.password,
            MIN_PASSWORD_CHARS,
        );
        errors.into_result()
    }
}

/// Partial update of the signed-in user's profile.
///
/// `username` and `password` are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub first_name: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub last_name: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub age: Nullable<u32>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub gender: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub address: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub phone_number: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub bio: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Nullable<String>,
}

impl ProfilePatch {
    /// Copy with surrounding whitespace stripped from `email`.
    pub fn normalized(&self) -> Self {
        Self {
            email: self.email.as_deref().map(|email| email.trim().to_string()),
            ..self.clone()
        }
    }
}

impl Validate for ProfilePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(email) = &self.email {
            check_email(&mut errors, "email", email);
        }
        if let Some(Some(age)) = self.age {
            check_range(&mut errors, "age", Some(i64::from(age)), 0, MAX_AGE);
        }
        errors.into_result()
    }
}
