//! Name-only tags attached to a user: spoken languages and topics of interest.
//!
//! Duplicate names are allowed.

use crate::model::patch::{nullable, Nullable};
use crate::model::validation::{require_text, Validate, ValidationErrors};
use crate::model::{Collection, OwnedRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewLanguage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
}

impl Validate for NewLanguage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", "Language name", &self.name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: NewLanguage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub is_primary: Nullable<bool>,
}

impl Validate for LanguagePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            require_text(&mut errors, "name", "Language name", name);
        }
        errors.into_result()
    }
}

impl OwnedRecord for Language {
    type New = NewLanguage;
    type Patch = LanguagePatch;

    const COLLECTION: Collection = Collection::Languages;
    const LABEL: &'static str = "Language";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTopic {
    pub name: String,
}

impl Validate for NewTopic {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", "Topic name", &self.name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: NewTopic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Validate for TopicPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            require_text(&mut errors, "name", "Topic name", name);
        }
        errors.into_result()
    }
}

impl OwnedRecord for Topic {
    type New = NewTopic;
    type Patch = TopicPatch;

    const COLLECTION: Collection = Collection::Topics;
    const LABEL: &'static str = "Topic";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}
