//! Social profile links, one row per platform link.

use crate::model::validation::{check_http_url, require_text, Validate, ValidationErrors};
use crate::model::{Collection, OwnedRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewSocialMedia {
    /// Platform identifier such as `linkedin` or `github`.
    pub platform: String,
    pub url: String,
}

impl Validate for NewSocialMedia {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "platform", "Platform", &self.platform);
        require_text(&mut errors, "url", "URL", &self.url);
        check_http_url(&mut errors, "url", Some(self.url.as_str()));
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: NewSocialMedia,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Validate for SocialMediaPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(platform) = &self.platform {
            require_text(&mut errors, "platform", "Platform", platform);
        }
        if let Some(url) = &self.url {
            require_text(&mut errors, "url", "URL", url);
            check_http_url(&mut errors, "url", Some(url.as_str()));
        }
        errors.into_result()
    }
}

impl OwnedRecord for SocialMedia {
    type New = NewSocialMedia;
    type Patch = SocialMediaPatch;

    const COLLECTION: Collection = Collection::SocialMedias;
    const LABEL: &'static str = "Social media";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}
