//! Work experience entries.
//!
//! # Invariants
//! - `currentlyWorking = true` and a non-blank `endDate` never coexist.
//! - A patch that switches one of them on switches the other off.

use crate::model::education::most_recent_first;
use crate::model::patch::{assigned, nullable, Nullable};
use crate::model::validation::{
    check_date, check_period, present, require_text, Validate, ValidationErrors,
};
use crate::model::{Collection, OwnedRecord};
use serde::{Deserialize, Serialize};

/// Create payload and stored body of a work experience entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewWorkExperience {
    pub job_title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_working: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
}

impl NewWorkExperience {
    /// Whether the entry is open-ended.
    pub fn is_current(&self) -> bool {
        self.currently_working == Some(true)
    }
}

impl Validate for NewWorkExperience {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "jobTitle", "Job title", &self.job_title);
        require_text(&mut errors, "company", "Company", &self.company);
        require_text(&mut errors, "startDate", "Start date", &self.start_date);
        check_date(&mut errors, "startDate", Some(self.start_date.as_str()));
        check_date(&mut errors, "endDate", self.end_date.as_deref());
        check_period(
            &mut errors,
            Some(self.start_date.as_str()),
            self.end_date.as_deref(),
        );
        check_current_without_end(&mut errors, self);
        errors.into_result()
    }
}

fn check_current_without_end(errors: &mut ValidationErrors, entry: &NewWorkExperience) {
    if entry.is_current() && present(entry.end_date.as_deref()).is_some() {
        errors.push(
            "endDate",
            "End date must be empty while currently working here",
        );
    }
}

/// Stored work experience entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: NewWorkExperience,
}

/// Partial update of a work experience entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperiencePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Nullable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_date: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub currently_working: Nullable<bool>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub company_logo: Nullable<String>,
}

impl Validate for WorkExperiencePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.job_title {
            require_text(&mut errors, "jobTitle", "Job title", title);
        }
        if let Some(company) = &self.company {
            require_text(&mut errors, "company", "Company", company);
        }
        if let Some(start) = &self.start_date {
            require_text(&mut errors, "startDate", "Start date", start);
            check_date(&mut errors, "startDate", Some(start.as_str()));
        }
        check_date(&mut errors, "endDate", assigned(&self.end_date).map(String::as_str));
        errors.into_result()
    }
}

impl OwnedRecord for WorkExperience {
    type New = NewWorkExperience;
    type Patch = WorkExperiencePatch;

    const COLLECTION: Collection = Collection::WorkExperiences;
    const LABEL: &'static str = "Work experience";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn check_record(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_period(
            &mut errors,
            Some(self.details.start_date.as_str()),
            self.details.end_date.as_deref(),
        );
        check_current_without_end(&mut errors, &self.details);
        errors.into_result()
    }

    fn normalize_patch(patch: &mut WorkExperiencePatch) {
        let sets_current = patch.currently_working == Some(Some(true));
        let sets_end = present(assigned(&patch.end_date).map(String::as_str)).is_some();
        if sets_current && patch.end_date.is_none() {
            patch.end_date = Some(None);
        }
        if sets_end && patch.currently_working.is_none() {
            patch.currently_working = Some(Some(false));
        }
    }

    fn sort_listing(records: &mut [Self]) {
        records.sort_by(|a, b| {
            most_recent_first(
                (open_end(a), a.details.start_date.as_str()),
                (open_end(b), b.details.start_date.as_str()),
            )
        });
    }
}

fn open_end(record: &WorkExperience) -> Option<&str> {
    if record.details.is_current() {
        None
    } else {
        record.details.end_date.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::{NewWorkExperience, WorkExperience, WorkExperiencePatch};
    use crate::model::validation::Validate;
    use crate::model::OwnedRecord;

    fn details(start: &str, end: Option<&str>, current: Option<bool>) -> NewWorkExperience {
        NewWorkExperience {
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            start_date: start.to_string(),
            end_date: end.map(str::to_string),
            currently_working: current,
            ..NewWorkExperience::default()
        }
    }

    #[test]
    fn current_job_with_end_date_is_rejected() {
        let entry = details("2019-01", Some("2021-01"), Some(true));
        assert!(entry.validate().unwrap_err().has_field("endDate"));

        let blank_end = details("2019-01", Some(""), Some(true));
        assert!(blank_end.validate().is_ok());
    }

    #[test]
    fn switching_to_current_clears_end_date() {
        let mut patch: WorkExperiencePatch =
            serde_json::from_str(r#"{"currentlyWorking":true}"#).unwrap();
        WorkExperience::normalize_patch(&mut patch);
        assert_eq!(patch.end_date, Some(None));
    }

    #[test]
    fn setting_end_date_clears_current_flag() {
        let mut patch: WorkExperiencePatch =
            serde_json::from_str(r#"{"endDate":"2022-05"}"#).unwrap();
        WorkExperience::normalize_patch(&mut patch);
        assert_eq!(patch.currently_working, Some(Some(false)));
    }

    #[test]
    fn explicit_conflict_is_left_for_record_check() {
        let mut patch: WorkExperiencePatch =
            serde_json::from_str(r#"{"endDate":"2022-05","currentlyWorking":true}"#).unwrap();
        WorkExperience::normalize_patch(&mut patch);
        assert_eq!(patch.currently_working, Some(Some(true)));
        assert_eq!(patch.end_date, Some(Some("2022-05".to_string())));
    }

    #[test]
    fn listing_puts_current_job_first() {
        let mut records = vec![
            WorkExperience {
                id: "past".to_string(),
                user_id: "1".to_string(),
                details: details("2015-01", Some("2019-01"), Some(false)),
            },
            WorkExperience {
                id: "now".to_string(),
                user_id: "1".to_string(),
                details: details("2019-02", None, Some(true)),
            },
        ];
        WorkExperience::sort_listing(&mut records);
        assert_eq!(records[0].id, "now");
    }
}
