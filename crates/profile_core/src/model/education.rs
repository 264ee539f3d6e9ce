//! Education history entries.

use crate::model::patch::{assigned, nullable, Nullable};
use crate::model::validation::{
    check_date, check_period, check_range, present, require_text, Validate, ValidationErrors,
};
use crate::model::{Collection, OwnedRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const MIN_GRADUATION_YEAR: i64 = 1900;
const MAX_GRADUATION_YEAR: i64 = 2100;

/// Create payload and stored body of an education entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewEducation {
    pub institution_name: String,
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for NewEducation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "institutionName", "Institution name", &self.institution_name);
        require_text(&mut errors, "degree", "Degree", &self.degree);
        require_text(&mut errors, "startDate", "Start date", &self.start_date);
        check_date(&mut errors, "startDate", Some(self.start_date.as_str()));
        check_date(&mut errors, "endDate", self.end_date.as_deref());
        check_period(&mut errors, Some(self.start_date.as_str()), self.end_date.as_deref());
        check_range(
            &mut errors,
            "graduationYear",
            self.graduation_year.map(i64::from),
            MIN_GRADUATION_YEAR,
            MAX_GRADUATION_YEAR,
        );
        errors.into_result()
    }
}

/// Stored education entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: NewEducation,
}

/// Partial update of an education entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub field_of_study: Nullable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_date: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub graduation_year: Nullable<i32>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub institution_logo: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Nullable<String>,
}

impl Validate for EducationPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.institution_name {
            require_text(&mut errors, "institutionName", "Institution name", name);
        }
        if let Some(degree) = &self.degree {
            require_text(&mut errors, "degree", "Degree", degree);
        }
        if let Some(start) = &self.start_date {
            require_text(&mut errors, "startDate", "Start date", start);
            check_date(&mut errors, "startDate", Some(start.as_str()));
        }
        check_date(&mut errors, "endDate", assigned(&self.end_date).map(String::as_str));
        check_range(
            &mut errors,
            "graduationYear",
            assigned(&self.graduation_year).copied().map(i64::from),
            MIN_GRADUATION_YEAR,
            MAX_GRADUATION_YEAR,
        );
        errors.into_result()
    }
}

impl OwnedRecord for Education {
    type New = NewEducation;
    type Patch = EducationPatch;

    const COLLECTION: Collection = Collection::Educations;
    const LABEL: &'static str = "Education";

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
        errors.into_result()
    }

    fn sort_listing(records: &mut [Self]) {
        records.sort_by(|a, b| {
            most_recent_first(
                (a.details.end_date.as_deref(), a.details.start_date.as_str()),
                (b.details.end_date.as_deref(), b.details.start_date.as_str()),
            )
        });
    }
}

/// Orders `(end, start)` periods: open-ended first, then latest end, then latest start.
pub(crate) fn most_recent_first(
    (a_end, a_start): (Option<&str>, &str),
    (b_end, b_start): (Option<&str>, &str),
) -> Ordering {
    match (present(a_end), present(b_end)) {
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.cmp(a).then_with(|| b_start.cmp(a_start)),
        (None, None) => b_start.cmp(a_start),
    }
}

#[cfg(test)]
mod tests {
    use super::{Education, EducationPatch, NewEducation};
    use crate::model::validation::Validate;
    use crate::model::OwnedRecord;

    fn entry(id: &str, start: &str, end: Option<&str>) -> Education {
        Education {
            id: id.to_string(),
            user_id: "1".to_string(),
            details: NewEducation {
                institution_name: "MIT".to_string(),
                degree: "BSc".to_string(),
                start_date: start.to_string(),
                end_date: end.map(str::to_string),
                ..NewEducation::default()
            },
        }
    }

    #[test]
    fn new_education_requires_core_fields() {
        let missing: NewEducation = serde_json::from_str(
            r#"{"institutionName":" ","degree":"","startDate":""}"#,
        )
        .unwrap();
        let errors = missing.validate().unwrap_err();
        assert!(errors.has_field("institutionName"));
        assert!(errors.has_field("degree"));
        assert!(errors.has_field("startDate"));
    }

    #[test]
    fn new_education_rejects_reversed_period() {
        let mut details = entry("x", "2018-09", Some("2014-06")).details;
        assert!(details.validate().unwrap_err().has_field("endDate"));
        details.end_date = Some(String::new());
        assert!(details.validate().is_ok());
    }

    #[test]
    fn patch_rejects_blank_required_field() {
        let patch: EducationPatch = serde_json::from_str(r#"{"degree":"  "}"#).unwrap();
        assert!(patch.validate().unwrap_err().has_field("degree"));
    }

    #[test]
    fn listing_puts_ongoing_then_latest_first() {
        let mut records = vec![
            entry("old", "2008-09", Some("2012-06")),
            entry("ongoing", "2020-09", None),
            entry("recent", "2014-09", Some("2018-06")),
        ];
        Education::sort_listing(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["ongoing", "recent", "old"]);
    }
}
