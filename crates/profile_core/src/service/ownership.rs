//! Single ownership gate for user-owned records.

use super::{ServiceError, ServiceResult};
use crate::model::OwnedRecord;

/// Admits `record` only when `actor_id` owns it.
///
/// Absence wins over foreign ownership: a missing record is `NotFound`,
/// an existing record of another user is `Forbidden`.
pub fn authorize<R: OwnedRecord>(record: Option<R>, actor_id: &str) -> ServiceResult<R> {
    let record = record.ok_or(ServiceError::NotFound(R::LABEL))?;
    if record.owner_id() != actor_id {
        return Err(ServiceError::Forbidden);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::authorize;
    use crate::model::tags::{NewTopic, Topic};
    use crate::service::ServiceError;

    fn topic(owner: &str) -> Topic {
        Topic {
            id: "topic_2".to_string(),
            user_id: owner.to_string(),
            details: NewTopic {
                name: "Rust".to_string(),
            },
        }
    }

    #[test]
    fn owner_is_admitted() {
        assert_eq!(authorize(Some(topic("1")), "1").unwrap().id, "topic_2");
    }

    #[test]
    fn stranger_is_forbidden_and_absence_is_not_found() {
        assert!(matches!(
            authorize(Some(topic("1")), "2"),
            Err(ServiceError::Forbidden)
        ));
        match authorize::<Topic>(None, "1") {
            Err(ServiceError::NotFound(label)) => assert_eq!(label, "Topic"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
