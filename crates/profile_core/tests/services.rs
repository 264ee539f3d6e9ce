use profile_core::{
    Education, EducationPatch, LoginRequest, NewEducation, NewWorkExperience, ProfilePatch,
    ProfileService, RecordService, RegisterRequest, ServiceError, Storage, WorkExperience,
    WorkExperiencePatch,
};
use profile_core::repo::SqliteDocumentBackend;
use std::sync::{Arc, Barrier};
use std::thread;

fn services() -> (ProfileService, RecordService) {
    let storage = Storage::in_memory();
    (
        ProfileService::new(storage.clone()),
        RecordService::new(storage),
    )
}

fn register(profiles: &ProfileService, username: &str) -> String {
    let request: RegisterRequest = serde_json::from_value(serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "secret1",
    }))
    .unwrap();
    profiles.register(&request).unwrap().id
}

fn mit() -> NewEducation {
    NewEducation {
        institution_name: "MIT".to_string(),
        degree: "BSc".to_string(),
        start_date: "2014-03".to_string(),
        ..NewEducation::default()
    }
}

fn field_errors(err: ServiceError) -> Vec<String> {
    match err {
        ServiceError::Validation(errors) => errors
            .errors()
            .iter()
            .map(|error| error.field.clone())
            .collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn register_stores_hash_and_login_accepts_password() {
    let (profiles, _) = services();
    let id = register(&profiles, "ada");

    let user = profiles.current_user(&id).unwrap();
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert_ne!(user.password_hash, "secret1");

    let logged_in = profiles
        .login(&LoginRequest {
            username: "ADA".to_string(),
            password: "secret1".to_string(),
        })
        .unwrap();
    assert_eq!(logged_in.id, id);
}

#[test]
fn duplicate_username_and_email_are_field_errors() {
    let (profiles, _) = services();
    register(&profiles, "ada");

    let request: RegisterRequest = serde_json::from_str(
        r#"{"username":"Ada","email":"ADA@example.com","password":"secret1"}"#,
    )
    .unwrap();
    let fields = field_errors(profiles.register(&request).unwrap_err());
    assert_eq!(fields, ["username", "email"]);
}

/// Races `attempts` sign-ups that share a username up to ASCII case.
fn race_same_username(storage: Storage, attempts: usize) -> Vec<Result<String, Vec<String>>> {
    let profiles = ProfileService::new(storage);
    let barrier = Arc::new(Barrier::new(attempts));
    let handles: Vec<_> = (0..attempts)
        .map(|n| {
            let profiles = profiles.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let username = if n % 2 == 0 { "ada" } else { "ADA" };
                let request: RegisterRequest = serde_json::from_value(serde_json::json!({
                    "username": username,
                    "email": format!("ada{n}@example.com"),
                    "password": "secret1",
                }))
                .unwrap();
                barrier.wait();
                profiles
                    .register(&request)
                    .map(|user| user.id)
                    .map_err(field_errors)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn concurrent_sign_ups_keep_usernames_unique() {
    let backends = [
        Storage::in_memory(),
        Storage::with_backend(Arc::new(SqliteDocumentBackend::open_in_memory().unwrap())),
    ];
    for storage in backends {
        let outcomes = race_same_username(storage.clone(), 4);

        let winners: Vec<&String> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "outcomes: {outcomes:?}");
        for outcome in &outcomes {
            if let Err(fields) = outcome {
                assert_eq!(fields, &["username"]);
            }
        }
        let stored = storage.get_user_by_username("Ada").unwrap().unwrap();
        assert_eq!(&stored.id, winners[0]);
    }
}

#[test]
fn concurrent_email_claims_keep_emails_unique() {
    let storage = Storage::in_memory();
    let profiles = ProfileService::new(storage.clone());
    let ids: Vec<String> = ["ada", "grace", "linus", "barbara"]
        .into_iter()
        .map(|name| register(&profiles, name))
        .collect();

    let barrier = Arc::new(Barrier::new(ids.len()));
    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let profiles = profiles.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let patch: ProfilePatch =
                    serde_json::from_str(r#"{"email":"shared@example.com"}"#).unwrap();
                barrier.wait();
                profiles.update_profile(&id, &patch).is_ok()
            })
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    let holders = ids
        .iter()
        .filter(|id| profiles.current_user(id).unwrap().email == "shared@example.com")
        .count();
    assert_eq!(holders, 1);
}

#[test]
fn padded_identity_fields_are_trimmed_before_duplicate_checks() {
    let (profiles, _) = services();
    let id = register(&profiles, "ada");

    let padded: RegisterRequest = serde_json::from_str(
        r#"{"username":"ada ","email":" other@example.com","password":"secret1"}"#,
    )
    .unwrap();
    assert_eq!(
        field_errors(profiles.register(&padded).unwrap_err()),
        ["username"]
    );

    let fresh: RegisterRequest = serde_json::from_str(
        r#"{"username":" grace ","email":" grace@example.com ","password":"secret1"}"#,
    )
    .unwrap();
    let grace = profiles.register(&fresh).unwrap();
    assert_eq!(grace.username, "grace");
    assert_eq!(grace.email, "grace@example.com");

    let login = profiles
        .login(&LoginRequest {
            username: " Grace".to_string(),
            password: "secret1".to_string(),
        })
        .unwrap();
    assert_eq!(login.id, grace.id);

    let patch: ProfilePatch =
        serde_json::from_str(r#"{"email":"  GRACE@example.com "}"#).unwrap();
    assert_eq!(
        field_errors(profiles.update_profile(&id, &patch).unwrap_err()),
        ["email"]
    );
}

#[test]
fn bad_credentials_fail_the_same_way() {
    let (profiles, _) = services();
    register(&profiles, "ada");

    for (username, password) in [("ada", "wrong-password"), ("nobody", "secret1")] {
        let err = profiles
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid username or password");
    }
}

#[test]
fn profile_email_cannot_collide_with_another_user() {
    let (profiles, _) = services();
    let ada = register(&profiles, "ada");
    register(&profiles, "grace");

    let taken: ProfilePatch = serde_json::from_str(r#"{"email":"grace@example.com"}"#).unwrap();
    assert_eq!(
        field_errors(profiles.update_profile(&ada, &taken).unwrap_err()),
        ["email"]
    );

    let own: ProfilePatch =
        serde_json::from_str(r#"{"email":"ADA@example.com","age":36}"#).unwrap();
    let updated = profiles.update_profile(&ada, &own).unwrap();
    assert_eq!(updated.email, "ADA@example.com");
    assert_eq!(updated.profile.age, Some(36));
}

#[test]
fn strangers_are_forbidden_and_missing_ids_are_not_found() {
    let (profiles, records) = services();
    let owner = register(&profiles, "ada");
    let stranger = register(&profiles, "grace");
    let entry = records.create::<Education>(&owner, &mit()).unwrap();

    assert!(matches!(
        records.get::<Education>(&stranger, &entry.id),
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        records.update::<Education>(&stranger, &entry.id, EducationPatch::default()),
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        records.delete::<Education>(&stranger, &entry.id),
        Err(ServiceError::Forbidden)
    ));

    let missing = records.delete::<Education>(&owner, "edu_999").unwrap_err();
    assert_eq!(missing.to_string(), "Education not found");

    records.delete::<Education>(&owner, &entry.id).unwrap();
    assert!(matches!(
        records.get::<Education>(&owner, &entry.id),
        Err(ServiceError::NotFound("Education"))
    ));
}

#[test]
fn merged_period_is_checked_before_writing() {
    let (profiles, records) = services();
    let owner = register(&profiles, "ada");
    let entry = records.create::<Education>(&owner, &mit()).unwrap();

    let patch: EducationPatch = serde_json::from_str(r#"{"endDate":"2013-01"}"#).unwrap();
    let fields = field_errors(
        records
            .update::<Education>(&owner, &entry.id, patch)
            .unwrap_err(),
    );
    assert_eq!(fields, ["endDate"]);
    assert_eq!(
        records.get::<Education>(&owner, &entry.id).unwrap(),
        entry
    );
}

#[test]
fn marking_job_current_clears_end_date() {
    let (profiles, records) = services();
    let owner = register(&profiles, "ada");
    let job = records
        .create::<WorkExperience>(
            &owner,
            &NewWorkExperience {
                job_title: "Engineer".to_string(),
                company: "Acme".to_string(),
                start_date: "2019-01".to_string(),
                end_date: Some("2021-06".to_string()),
                ..NewWorkExperience::default()
            },
        )
        .unwrap();

    let patch: WorkExperiencePatch =
        serde_json::from_str(r#"{"currentlyWorking":true}"#).unwrap();
    let updated = records
        .update::<WorkExperience>(&owner, &job.id, patch)
        .unwrap();
    assert_eq!(updated.details.currently_working, Some(true));
    assert_eq!(updated.details.end_date, None);
}

#[test]
fn create_rejects_missing_required_fields() {
    let (profiles, records) = services();
    let owner = register(&profiles, "ada");

    let fields = field_errors(
        records
            .create::<Education>(&owner, &NewEducation::default())
            .unwrap_err(),
    );
    for field in ["institutionName", "degree", "startDate"] {
        assert!(fields.iter().any(|f| f == field), "missing {field}");
    }
    assert!(records.list::<Education>(&owner).unwrap().is_empty());
}
