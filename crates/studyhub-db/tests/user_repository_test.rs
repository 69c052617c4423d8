//! Integration tests for User repository using in-memory SurrealDB.

use studyhub_core::error::StudyError;
use studyhub_core::models::user::{AccountType, CreateUser, UpdateUser};
use studyhub_core::repository::UserRepository;
use studyhub_db::repository::SurrealUserRepository;
use studyhub_db::verify_password;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    studyhub_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        password: "analytical-engine".into(),
        account_type: AccountType::Student,
        image_url: "https://img.example.com/ada.png".into(),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("ada@example.com")).await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.account_type, AccountType::Student);
    assert!(user.enrolled_courses.is_empty());
    assert_ne!(user.password_hash, "analytical-engine");

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);

    let by_email = repo.get_by_email("ada@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn password_is_hashed_with_pepper() {
    let repo = SurrealUserRepository::with_pepper(setup().await, "pepper".into());

    let user = repo.create(new_user("ada@example.com")).await.unwrap();
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(verify_password("analytical-engine", &user.password_hash, Some("pepper")).unwrap());
    assert!(!verify_password("analytical-engine", &user.password_hash, None).unwrap());
    assert!(!verify_password("wrong", &user.password_hash, Some("pepper")).unwrap());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);

    repo.create(new_user("ada@example.com")).await.unwrap();
    let err = repo.create(new_user("ada@example.com")).await.unwrap_err();
    assert!(
        matches!(err, StudyError::AlreadyExists { .. }),
        "expected AlreadyExists, got: {err:?}"
    );
}

#[tokio::test]
async fn update_profile_fields() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(new_user("ada@example.com")).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                about: Some("First programmer".into()),
                contact_number: Some("5550100".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.profile.about.as_deref(), Some("First programmer"));
    assert_eq!(updated.profile.contact_number.as_deref(), Some("5550100"));
    assert_eq!(updated.first_name, "Ada");
}

#[tokio::test]
async fn set_password_replaces_hash() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(new_user("ada@example.com")).await.unwrap();

    repo.set_password(user.id, "difference-engine").await.unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert!(verify_password("difference-engine", &fetched.password_hash, None).unwrap());
    assert!(!verify_password("analytical-engine", &fetched.password_hash, None).unwrap());
}

#[tokio::test]
async fn delete_missing_user_is_not_found() {
    let repo = SurrealUserRepository::new(setup().await);

    let err = repo.delete(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(
        matches!(err, StudyError::NotFound { .. }),
        "expected NotFound, got: {err:?}"
    );
}
