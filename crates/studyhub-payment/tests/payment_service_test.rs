//! Integration tests for PaymentService with an in-process fake gateway
//! and in-memory SurrealDB.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use studyhub_core::error::StudyError;
use studyhub_core::models::category::CreateCategory;
use studyhub_core::models::course::{CourseStatus, CreateCourse};
use studyhub_core::models::payment::PaymentStatus;
use studyhub_core::models::user::{AccountType, CreateUser};
use studyhub_core::repository::{
    CategoryRepository, CourseRepository, PaymentRepository, UserRepository,
};
use studyhub_db::repository::{
    SurrealCategoryRepository, SurrealCourseRepository, SurrealPaymentRepository,
    SurrealUserRepository,
};
use studyhub_payment::signature::{checkout_message, sign_hex};
use studyhub_payment::{
    CaptureOutcome, GatewayOrder, PaymentConfig, PaymentError, PaymentGateway, PaymentService,
    VerifyPaymentInput, WebhookOutcome,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

const KEY_SECRET: &str = "key-secret";
const WEBHOOK_SECRET: &str = "webhook-secret";

/// Hands out sequential order ids, or fails every call.
struct FakeGateway {
    counter: AtomicUsize,
    fail: bool,
}

impl FakeGateway {
    fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail: false,
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount_minor: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        if self.fail {
            return Err(PaymentError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            id: format!("order_{n}"),
            amount: amount_minor,
            currency: currency.into(),
            receipt: Some(receipt.into()),
        })
    }

    fn key_id(&self) -> &str {
        "rzp_test_fake"
    }
}

type Service = PaymentService<
    SurrealPaymentRepository<Db>,
    SurrealCourseRepository<Db>,
    SurrealUserRepository<Db>,
>;

struct Fixture {
    service: Service,
    users: SurrealUserRepository<Db>,
    courses: SurrealCourseRepository<Db>,
    payments: SurrealPaymentRepository<Db>,
    student_id: Uuid,
    paid_ids: Vec<Uuid>,
    free_id: Uuid,
}

async fn setup_with(gateway: FakeGateway) -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    studyhub_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let student = users
        .create(CreateUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "password123".into(),
            account_type: AccountType::Student,
            image_url: "https://img.example.com/ada.png".into(),
        })
        .await
        .unwrap();

    let category = SurrealCategoryRepository::new(db.clone())
        .create(CreateCategory {
            name: "Data".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let courses = SurrealCourseRepository::new(db.clone());
    let mut ids = Vec::new();
    for (name, price) in [("Stats", 499), ("ML", 999), ("Intro", 0)] {
        let c = courses
            .create(CreateCourse {
                instructor_id: Uuid::new_v4(),
                name: name.into(),
                description: String::new(),
                what_you_will_learn: String::new(),
                price,
                thumbnail_url: "https://img.example.com/c.png".into(),
                tags: vec![],
                instructions: vec![],
                category_id: category.id,
                status: CourseStatus::Published,
            })
            .await
            .unwrap();
        ids.push(c.id);
    }

    let config = PaymentConfig {
        key_id: "rzp_test_fake".into(),
        key_secret: KEY_SECRET.into(),
        webhook_secret: WEBHOOK_SECRET.into(),
        ..Default::default()
    };
    let service = PaymentService::new(
        SurrealPaymentRepository::new(db.clone()),
        SurrealCourseRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
        Arc::new(gateway),
        config,
    );

    Fixture {
        service,
        users,
        courses,
        payments: SurrealPaymentRepository::new(db),
        student_id: student.id,
        paid_ids: ids[..2].to_vec(),
        free_id: ids[2],
    }
}

async fn setup() -> Fixture {
    setup_with(FakeGateway::new()).await
}

async fn checkout(fx: &Fixture) -> String {
    match fx
        .service
        .capture_payment(fx.student_id, &fx.paid_ids)
        .await
        .unwrap()
    {
        CaptureOutcome::Checkout(handle) => {
            assert_eq!(handle.amount, (499 + 999) * 100);
            assert_eq!(handle.currency, "INR");
            assert_eq!(handle.key_id, "rzp_test_fake");
            handle.order_id
        }
        other => panic!("expected checkout, got: {other:?}"),
    }
}

fn webhook_body(event: &str, order_id: &str, payment_id: &str) -> Vec<u8> {
    serde_json::json!({
        "event": event,
        "payload": {
            "payment": { "entity": { "id": payment_id, "order_id": order_id } }
        }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn capture_creates_pending_payment() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;

    let payment = fx.payments.get_by_order_id(&order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Created);
    assert_eq!(payment.user_id, fx.student_id);
    assert_eq!(payment.course_ids, fx.paid_ids);

    let student = fx.users.get_by_id(fx.student_id).await.unwrap();
    assert!(student.enrolled_courses.is_empty());
}

#[tokio::test]
async fn capture_validates_the_cart() {
    let fx = setup().await;

    let err = fx
        .service
        .capture_payment(fx.student_id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::Validation { .. }), "got: {err:?}");

    let err = fx
        .service
        .capture_payment(fx.student_id, &[Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::NotFound { .. }), "got: {err:?}");
}

#[tokio::test]
async fn free_cart_enrolls_directly() {
    let fx = setup().await;

    let outcome = fx
        .service
        .capture_payment(fx.student_id, &[fx.free_id, fx.free_id])
        .await
        .unwrap();
    assert!(
        matches!(&outcome, CaptureOutcome::Enrolled { course_ids } if course_ids == &vec![fx.free_id]),
        "got: {outcome:?}"
    );

    let student = fx.users.get_by_id(fx.student_id).await.unwrap();
    assert_eq!(student.enrolled_courses, vec![fx.free_id]);

    let err = fx
        .service
        .capture_payment(fx.student_id, &[fx.free_id])
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AlreadyEnrolled { .. }), "got: {err:?}");
}

#[tokio::test]
async fn gateway_failure_maps_to_gateway_error() {
    let fx = setup_with(FakeGateway {
        counter: AtomicUsize::new(0),
        fail: true,
    })
    .await;

    let err = fx
        .service
        .capture_payment(fx.student_id, &fx.paid_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::Gateway(_)), "got: {err:?}");

    let student = fx.users.get_by_id(fx.student_id).await.unwrap();
    assert!(student.enrolled_courses.is_empty());
}

#[tokio::test]
async fn verified_payment_enrolls_once() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;
    let signature = sign_hex(KEY_SECRET, checkout_message(&order_id, "pay_1").as_bytes()).unwrap();
    let input = VerifyPaymentInput {
        order_id: order_id.clone(),
        payment_id: "pay_1".into(),
        signature,
    };

    let first = fx
        .service
        .verify_payment(fx.student_id, input.clone())
        .await
        .unwrap();
    assert!(first.is_new());
    assert_eq!(first.payment().status, PaymentStatus::Paid);

    let second = fx.service.verify_payment(fx.student_id, input).await.unwrap();
    assert!(!second.is_new());

    let student = fx.users.get_by_id(fx.student_id).await.unwrap();
    assert_eq!(student.enrolled_courses.len(), 2);
    for id in &fx.paid_ids {
        let course = fx.courses.get_by_id(*id).await.unwrap();
        assert_eq!(course.students_enrolled, vec![fx.student_id]);
    }
}

#[tokio::test]
async fn tampered_client_signature_is_rejected() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;
    let signature = sign_hex(KEY_SECRET, checkout_message(&order_id, "pay_1").as_bytes()).unwrap();

    let err = fx
        .service
        .verify_payment(
            fx.student_id,
            VerifyPaymentInput {
                order_id: order_id.clone(),
                payment_id: "pay_2".into(),
                signature,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::SignatureMismatch), "got: {err:?}");

    let payment = fx.payments.get_by_order_id(&order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Created);
}

#[tokio::test]
async fn verify_rejects_someone_elses_order() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;
    let signature = sign_hex(KEY_SECRET, checkout_message(&order_id, "pay_1").as_bytes()).unwrap();

    let err = fx
        .service
        .verify_payment(
            Uuid::new_v4(),
            VerifyPaymentInput {
                order_id,
                payment_id: "pay_1".into(),
                signature,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");
}

#[tokio::test]
async fn duplicate_webhook_settles_once() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;
    let body = webhook_body("payment.captured", &order_id, "pay_1");
    let signature = sign_hex(WEBHOOK_SECRET, &body).unwrap();

    let first = fx.service.handle_webhook(&body, &signature).await.unwrap();
    assert!(
        matches!(&first, WebhookOutcome::Settled(s) if s.is_new()),
        "got: {first:?}"
    );
    let second = fx.service.handle_webhook(&body, &signature).await.unwrap();
    assert!(
        matches!(&second, WebhookOutcome::Settled(s) if !s.is_new()),
        "got: {second:?}"
    );

    let student = fx.users.get_by_id(fx.student_id).await.unwrap();
    assert_eq!(student.enrolled_courses.len(), 2);
    let payment = fx.payments.get_by_order_id(&order_id).await.unwrap();
    assert_eq!(payment.gateway_payment_id.as_deref(), Some("pay_1"));
}

#[tokio::test]
async fn webhook_with_bad_signature_is_rejected() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;
    let body = webhook_body("payment.captured", &order_id, "pay_1");
    let signature = sign_hex("not-the-webhook-secret", &body).unwrap();

    let err = fx.service.handle_webhook(&body, &signature).await.unwrap_err();
    assert!(matches!(err, StudyError::SignatureMismatch), "got: {err:?}");

    let payment = fx.payments.get_by_order_id(&order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Created);
}

#[tokio::test]
async fn unrelated_webhook_events_are_ignored() {
    let fx = setup().await;
    let order_id = checkout(&fx).await;
    let body = webhook_body("payment.failed", &order_id, "pay_1");
    let signature = sign_hex(WEBHOOK_SECRET, &body).unwrap();

    let outcome = fx.service.handle_webhook(&body, &signature).await.unwrap();
    assert!(
        matches!(&outcome, WebhookOutcome::Ignored { event } if event == "payment.failed"),
        "got: {outcome:?}"
    );

    let payment = fx.payments.get_by_order_id(&order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Created);
}
