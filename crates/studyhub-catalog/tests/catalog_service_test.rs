//! Integration tests for the catalog, review and progress services using
//! in-memory SurrealDB.

use studyhub_catalog::{CatalogService, NewCourse, NewSubSection, ProgressService, ReviewService};
use studyhub_core::error::StudyError;
use studyhub_core::models::course::{CourseStatus, UpdateCourse};
use studyhub_core::models::progress::CompletionOutcome;
use studyhub_core::models::user::{AccountType, CreateUser, User};
use studyhub_core::repository::{
    Pagination, SectionRepository, SubSectionRepository, UserRepository,
};
use studyhub_db::repository::{
    SurrealCategoryRepository, SurrealCourseRepository, SurrealProgressRepository,
    SurrealRatingRepository, SurrealSectionRepository, SurrealSubSectionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Catalog = CatalogService<
    SurrealCategoryRepository<Db>,
    SurrealCourseRepository<Db>,
    SurrealSectionRepository<Db>,
    SurrealSubSectionRepository<Db>,
    SurrealUserRepository<Db>,
    SurrealRatingRepository<Db>,
    SurrealProgressRepository<Db>,
>;

struct Fixture {
    db: Surreal<Db>,
    catalog: Catalog,
    instructor: User,
    student: User,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    studyhub_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let instructor = users
        .create(user("grace@example.com", AccountType::Instructor))
        .await
        .unwrap();
    let student = users
        .create(user("ada@example.com", AccountType::Student))
        .await
        .unwrap();

    let catalog = CatalogService::new(
        SurrealCategoryRepository::new(db.clone()),
        SurrealCourseRepository::new(db.clone()),
        SurrealSectionRepository::new(db.clone()),
        SurrealSubSectionRepository::new(db.clone()),
        users,
        SurrealRatingRepository::new(db.clone()),
        SurrealProgressRepository::new(db.clone()),
    );

    Fixture {
        db,
        catalog,
        instructor,
        student,
    }
}

fn user(email: &str, account_type: AccountType) -> CreateUser {
    CreateUser {
        first_name: "Test".into(),
        last_name: "User".into(),
        email: email.into(),
        password: "password123".into(),
        account_type,
        image_url: "https://img.example.com/u.png".into(),
    }
}

fn new_course(name: &str, category_id: Uuid, price: u64, status: CourseStatus) -> NewCourse {
    NewCourse {
        name: name.into(),
        description: "Learn things".into(),
        what_you_will_learn: "Everything".into(),
        price,
        thumbnail_url: "https://img.example.com/t.png".into(),
        tags: vec![],
        instructions: vec![],
        category_id,
        status: Some(status),
    }
}

fn video(title: &str, secs: u64) -> NewSubSection {
    NewSubSection {
        title: title.into(),
        description: String::new(),
        duration_secs: secs,
        video_url: format!("https://video.example.com/{title}.mp4"),
    }
}

#[tokio::test]
async fn category_listing_only_shows_published_courses_with_sections() {
    let fx = setup().await;
    let web = fx.catalog.create_category("Web Development", "").await.unwrap();
    let iid = fx.instructor.id;

    let ready = fx
        .catalog
        .create_course(iid, new_course("Ready", web.id, 0, CourseStatus::Published))
        .await
        .unwrap();
    fx.catalog.add_section(iid, ready.id, "Intro").await.unwrap();

    let empty = fx
        .catalog
        .create_course(iid, new_course("Empty", web.id, 0, CourseStatus::Published))
        .await
        .unwrap();
    let draft = fx
        .catalog
        .create_course(iid, new_course("Draft", web.id, 0, CourseStatus::Draft))
        .await
        .unwrap();
    fx.catalog.add_section(iid, draft.id, "Intro").await.unwrap();

    let listed = fx.catalog.listable_courses(web.id).await.unwrap();
    assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![ready.id]);
    assert!(!listed.iter().any(|c| c.id == empty.id));

    let categories = fx.catalog.list_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].slug, "web-development");
    assert_eq!(categories[0].course_count, 1);

    let page = fx.catalog.category_page_details(web.id).await.unwrap();
    assert_eq!(page.selected_category.courses.len(), 1);
    assert!(page.different_category.is_none());
    assert!(!page.most_selling_courses.is_empty());
}

#[tokio::test]
async fn duplicate_category_is_rejected() {
    let fx = setup().await;
    fx.catalog.create_category("Design", "").await.unwrap();
    let err = fx.catalog.create_category("Design", "").await.unwrap_err();
    assert!(matches!(err, StudyError::AlreadyExists { .. }), "got: {err:?}");
}

#[tokio::test]
async fn only_the_owner_can_change_a_course() {
    let fx = setup().await;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let course = fx
        .catalog
        .create_course(
            fx.instructor.id,
            new_course("Stats", cat.id, 100, CourseStatus::Draft),
        )
        .await
        .unwrap();
    assert_eq!(course.status, CourseStatus::Draft);

    let stranger = Uuid::new_v4();
    let err = fx
        .catalog
        .edit_course(stranger, course.id, UpdateCourse::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");

    let err = fx.catalog.delete_course(stranger, course.id).await.unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");

    let edited = fx
        .catalog
        .edit_course(
            fx.instructor.id,
            course.id,
            UpdateCourse {
                status: Some(CourseStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(edited.course.is_published());
}

#[tokio::test]
async fn students_cannot_create_courses() {
    let fx = setup().await;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let err = fx
        .catalog
        .create_course(
            fx.student.id,
            new_course("Nope", cat.id, 0, CourseStatus::Draft),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");
}

#[tokio::test]
async fn course_details_hide_videos_until_enrolled() {
    let fx = setup().await;
    let iid = fx.instructor.id;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let course = fx
        .catalog
        .create_course(iid, new_course("Stats", cat.id, 0, CourseStatus::Published))
        .await
        .unwrap();
    let section = fx.catalog.add_section(iid, course.id, "Basics").await.unwrap();
    fx.catalog
        .add_subsection(iid, section.id, video("mean", 600))
        .await
        .unwrap();
    fx.catalog
        .add_subsection(iid, section.id, video("median", 3_000))
        .await
        .unwrap();

    let public = fx.catalog.course_details(course.id).await.unwrap();
    assert_eq!(public.total_duration, "1h 0m");
    assert_eq!(public.sections[0].subsections.len(), 2);
    assert!(public.sections[0].subsections[0].video_url.is_none());
    assert_eq!(public.instructor.unwrap().id, iid);

    let err = fx
        .catalog
        .full_course_details(fx.student.id, course.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");

    fx.catalog.enroll_free(fx.student.id, course.id).await.unwrap();
    let full = fx
        .catalog
        .full_course_details(fx.student.id, course.id)
        .await
        .unwrap();
    assert!(full.details.sections[0].subsections[0].video_url.is_some());
    assert!(full.completed_videos.is_empty());
}

#[tokio::test]
async fn free_enrollment_twice_reports_already_enrolled() {
    let fx = setup().await;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let free = fx
        .catalog
        .create_course(
            fx.instructor.id,
            new_course("Free", cat.id, 0, CourseStatus::Published),
        )
        .await
        .unwrap();
    let paid = fx
        .catalog
        .create_course(
            fx.instructor.id,
            new_course("Paid", cat.id, 499, CourseStatus::Published),
        )
        .await
        .unwrap();

    fx.catalog.enroll_free(fx.student.id, free.id).await.unwrap();
    let err = fx
        .catalog
        .enroll_free(fx.student.id, free.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AlreadyEnrolled { .. }), "got: {err:?}");

    let err = fx
        .catalog
        .enroll_free(fx.student.id, paid.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::Validation { .. }), "got: {err:?}");

    let enrolled = fx.catalog.enrolled_courses(fx.student.id).await.unwrap();
    assert_eq!(enrolled.len(), 1);
    assert_eq!(enrolled[0].course.students_enrolled, vec![fx.student.id]);

    let dashboard = fx
        .catalog
        .instructor_dashboard(fx.instructor.id)
        .await
        .unwrap();
    let free_stats = dashboard.iter().find(|s| s.course_id == free.id).unwrap();
    assert_eq!(free_stats.total_students_enrolled, 1);
}

#[tokio::test]
async fn deleting_a_course_leaves_no_orphans() {
    let fx = setup().await;
    let iid = fx.instructor.id;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let course = fx
        .catalog
        .create_course(iid, new_course("Stats", cat.id, 0, CourseStatus::Published))
        .await
        .unwrap();
    let section = fx.catalog.add_section(iid, course.id, "Basics").await.unwrap();
    let sub = fx
        .catalog
        .add_subsection(iid, section.id, video("mean", 60))
        .await
        .unwrap();
    fx.catalog.enroll_free(fx.student.id, course.id).await.unwrap();

    fx.catalog.delete_course(iid, course.id).await.unwrap();

    let err = fx.catalog.course_details(course.id).await.unwrap_err();
    assert!(matches!(err, StudyError::NotFound { .. }), "got: {err:?}");

    let sections = SurrealSectionRepository::new(fx.db.clone());
    let subsections = SurrealSubSectionRepository::new(fx.db.clone());
    assert!(sections.list_by_course(course.id).await.unwrap().is_empty());
    assert!(subsections.list_by_course(course.id).await.unwrap().is_empty());
    let err = subsections.get_by_id(sub.id).await.unwrap_err();
    assert!(matches!(err, StudyError::NotFound { .. }), "got: {err:?}");

    assert!(fx.catalog.enrolled_courses(fx.student.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn subsection_must_belong_to_section() {
    let fx = setup().await;
    let iid = fx.instructor.id;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let course = fx
        .catalog
        .create_course(iid, new_course("Stats", cat.id, 0, CourseStatus::Published))
        .await
        .unwrap();
    let first = fx.catalog.add_section(iid, course.id, "One").await.unwrap();
    let second = fx.catalog.add_section(iid, course.id, "Two").await.unwrap();
    let sub = fx
        .catalog
        .add_subsection(iid, first.id, video("a", 60))
        .await
        .unwrap();

    let err = fx
        .catalog
        .delete_subsection(iid, second.id, sub.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::Validation { .. }), "got: {err:?}");

    fx.catalog.delete_subsection(iid, first.id, sub.id).await.unwrap();
}

#[tokio::test]
async fn reviews_and_progress_require_enrollment() {
    let fx = setup().await;
    let iid = fx.instructor.id;
    let sid = fx.student.id;
    let cat = fx.catalog.create_category("Data", "").await.unwrap();
    let course = fx
        .catalog
        .create_course(iid, new_course("Stats", cat.id, 0, CourseStatus::Published))
        .await
        .unwrap();
    let section = fx.catalog.add_section(iid, course.id, "Basics").await.unwrap();
    let sub = fx
        .catalog
        .add_subsection(iid, section.id, video("mean", 60))
        .await
        .unwrap();

    let reviews = ReviewService::new(
        SurrealRatingRepository::new(fx.db.clone()),
        SurrealCourseRepository::new(fx.db.clone()),
        SurrealUserRepository::new(fx.db.clone()),
    );
    let progress = ProgressService::new(
        SurrealProgressRepository::new(fx.db.clone()),
        SurrealCourseRepository::new(fx.db.clone()),
        SurrealSubSectionRepository::new(fx.db.clone()),
    );

    let err = reviews.create_rating(sid, course.id, 5, "Great").await.unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");
    let err = progress.mark_completed(sid, course.id, sub.id).await.unwrap_err();
    assert!(matches!(err, StudyError::AuthorizationDenied { .. }), "got: {err:?}");

    fx.catalog.enroll_free(sid, course.id).await.unwrap();

    let err = reviews.create_rating(sid, course.id, 6, "Too much").await.unwrap_err();
    assert!(matches!(err, StudyError::Validation { .. }), "got: {err:?}");

    reviews.create_rating(sid, course.id, 4, "Good").await.unwrap();
    let err = reviews.create_rating(sid, course.id, 5, "Again").await.unwrap_err();
    assert!(matches!(err, StudyError::AlreadyExists { .. }), "got: {err:?}");
    assert_eq!(reviews.average_rating(course.id).await.unwrap(), 4.0);

    let all = reviews.all_reviews(Pagination::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].course_name, "Stats");

    assert_eq!(
        progress.mark_completed(sid, course.id, sub.id).await.unwrap(),
        CompletionOutcome::Completed
    );
    assert_eq!(
        progress.mark_completed(sid, course.id, sub.id).await.unwrap(),
        CompletionOutcome::AlreadyCompleted
    );

    let enrolled = fx.catalog.enrolled_courses(sid).await.unwrap();
    assert_eq!(enrolled[0].progress_percentage, 100.0);
}
