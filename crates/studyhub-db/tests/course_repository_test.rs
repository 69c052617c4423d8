//! Integration tests for the catalog repositories: courses, sections,
//! subsections, enrollment, and cascading deletes.

use studyhub_core::models::category::CreateCategory;
use studyhub_core::models::course::{Course, CourseStatus, CreateCourse, EnrollOutcome, UpdateCourse};
use studyhub_core::models::progress::CompletionOutcome;
use studyhub_core::models::rating::CreateRating;
use studyhub_core::models::section::{CreateSubSection, UpdateSubSection};
use studyhub_core::models::user::{AccountType, CreateUser, User};
use studyhub_core::repository::{
    CategoryRepository, CourseRepository, Pagination, ProgressRepository, RatingRepository,
    SectionRepository, SubSectionRepository, UserRepository,
};
use studyhub_db::repository::{
    SurrealCategoryRepository, SurrealCourseRepository, SurrealProgressRepository,
    SurrealRatingRepository, SurrealSectionRepository, SurrealSubSectionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    users: SurrealUserRepository<Db>,
    courses: SurrealCourseRepository<Db>,
    sections: SurrealSectionRepository<Db>,
    subsections: SurrealSubSectionRepository<Db>,
    category_id: Uuid,
    instructor: User,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    studyhub_db::run_migrations(&db).await.unwrap();

    let category = SurrealCategoryRepository::new(db.clone())
        .create(CreateCategory {
            name: "Web Development".into(),
            description: "Build for the browser".into(),
        })
        .await
        .unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let instructor = users
        .create(user("grace@example.com", AccountType::Instructor))
        .await
        .unwrap();

    Fixture {
        users,
        courses: SurrealCourseRepository::new(db.clone()),
        sections: SurrealSectionRepository::new(db.clone()),
        subsections: SurrealSubSectionRepository::new(db.clone()),
        category_id: category.id,
        instructor,
        db,
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

async fn course(fx: &Fixture, name: &str, price: u64, status: CourseStatus) -> Course {
    fx.courses
        .create(CreateCourse {
            instructor_id: fx.instructor.id,
            name: name.into(),
            description: "A course".into(),
            what_you_will_learn: "Things".into(),
            price,
            thumbnail_url: "https://img.example.com/c.png".into(),
            tags: vec!["rust".into()],
            instructions: vec!["Bring a laptop".into()],
            category_id: fx.category_id,
            status,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn create_update_and_list_courses() {
    let fx = setup().await;
    let draft = course(&fx, "Draft", 100, CourseStatus::Draft).await;
    let published = course(&fx, "Published", 100, CourseStatus::Published).await;

    assert_eq!(draft.status, CourseStatus::Draft);
    assert!(draft.students_enrolled.is_empty());

    let page = fx.courses.list_published(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, published.id);

    let updated = fx
        .courses
        .update(
            draft.id,
            UpdateCourse {
                status: Some(CourseStatus::Published),
                price: Some(250),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_published());
    assert_eq!(updated.price, 250);
    assert_eq!(updated.name, "Draft");

    let mine = fx.courses.list_by_instructor(fx.instructor.id).await.unwrap();
    assert_eq!(mine.len(), 2);

    let many = fx.courses.get_many(&[draft.id, published.id]).await.unwrap();
    assert_eq!(many.len(), 2);
}

#[tokio::test]
async fn sections_and_subsections_keep_order() {
    let fx = setup().await;
    let c = course(&fx, "Rust", 0, CourseStatus::Published).await;

    let first = fx.sections.create(c.id, "Basics").await.unwrap();
    let second = fx.sections.create(c.id, "Ownership").await.unwrap();
    assert_eq!(first.position, 1);
    assert_eq!(second.position, 2);

    let renamed = fx.sections.rename(first.id, "Getting started").await.unwrap();
    assert_eq!(renamed.name, "Getting started");

    for title in ["Install", "Hello world"] {
        fx.subsections
            .create(CreateSubSection {
                course_id: c.id,
                section_id: first.id,
                title: title.into(),
                description: String::new(),
                duration_secs: 300,
                video_url: "https://video.example.com/v.mp4".into(),
            })
            .await
            .unwrap();
    }

    let subs = fx.subsections.list_by_course(c.id).await.unwrap();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].position, 1);
    assert_eq!(subs[1].position, 2);

    let edited = fx
        .subsections
        .update(
            subs[0].id,
            UpdateSubSection {
                duration_secs: Some(600),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.duration_secs, 600);
    assert_eq!(edited.title, subs[0].title);

    let sections = fx.sections.list_by_course(c.id).await.unwrap();
    assert_eq!(
        sections.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    fx.sections.delete(first.id).await.unwrap();
    assert!(fx.subsections.list_by_course(c.id).await.unwrap().is_empty());
    assert_eq!(fx.sections.list_by_course(c.id).await.unwrap().len(), 1);
}

fn video(course_id: Uuid, section_id: Uuid, title: &str) -> CreateSubSection {
    CreateSubSection {
        course_id,
        section_id,
        title: title.into(),
        description: String::new(),
        duration_secs: 60,
        video_url: "https://video.example.com/v.mp4".into(),
    }
}

#[tokio::test]
async fn deleting_from_the_middle_keeps_positions_dense() {
    let fx = setup().await;
    let c = course(&fx, "Rust", 0, CourseStatus::Published).await;

    let mut sections = Vec::new();
    for name in ["One", "Two", "Three"] {
        sections.push(fx.sections.create(c.id, name).await.unwrap());
    }
    fx.sections.delete(sections[1].id).await.unwrap();
    let fourth = fx.sections.create(c.id, "Four").await.unwrap();
    assert_eq!(fourth.position, 3);

    let listed = fx.sections.list_by_course(c.id).await.unwrap();
    assert_eq!(
        listed.iter().map(|s| s.position).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        listed.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        vec!["One", "Three", "Four"]
    );

    let section_id = sections[0].id;
    let mut subs = Vec::new();
    for title in ["a", "b", "c"] {
        subs.push(
            fx.subsections
                .create(video(c.id, section_id, title))
                .await
                .unwrap(),
        );
    }
    fx.subsections.delete(subs[0].id).await.unwrap();
    let added = fx
        .subsections
        .create(video(c.id, section_id, "d"))
        .await
        .unwrap();
    assert_eq!(added.position, 3);

    let listed = fx.subsections.list_by_course(c.id).await.unwrap();
    assert_eq!(
        listed
            .iter()
            .map(|s| (s.title.as_str(), s.position))
            .collect::<Vec<_>>(),
        vec![("b", 1), ("c", 2), ("d", 3)]
    );
}

#[tokio::test]
async fn deleting_section_drops_its_completed_videos() {
    let fx = setup().await;
    let c = course(&fx, "Rust", 0, CourseStatus::Published).await;
    let student = fx
        .users
        .create(user("ada@example.com", AccountType::Student))
        .await
        .unwrap();

    let doomed = fx.sections.create(c.id, "Doomed").await.unwrap();
    let kept = fx.sections.create(c.id, "Kept").await.unwrap();
    let gone = fx
        .subsections
        .create(video(c.id, doomed.id, "gone"))
        .await
        .unwrap();
    let stays = fx
        .subsections
        .create(video(c.id, kept.id, "stays"))
        .await
        .unwrap();

    let progress = SurrealProgressRepository::new(fx.db.clone());
    progress.mark_completed(student.id, c.id, gone.id).await.unwrap();
    progress.mark_completed(student.id, c.id, stays.id).await.unwrap();

    fx.sections.delete(doomed.id).await.unwrap();

    let record = progress.get(student.id, c.id).await.unwrap().unwrap();
    assert_eq!(record.completed_videos, vec![stays.id]);

    let remaining = fx.sections.list_by_course(c.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].position, 1);
}

#[tokio::test]
async fn courses_with_sections_filters_empty_courses() {
    let fx = setup().await;
    let with = course(&fx, "With", 0, CourseStatus::Published).await;
    let without = course(&fx, "Without", 0, CourseStatus::Published).await;
    fx.sections.create(with.id, "Intro").await.unwrap();

    let ids = fx
        .sections
        .courses_with_sections(&[with.id, without.id])
        .await
        .unwrap();
    assert_eq!(ids, vec![with.id]);
}

#[tokio::test]
async fn enroll_is_idempotent() {
    let fx = setup().await;
    let c = course(&fx, "Rust", 0, CourseStatus::Published).await;
    let student = fx
        .users
        .create(user("ada@example.com", AccountType::Student))
        .await
        .unwrap();

    let first = fx.courses.enroll(student.id, c.id).await.unwrap();
    let second = fx.courses.enroll(student.id, c.id).await.unwrap();
    assert_eq!(first, EnrollOutcome::Enrolled);
    assert_eq!(second, EnrollOutcome::AlreadyEnrolled);

    let student = fx.users.get_by_id(student.id).await.unwrap();
    let c = fx.courses.get_by_id(c.id).await.unwrap();
    assert_eq!(student.enrolled_courses, vec![c.id]);
    assert_eq!(c.students_enrolled, vec![student.id]);
}

#[tokio::test]
async fn top_selling_orders_by_enrollment() {
    let fx = setup().await;
    let quiet = course(&fx, "Quiet", 0, CourseStatus::Published).await;
    let popular = course(&fx, "Popular", 0, CourseStatus::Published).await;

    for email in ["a@example.com", "b@example.com"] {
        let s = fx
            .users
            .create(user(email, AccountType::Student))
            .await
            .unwrap();
        fx.courses.enroll(s.id, popular.id).await.unwrap();
    }

    let top = fx.courses.top_selling(10).await.unwrap();
    assert_eq!(top[0].id, popular.id);
    assert_eq!(top[1].id, quiet.id);
}

#[tokio::test]
async fn deleting_course_cascades() {
    let fx = setup().await;
    let c = course(&fx, "Rust", 0, CourseStatus::Published).await;
    let section = fx.sections.create(c.id, "Intro").await.unwrap();
    let sub = fx
        .subsections
        .create(CreateSubSection {
            course_id: c.id,
            section_id: section.id,
            title: "Welcome".into(),
            description: String::new(),
            duration_secs: 60,
            video_url: "https://video.example.com/w.mp4".into(),
        })
        .await
        .unwrap();
    let student = fx
        .users
        .create(user("ada@example.com", AccountType::Student))
        .await
        .unwrap();
    fx.courses.enroll(student.id, c.id).await.unwrap();

    let progress = SurrealProgressRepository::new(fx.db.clone());
    progress.mark_completed(student.id, c.id, sub.id).await.unwrap();
    let ratings = SurrealRatingRepository::new(fx.db.clone());
    ratings
        .create(CreateRating {
            user_id: student.id,
            course_id: c.id,
            rating: 4,
            review: "Solid".into(),
        })
        .await
        .unwrap();

    fx.courses.delete(c.id).await.unwrap();

    assert!(fx.courses.get_by_id(c.id).await.is_err());
    assert!(fx.sections.list_by_course(c.id).await.unwrap().is_empty());
    assert!(fx.subsections.list_by_course(c.id).await.unwrap().is_empty());
    assert!(progress.get(student.id, c.id).await.unwrap().is_none());
    assert!(ratings.average_for_course(c.id).await.unwrap().is_none());
    let student = fx.users.get_by_id(student.id).await.unwrap();
    assert!(student.enrolled_courses.is_empty());
}

#[tokio::test]
async fn deleting_user_removes_enrollments() {
    let fx = setup().await;
    let c = course(&fx, "Rust", 0, CourseStatus::Published).await;
    let student = fx
        .users
        .create(user("ada@example.com", AccountType::Student))
        .await
        .unwrap();
    fx.courses.enroll(student.id, c.id).await.unwrap();

    fx.users.delete(student.id).await.unwrap();

    let c = fx.courses.get_by_id(c.id).await.unwrap();
    assert!(c.students_enrolled.is_empty());
    assert!(fx.users.get_by_id(student.id).await.is_err());
}

#[tokio::test]
async fn progress_marks_each_video_once() {
    let fx = setup().await;
    let progress = SurrealProgressRepository::new(fx.db.clone());
    let (user_id, course_id, video) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    assert!(progress.get(user_id, course_id).await.unwrap().is_none());
    assert_eq!(
        progress.mark_completed(user_id, course_id, video).await.unwrap(),
        CompletionOutcome::Completed
    );
    assert_eq!(
        progress.mark_completed(user_id, course_id, video).await.unwrap(),
        CompletionOutcome::AlreadyCompleted
    );
    assert_eq!(
        progress
            .mark_completed(user_id, course_id, Uuid::new_v4())
            .await
            .unwrap(),
        CompletionOutcome::Completed
    );

    let record = progress.get(user_id, course_id).await.unwrap().unwrap();
    assert_eq!(record.completed_videos.len(), 2);
}

#[tokio::test]
async fn ratings_average_and_ordering() {
    let fx = setup().await;
    let ratings = SurrealRatingRepository::new(fx.db.clone());
    let course_id = Uuid::new_v4();

    for score in [3, 5] {
        ratings
            .create(CreateRating {
                user_id: Uuid::new_v4(),
                course_id,
                rating: score,
                review: format!("{score} stars"),
            })
            .await
            .unwrap();
    }

    let avg = ratings.average_for_course(course_id).await.unwrap().unwrap();
    assert!((avg - 4.0).abs() < f64::EPSILON);

    let all = ratings.list(Pagination::default()).await.unwrap();
    assert_eq!(all[0].rating, 5);
    assert_eq!(all[1].rating, 3);
}

#[tokio::test]
async fn one_review_per_user_and_course() {
    let fx = setup().await;
    let ratings = SurrealRatingRepository::new(fx.db.clone());
    let input = CreateRating {
        user_id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        rating: 5,
        review: "Great".into(),
    };

    ratings.create(input.clone()).await.unwrap();
    let err = ratings.create(input.clone()).await.unwrap_err();
    assert!(
        matches!(err, studyhub_core::error::StudyError::AlreadyExists { .. }),
        "expected AlreadyExists, got: {err:?}"
    );
    assert!(
        ratings
            .find_by_user_and_course(input.user_id, input.course_id)
            .await
            .unwrap()
            .is_some()
    );
}
