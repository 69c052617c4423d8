//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Operations that touch more than
//! one document (enrollment, settlement, cascading deletes) must be
//! atomic in the implementation.

use uuid::Uuid;

use crate::error::StudyResult;
use crate::models::{
    category::{Category, CreateCategory},
    contact::{ContactMessage, CreateContactMessage},
    course::{Course, CreateCourse, EnrollOutcome, UpdateCourse},
    payment::{CreatePayment, Payment, Settlement},
    progress::{CompletionOutcome, CourseProgress},
    rating::{CreateRating, RatingAndReview},
    section::{CreateSubSection, Section, SubSection, UpdateSubSection},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = StudyResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StudyResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = StudyResult<User>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser)
    -> impl Future<Output = StudyResult<User>> + Send;
    /// Replace the stored password hash with a hash of `new_password`.
    fn set_password(
        &self,
        id: Uuid,
        new_password: &str,
    ) -> impl Future<Output = StudyResult<()>> + Send;
    /// Delete the account, its progress records, and its enrollments in
    /// a single transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = StudyResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub trait CategoryRepository: Send + Sync {
    fn create(&self, input: CreateCategory)
    -> impl Future<Output = StudyResult<Category>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StudyResult<Category>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = StudyResult<Category>> + Send;
    fn list(&self) -> impl Future<Output = StudyResult<Vec<Category>>> + Send;
}

pub trait CourseRepository: Send + Sync {
    fn create(&self, input: CreateCourse) -> impl Future<Output = StudyResult<Course>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StudyResult<Course>> + Send;
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = StudyResult<Vec<Course>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCourse,
    ) -> impl Future<Output = StudyResult<Course>> + Send;
    /// Delete the course together with its sections, subsections,
    /// reviews, progress records, pending payments, and every student's
    /// enrollment entry.
    fn delete(&self, id: Uuid) -> impl Future<Output = StudyResult<()>> + Send;
    fn list_published(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = StudyResult<PaginatedResult<Course>>> + Send;
    fn list_by_instructor(
        &self,
        instructor_id: Uuid,
    ) -> impl Future<Output = StudyResult<Vec<Course>>> + Send;
    /// Published courses in a category.
    fn list_published_by_category(
        &self,
        category_id: Uuid,
    ) -> impl Future<Output = StudyResult<Vec<Course>>> + Send;
    /// Published courses ordered by enrolled-student count, descending.
    fn top_selling(&self, limit: u64) -> impl Future<Output = StudyResult<Vec<Course>>> + Send;
    /// Atomically add the course to the user's list and the user to the
    /// course's students. Never duplicates entries.
    fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> impl Future<Output = StudyResult<EnrollOutcome>> + Send;
}

pub trait SectionRepository: Send + Sync {
    /// Append a section at the end of the course.
    fn create(
        &self,
        course_id: Uuid,
        name: &str,
    ) -> impl Future<Output = StudyResult<Section>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StudyResult<Section>> + Send;
    fn rename(&self, id: Uuid, name: &str) -> impl Future<Output = StudyResult<Section>> + Send;
    /// Delete the section and its subsections, dropping their
    /// completions and renumbering the remaining sections.
    fn delete(&self, id: Uuid) -> impl Future<Output = StudyResult<()>> + Send;
    /// Sections of a course ordered by position.
    fn list_by_course(
        &self,
        course_id: Uuid,
    ) -> impl Future<Output = StudyResult<Vec<Section>>> + Send;
    /// The subset of `course_ids` that have at least one section.
    fn courses_with_sections(
        &self,
        course_ids: &[Uuid],
    ) -> impl Future<Output = StudyResult<Vec<Uuid>>> + Send;
}

pub trait SubSectionRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSubSection,
    ) -> impl Future<Output = StudyResult<SubSection>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StudyResult<SubSection>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSubSection,
    ) -> impl Future<Output = StudyResult<SubSection>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = StudyResult<()>> + Send;
    /// Subsections of a course ordered by section then position.
    fn list_by_course(
        &self,
        course_id: Uuid,
    ) -> impl Future<Output = StudyResult<Vec<SubSection>>> + Send;
}

// ---------------------------------------------------------------------------
// Learning activity
// ---------------------------------------------------------------------------

pub trait RatingRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRating,
    ) -> impl Future<Output = StudyResult<RatingAndReview>> + Send;
    fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> impl Future<Output = StudyResult<Option<RatingAndReview>>> + Send;
    /// Average rating of a course, `None` when it has no reviews.
    fn average_for_course(
        &self,
        course_id: Uuid,
    ) -> impl Future<Output = StudyResult<Option<f64>>> + Send;
    /// Reviews ordered by rating (highest first), then most recent.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = StudyResult<Vec<RatingAndReview>>> + Send;
}

pub trait ProgressRepository: Send + Sync {
    fn get(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> impl Future<Output = StudyResult<Option<CourseProgress>>> + Send;
    /// Record `subsection_id` as completed, creating the progress record
    /// on first use.
    fn mark_completed(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        subsection_id: Uuid,
    ) -> impl Future<Output = StudyResult<CompletionOutcome>> + Send;
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

pub trait PaymentRepository: Send + Sync {
    fn create(&self, input: CreatePayment)
    -> impl Future<Output = StudyResult<Payment>> + Send;
    fn get_by_order_id(&self, order_id: &str)
    -> impl Future<Output = StudyResult<Payment>> + Send;
    /// Mark the payment paid and grant enrollment, exactly once.
    ///
    /// A payment that is already `Paid` is returned as
    /// [`Settlement::AlreadySettled`] with no side effects.
    fn settle(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
    ) -> impl Future<Output = StudyResult<Settlement>> + Send;
}

// ---------------------------------------------------------------------------
// Contact form
// ---------------------------------------------------------------------------

pub trait ContactRepository: Send + Sync {
    fn create(
        &self,
        input: CreateContactMessage,
    ) -> impl Future<Output = StudyResult<ContactMessage>> + Send;
}
