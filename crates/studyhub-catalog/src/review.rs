//! Ratings and reviews.

use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::rating::{CreateRating, MAX_RATING, MIN_RATING, RatingAndReview};
use studyhub_core::repository::{CourseRepository, Pagination, RatingRepository, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::views::{ReviewView, ReviewerSummary};

pub struct ReviewService<R, C, U> {
    ratings: R,
    courses: C,
    users: U,
}

impl<R, C, U> ReviewService<R, C, U>
where
    R: RatingRepository,
    C: CourseRepository,
    U: UserRepository,
{
    pub fn new(ratings: R, courses: C, users: U) -> Self {
        Self {
            ratings,
            courses,
            users,
        }
    }

    /// Leave a review. The author must be enrolled and may review a
    /// course only once.
    pub async fn create_rating(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        rating: u32,
        review: &str,
    ) -> StudyResult<RatingAndReview> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(StudyError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let course = self.courses.get_by_id(course_id).await?;
        if !course.has_student(user_id) {
            return Err(StudyError::denied("student is not enrolled in this course"));
        }

        if self
            .ratings
            .find_by_user_and_course(user_id, course_id)
            .await?
            .is_some()
        {
            return Err(StudyError::AlreadyExists {
                entity: "rating".into(),
            });
        }

        let created = self
            .ratings
            .create(CreateRating {
                user_id,
                course_id,
                rating,
                review: review.trim().to_string(),
            })
            .await?;

        info!(%user_id, %course_id, rating, "Review created");
        Ok(created)
    }

    /// Mean rating of a course, `0.0` when it has no reviews.
    pub async fn average_rating(&self, course_id: Uuid) -> StudyResult<f64> {
        Ok(self
            .ratings
            .average_for_course(course_id)
            .await?
            .unwrap_or(0.0))
    }

    /// Reviews across all courses with reviewer and course names.
    ///
    /// Reviews whose author account has since been deleted are skipped.
    pub async fn all_reviews(&self, pagination: Pagination) -> StudyResult<Vec<ReviewView>> {
        let ratings = self.ratings.list(pagination).await?;

        let mut views = Vec::with_capacity(ratings.len());
        for r in ratings {
            let user = match self.users.get_by_id(r.user_id).await {
                Ok(u) => u,
                Err(StudyError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            let course = match self.courses.get_by_id(r.course_id).await {
                Ok(c) => c,
                Err(StudyError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };

            views.push(ReviewView {
                id: r.id,
                rating: r.rating,
                review: r.review,
                created_at: r.created_at,
                user: ReviewerSummary {
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email: user.email,
                    image_url: user.image_url,
                },
                course_id: course.id,
                course_name: course.name,
            });
        }
        Ok(views)
    }
}
