//! Per-student course progress.

use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::progress::CompletionOutcome;
use studyhub_core::repository::{CourseRepository, ProgressRepository, SubSectionRepository};
use tracing::debug;
use uuid::Uuid;

pub struct ProgressService<P, C, B> {
    progress: P,
    courses: C,
    subsections: B,
}

impl<P, C, B> ProgressService<P, C, B>
where
    P: ProgressRepository,
    C: CourseRepository,
    B: SubSectionRepository,
{
    pub fn new(progress: P, courses: C, subsections: B) -> Self {
        Self {
            progress,
            courses,
            subsections,
        }
    }

    /// Record a watched video for an enrolled student.
    pub async fn mark_completed(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        subsection_id: Uuid,
    ) -> StudyResult<CompletionOutcome> {
        let course = self.courses.get_by_id(course_id).await?;
        if !course.has_student(user_id) {
            return Err(StudyError::denied("student is not enrolled in this course"));
        }

        let sub = self.subsections.get_by_id(subsection_id).await?;
        if sub.course_id != course_id {
            return Err(StudyError::validation(
                "subsection does not belong to this course",
            ));
        }

        let outcome = self
            .progress
            .mark_completed(user_id, course_id, subsection_id)
            .await?;
        debug!(%user_id, %course_id, %subsection_id, ?outcome, "Progress updated");
        Ok(outcome)
    }
}
