//! Catalog service: categories, courses, course content, enrollment
//! and instructor dashboards.

use serde::Deserialize;
use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::category::{Category, CreateCategory};
use studyhub_core::models::course::{Course, CourseStatus, CreateCourse, EnrollOutcome, UpdateCourse};
use studyhub_core::models::section::{CreateSubSection, Section, SubSection, UpdateSubSection};
use studyhub_core::models::user::AccountType;
use studyhub_core::repository::{
    CategoryRepository, CourseRepository, PaginatedResult, Pagination, ProgressRepository,
    RatingRepository, SectionRepository, SubSectionRepository, UserRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::views::{
    CategoryCourses, CategoryPageDetails, CategorySummary, CourseDetails, EnrolledCourse,
    FullCourseDetails, InstructorCourseStats, InstructorSummary, build_content,
    progress_percentage, total_duration,
};

/// Number of courses shown in the "most selling" strip.
const TOP_SELLING_LIMIT: u64 = 10;

/// Course fields supplied by an instructor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub what_you_will_learn: String,
    pub price: u64,
    pub thumbnail_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub category_id: Uuid,
    #[serde(default)]
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubSection {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_secs: u64,
    pub video_url: String,
}

fn require_http_url(field: &str, url: &str) -> StudyResult<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(StudyError::validation(format!("{field} must be an http(s) URL")))
    }
}

fn require_non_blank(field: &str, value: &str) -> StudyResult<()> {
    if value.trim().is_empty() {
        Err(StudyError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Catalog service.
///
/// Generic over repository implementations so that the catalog has no
/// dependency on the database crate.
pub struct CatalogService<G, C, S, B, U, R, P> {
    categories: G,
    courses: C,
    sections: S,
    subsections: B,
    users: U,
    ratings: R,
    progress: P,
}

impl<G, C, S, B, U, R, P> CatalogService<G, C, S, B, U, R, P>
where
    G: CategoryRepository,
    C: CourseRepository,
    S: SectionRepository,
    B: SubSectionRepository,
    U: UserRepository,
    R: RatingRepository,
    P: ProgressRepository,
{
    pub fn new(
        categories: G,
        courses: C,
        sections: S,
        subsections: B,
        users: U,
        ratings: R,
        progress: P,
    ) -> Self {
        Self {
            categories,
            courses,
            sections,
            subsections,
            users,
            ratings,
            progress,
        }
    }

    // -----------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------

    pub async fn create_category(&self, name: &str, description: &str) -> StudyResult<Category> {
        require_non_blank("category name", name)?;

        let category = self
            .categories
            .create(CreateCategory {
                name: name.trim().to_string(),
                description: description.trim().to_string(),
            })
            .await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn list_categories(&self) -> StudyResult<Vec<CategorySummary>> {
        let categories = self.categories.list().await?;
        let mut summaries = Vec::with_capacity(categories.len());
        for category in &categories {
            let courses = self.listable_courses(category.id).await?;
            summaries.push(CategorySummary::new(category, courses.len()));
        }
        Ok(summaries)
    }

    /// Published courses in the category that have at least one section.
    pub async fn listable_courses(&self, category_id: Uuid) -> StudyResult<Vec<Course>> {
        let published = self
            .courses
            .list_published_by_category(category_id)
            .await?;
        let ids: Vec<Uuid> = published.iter().map(|c| c.id).collect();
        let with_sections = self.sections.courses_with_sections(&ids).await?;

        Ok(published
            .into_iter()
            .filter(|c| with_sections.contains(&c.id))
            .collect())
    }

    pub async fn category_page_details(&self, category_id: Uuid) -> StudyResult<CategoryPageDetails> {
        let category = self.categories.get_by_id(category_id).await?;
        let selected = CategoryCourses {
            courses: self.listable_courses(category.id).await?,
            category,
        };

        let mut different = None;
        for other in self.categories.list().await? {
            if other.id == category_id {
                continue;
            }
            let courses = self.listable_courses(other.id).await?;
            if !courses.is_empty() {
                different = Some(CategoryCourses {
                    category: other,
                    courses,
                });
                break;
            }
        }

        let most_selling = self.courses.top_selling(TOP_SELLING_LIMIT).await?;

        Ok(CategoryPageDetails {
            selected_category: selected,
            different_category: different,
            most_selling_courses: most_selling,
        })
    }

    // -----------------------------------------------------------------
    // Courses
    // -----------------------------------------------------------------

    pub async fn create_course(&self, instructor_id: Uuid, input: NewCourse) -> StudyResult<Course> {
        require_non_blank("course name", &input.name)?;
        require_non_blank("course description", &input.description)?;
        require_http_url("thumbnail", &input.thumbnail_url)?;

        let instructor = self.users.get_by_id(instructor_id).await?;
        if instructor.account_type != AccountType::Instructor {
            return Err(StudyError::denied("only instructors can create courses"));
        }
        self.categories.get_by_id(input.category_id).await?;

        let course = self
            .courses
            .create(CreateCourse {
                instructor_id,
                name: input.name.trim().to_string(),
                description: input.description,
                what_you_will_learn: input.what_you_will_learn,
                price: input.price,
                thumbnail_url: input.thumbnail_url,
                tags: input.tags,
                instructions: input.instructions,
                category_id: input.category_id,
                status: input.status.unwrap_or_default(),
            })
            .await?;

        info!(course_id = %course.id, %instructor_id, "Course created");
        Ok(course)
    }

    /// Load a course and check that `instructor_id` owns it.
    async fn owned_course(&self, instructor_id: Uuid, course_id: Uuid) -> StudyResult<Course> {
        let course = self.courses.get_by_id(course_id).await?;
        if course.instructor_id != instructor_id {
            return Err(StudyError::denied("course belongs to another instructor"));
        }
        Ok(course)
    }

    pub async fn edit_course(
        &self,
        instructor_id: Uuid,
        course_id: Uuid,
        update: UpdateCourse,
    ) -> StudyResult<CourseDetails> {
        self.owned_course(instructor_id, course_id).await?;

        if let Some(name) = &update.name {
            require_non_blank("course name", name)?;
        }
        if let Some(url) = &update.thumbnail_url {
            require_http_url("thumbnail", url)?;
        }
        if let Some(category_id) = update.category_id {
            self.categories.get_by_id(category_id).await?;
        }

        self.courses.update(course_id, update).await?;
        self.details(course_id, true).await
    }

    pub async fn delete_course(&self, instructor_id: Uuid, course_id: Uuid) -> StudyResult<()> {
        self.owned_course(instructor_id, course_id).await?;
        self.courses.delete(course_id).await?;
        info!(%course_id, %instructor_id, "Course deleted");
        Ok(())
    }

    pub async fn list_published_courses(
        &self,
        pagination: Pagination,
    ) -> StudyResult<PaginatedResult<Course>> {
        self.courses.list_published(pagination).await
    }

    pub async fn instructor_courses(&self, instructor_id: Uuid) -> StudyResult<Vec<Course>> {
        self.courses.list_by_instructor(instructor_id).await
    }

    pub async fn instructor_dashboard(
        &self,
        instructor_id: Uuid,
    ) -> StudyResult<Vec<InstructorCourseStats>> {
        let courses = self.courses.list_by_instructor(instructor_id).await?;
        Ok(courses.iter().map(InstructorCourseStats::from).collect())
    }

    async fn details(&self, course_id: Uuid, with_video: bool) -> StudyResult<CourseDetails> {
        let course = self.courses.get_by_id(course_id).await?;

        let category = match self.categories.get_by_id(course.category_id).await {
            Ok(c) => Some(c),
            Err(StudyError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        let instructor = match self.users.get_by_id(course.instructor_id).await {
            Ok(u) => Some(InstructorSummary::from(&u)),
            Err(StudyError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let sections = self.sections.list_by_course(course_id).await?;
        let subsections = self.subsections.list_by_course(course_id).await?;
        let (total_secs, total_label) = total_duration(&subsections);
        let average_rating = self
            .ratings
            .average_for_course(course_id)
            .await?
            .unwrap_or(0.0);

        Ok(CourseDetails {
            sections: build_content(&sections, &subsections, with_video),
            course,
            category,
            instructor,
            total_duration_secs: total_secs,
            total_duration: total_label,
            average_rating,
        })
    }

    /// Public course page. Video URLs are withheld.
    pub async fn course_details(&self, course_id: Uuid) -> StudyResult<CourseDetails> {
        self.details(course_id, false).await
    }

    /// Course content with video URLs and the caller's progress.
    ///
    /// Only the owning instructor, an enrolled student or an admin may
    /// see it.
    pub async fn full_course_details(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StudyResult<FullCourseDetails> {
        let user = self.users.get_by_id(user_id).await?;
        let course = self.courses.get_by_id(course_id).await?;

        let entitled = user.account_type == AccountType::Admin
            || course.instructor_id == user_id
            || course.has_student(user_id);
        if !entitled {
            return Err(StudyError::denied("not enrolled in this course"));
        }

        let details = self.details(course_id, true).await?;
        let completed_videos = self
            .progress
            .get(user_id, course_id)
            .await?
            .map(|p| p.completed_videos)
            .unwrap_or_default();

        Ok(FullCourseDetails {
            details,
            completed_videos,
        })
    }

    // -----------------------------------------------------------------
    // Sections and subsections
    // -----------------------------------------------------------------

    pub async fn add_section(
        &self,
        instructor_id: Uuid,
        course_id: Uuid,
        name: &str,
    ) -> StudyResult<Section> {
        require_non_blank("section name", name)?;
        self.owned_course(instructor_id, course_id).await?;
        self.sections.create(course_id, name.trim()).await
    }

    /// Load a section and check its course is owned by `instructor_id`.
    async fn owned_section(&self, instructor_id: Uuid, section_id: Uuid) -> StudyResult<Section> {
        let section = self.sections.get_by_id(section_id).await?;
        self.owned_course(instructor_id, section.course_id).await?;
        Ok(section)
    }

    pub async fn update_section(
        &self,
        instructor_id: Uuid,
        section_id: Uuid,
        name: &str,
    ) -> StudyResult<Section> {
        require_non_blank("section name", name)?;
        self.owned_section(instructor_id, section_id).await?;
        self.sections.rename(section_id, name.trim()).await
    }

    pub async fn delete_section(&self, instructor_id: Uuid, section_id: Uuid) -> StudyResult<()> {
        self.owned_section(instructor_id, section_id).await?;
        self.sections.delete(section_id).await
    }

    pub async fn add_subsection(
        &self,
        instructor_id: Uuid,
        section_id: Uuid,
        input: NewSubSection,
    ) -> StudyResult<SubSection> {
        require_non_blank("title", &input.title)?;
        require_http_url("video", &input.video_url)?;
        let section = self.owned_section(instructor_id, section_id).await?;

        self.subsections
            .create(CreateSubSection {
                course_id: section.course_id,
                section_id,
                title: input.title.trim().to_string(),
                description: input.description,
                duration_secs: input.duration_secs,
                video_url: input.video_url,
            })
            .await
    }

    /// Load a subsection and check it sits in `section_id` of a course
    /// owned by `instructor_id`.
    async fn owned_subsection(
        &self,
        instructor_id: Uuid,
        section_id: Uuid,
        subsection_id: Uuid,
    ) -> StudyResult<SubSection> {
        let sub = self.subsections.get_by_id(subsection_id).await?;
        if sub.section_id != section_id {
            return Err(StudyError::validation(
                "subsection does not belong to the given section",
            ));
        }
        self.owned_section(instructor_id, section_id).await?;
        Ok(sub)
    }

    pub async fn update_subsection(
        &self,
        instructor_id: Uuid,
        section_id: Uuid,
        subsection_id: Uuid,
        update: UpdateSubSection,
    ) -> StudyResult<SubSection> {
        if let Some(title) = &update.title {
            require_non_blank("title", title)?;
        }
        if let Some(url) = &update.video_url {
            require_http_url("video", url)?;
        }
        self.owned_subsection(instructor_id, section_id, subsection_id)
            .await?;
        self.subsections.update(subsection_id, update).await
    }

    pub async fn delete_subsection(
        &self,
        instructor_id: Uuid,
        section_id: Uuid,
        subsection_id: Uuid,
    ) -> StudyResult<()> {
        self.owned_subsection(instructor_id, section_id, subsection_id)
            .await?;
        self.subsections.delete(subsection_id).await
    }

    // -----------------------------------------------------------------
    // Enrollment
    // -----------------------------------------------------------------

    /// Enroll without payment. Only published courses priced at zero.
    pub async fn enroll_free(&self, user_id: Uuid, course_id: Uuid) -> StudyResult<()> {
        let course = self.courses.get_by_id(course_id).await?;
        if !course.is_published() {
            return Err(StudyError::not_found("course", course_id));
        }
        if !course.is_free() {
            return Err(StudyError::validation("course requires payment"));
        }
        self.users.get_by_id(user_id).await?;

        match self.courses.enroll(user_id, course_id).await? {
            EnrollOutcome::Enrolled => {
                info!(%user_id, %course_id, "Student enrolled");
                Ok(())
            }
            EnrollOutcome::AlreadyEnrolled => Err(StudyError::AlreadyEnrolled {
                course_id: course_id.to_string(),
            }),
        }
    }

    pub async fn enrolled_courses(&self, user_id: Uuid) -> StudyResult<Vec<EnrolledCourse>> {
        let user = self.users.get_by_id(user_id).await?;
        let courses = self.courses.get_many(&user.enrolled_courses).await?;

        let mut enrolled = Vec::with_capacity(courses.len());
        for course in courses {
            let subsections = self.subsections.list_by_course(course.id).await?;
            let (_, label) = total_duration(&subsections);
            let completed = self
                .progress
                .get(user_id, course.id)
                .await?
                .map(|p| p.completed_videos.len())
                .unwrap_or(0);

            enrolled.push(EnrolledCourse {
                progress_percentage: progress_percentage(completed, subsections.len()),
                total_duration: label,
                course,
            });
        }
        Ok(enrolled)
    }
}
