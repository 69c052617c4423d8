//! Read models returned by the catalog services.
//!
//! These are the shapes handed to API clients; they aggregate several
//! documents and hide fields a caller is not entitled to see.

use chrono::{DateTime, Utc};
use serde::Serialize;
use studyhub_core::models::category::Category;
use studyhub_core::models::course::Course;
use studyhub_core::models::section::{Section, SubSection};
use studyhub_core::models::user::User;
use uuid::Uuid;

use crate::duration::format_duration;

/// A category as listed in the navigation menu.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Path segment used by `/catalog/:slug`.
    pub slug: String,
    /// Number of listable courses in the category.
    pub course_count: usize,
}

impl CategorySummary {
    pub fn new(category: &Category, course_count: usize) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            slug: category.slug(),
            course_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCourses {
    pub category: Category,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPageDetails {
    pub selected_category: CategoryCourses,
    pub different_category: Option<CategoryCourses>,
    pub most_selling_courses: Vec<Course>,
}

/// Public facts about a course's instructor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    pub about: Option<String>,
}

impl From<&User> for InstructorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            image_url: user.image_url.clone(),
            about: user.profile.about.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSectionView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_secs: u64,
    /// Only present for callers entitled to watch the course.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub position: u32,
}

impl SubSectionView {
    pub fn new(sub: &SubSection, with_video: bool) -> Self {
        Self {
            id: sub.id,
            title: sub.title.clone(),
            description: sub.description.clone(),
            duration_secs: sub.duration_secs,
            video_url: with_video.then(|| sub.video_url.clone()),
            position: sub.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionContent {
    pub id: Uuid,
    pub name: String,
    pub position: u32,
    pub subsections: Vec<SubSectionView>,
}

/// Group subsections under their sections, both in position order.
pub fn build_content(
    sections: &[Section],
    subsections: &[SubSection],
    with_video: bool,
) -> Vec<SectionContent> {
    sections
        .iter()
        .map(|section| {
            let mut subs: Vec<&SubSection> = subsections
                .iter()
                .filter(|s| s.section_id == section.id)
                .collect();
            subs.sort_by_key(|s| s.position);
            SectionContent {
                id: section.id,
                name: section.name.clone(),
                position: section.position,
                subsections: subs
                    .into_iter()
                    .map(|s| SubSectionView::new(s, with_video))
                    .collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub course: Course,
    pub category: Option<Category>,
    pub instructor: Option<InstructorSummary>,
    pub sections: Vec<SectionContent>,
    pub total_duration_secs: u64,
    pub total_duration: String,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCourseDetails {
    #[serde(flatten)]
    pub details: CourseDetails,
    pub completed_videos: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    pub course: Course,
    pub total_duration: String,
    /// Completed share of the course's videos, 0–100, two decimals.
    pub progress_percentage: f64,
}

/// Completed share of `total` as a percentage rounded to two decimals.
/// A course without videos counts as complete.
pub fn progress_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let pct = completed.min(total) as f64 * 100.0 / total as f64;
    (pct * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourseStats {
    pub course_id: Uuid,
    pub course_name: String,
    pub course_description: String,
    pub total_students_enrolled: usize,
    /// Students × price, in whole currency units.
    pub total_amount_generated: u64,
}

impl From<&Course> for InstructorCourseStats {
    fn from(course: &Course) -> Self {
        let students = course.students_enrolled.len();
        Self {
            course_id: course.id,
            course_name: course.name.clone(),
            course_description: course.description.clone(),
            total_students_enrolled: students,
            total_amount_generated: students as u64 * course.price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerSummary {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub rating: u32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub user: ReviewerSummary,
    pub course_id: Uuid,
    pub course_name: String,
}

/// Sum of subsection durations, formatted.
pub fn total_duration(subsections: &[SubSection]) -> (u64, String) {
    let secs = subsections.iter().map(|s| s.duration_secs).sum();
    (secs, format_duration(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_rounded_and_capped() {
        assert_eq!(progress_percentage(0, 0), 100.0);
        assert_eq!(progress_percentage(1, 3), 33.33);
        assert_eq!(progress_percentage(2, 3), 66.67);
        assert_eq!(progress_percentage(5, 3), 100.0);
    }

    #[test]
    fn content_is_grouped_by_section() {
        let course_id = Uuid::new_v4();
        let now = Utc::now();
        let sections: Vec<Section> = (1..=2)
            .map(|position| Section {
                id: Uuid::new_v4(),
                course_id,
                name: format!("Section {position}"),
                position,
                created_at: now,
            })
            .collect();
        let sub = |section: &Section, position: u32| SubSection {
            id: Uuid::new_v4(),
            course_id,
            section_id: section.id,
            title: format!("Video {position}"),
            description: String::new(),
            duration_secs: 60,
            video_url: "https://video.example.com/v.mp4".into(),
            position,
            created_at: now,
        };
        let subs = vec![
            sub(&sections[1], 1),
            sub(&sections[0], 2),
            sub(&sections[0], 1),
        ];

        let content = build_content(&sections, &subs, false);
        assert_eq!(content.len(), 2);
        assert_eq!(content[0].subsections.len(), 2);
        assert_eq!(content[0].subsections[0].title, "Video 1");
        assert!(content[0].subsections[0].video_url.is_none());
        assert_eq!(content[1].subsections.len(), 1);

        let (secs, label) = total_duration(&subs);
        assert_eq!(secs, 180);
        assert_eq!(label, "3m 0s");
    }
}
