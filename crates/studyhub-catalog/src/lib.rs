//! StudyHub Catalog: categories, courses and their content, enrollment,
//! reviews, and progress tracking.

pub mod catalog;
pub mod duration;
pub mod progress;
pub mod review;
pub mod views;

pub use catalog::{CatalogService, NewCourse, NewSubSection};
pub use duration::format_duration;
pub use progress::ProgressService;
pub use review::ReviewService;
