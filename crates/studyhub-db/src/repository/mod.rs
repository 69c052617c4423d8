//! SurrealDB repository implementations.

mod category;
mod contact;
mod course;
mod payment;
mod progress;
mod rating;
mod section;
mod subsection;
mod user;

pub use category::SurrealCategoryRepository;
pub use contact::SurrealContactRepository;
pub use course::SurrealCourseRepository;
pub use payment::SurrealPaymentRepository;
pub use progress::SurrealProgressRepository;
pub use rating::SurrealRatingRepository;
pub use section::SurrealSectionRepository;
pub use subsection::SurrealSubSectionRepository;
pub use user::{SurrealUserRepository, verify_password};
