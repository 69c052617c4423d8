//! StudyHub Core: Domain models, error types, and repository traits
//! shared by every StudyHub crate.

pub mod error;
pub mod models;
pub mod repository;
