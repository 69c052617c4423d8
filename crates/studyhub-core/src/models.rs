//! Domain models for StudyHub.
//!
//! These are the core types shared across all crates.

pub mod category;
pub mod contact;
pub mod course;
pub mod payment;
pub mod progress;
pub mod rating;
pub mod section;
pub mod user;
