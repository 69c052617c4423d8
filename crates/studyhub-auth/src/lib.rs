//! StudyHub Auth: password verification, JWT issuance/validation,
//! role gating, and account management.

pub mod config;
pub mod error;
pub mod password;
pub mod profile;
pub mod rbac;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use profile::{ProfileService, UpdateProfile};
pub use rbac::authorize;
pub use service::{AuthService, ChangePasswordInput, LoginInput, LoginOutput, SignupInput};
pub use token::{AccessTokenClaims, ValidatedClaims};
