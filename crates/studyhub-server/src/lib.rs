//! StudyHub Server: HTTP API over the auth, catalog and payment
//! services.

pub mod config;
pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;
