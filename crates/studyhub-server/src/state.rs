//! Shared application state handed to every request handler.

use std::sync::Arc;

use studyhub_auth::{AuthConfig, AuthService, ProfileService};
use studyhub_catalog::{CatalogService, ProgressService, ReviewService};
use studyhub_db::repository::{
    SurrealCategoryRepository, SurrealContactRepository, SurrealCourseRepository,
    SurrealPaymentRepository, SurrealProgressRepository, SurrealRatingRepository,
    SurrealSectionRepository, SurrealSubSectionRepository, SurrealUserRepository,
};
use studyhub_payment::{PaymentConfig, PaymentGateway, PaymentService};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

type Users = SurrealUserRepository<Any>;
type Courses = SurrealCourseRepository<Any>;

pub type AppAuthService = AuthService<Users>;
pub type AppProfileService = ProfileService<Users>;
pub type AppCatalogService = CatalogService<
    SurrealCategoryRepository<Any>,
    Courses,
    SurrealSectionRepository<Any>,
    SurrealSubSectionRepository<Any>,
    Users,
    SurrealRatingRepository<Any>,
    SurrealProgressRepository<Any>,
>;
pub type AppReviewService = ReviewService<SurrealRatingRepository<Any>, Courses, Users>;
pub type AppProgressService =
    ProgressService<SurrealProgressRepository<Any>, Courses, SurrealSubSectionRepository<Any>>;
pub type AppPaymentService = PaymentService<SurrealPaymentRepository<Any>, Courses, Users>;

/// Services shared across handlers. Each wraps its own clone of the
/// database handle.
pub struct AppState {
    pub auth: AppAuthService,
    pub profile: AppProfileService,
    pub catalog: AppCatalogService,
    pub reviews: AppReviewService,
    pub progress: AppProgressService,
    pub payments: AppPaymentService,
    pub contacts: SurrealContactRepository<Any>,
}

impl AppState {
    pub fn new(
        db: Surreal<Any>,
        auth_config: AuthConfig,
        payment_config: PaymentConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        // Password hashes written by the repository must verify against
        // the pepper the auth service checks with.
        let pepper = auth_config.pepper.clone();
        let users = || match &pepper {
            Some(p) => SurrealUserRepository::with_pepper(db.clone(), p.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        let courses = || SurrealCourseRepository::new(db.clone());

        Self {
            auth: AuthService::new(users(), auth_config),
            profile: ProfileService::new(users()),
            catalog: CatalogService::new(
                SurrealCategoryRepository::new(db.clone()),
                courses(),
                SurrealSectionRepository::new(db.clone()),
                SurrealSubSectionRepository::new(db.clone()),
                users(),
                SurrealRatingRepository::new(db.clone()),
                SurrealProgressRepository::new(db.clone()),
            ),
            reviews: ReviewService::new(
                SurrealRatingRepository::new(db.clone()),
                courses(),
                users(),
            ),
            progress: ProgressService::new(
                SurrealProgressRepository::new(db.clone()),
                courses(),
                SurrealSubSectionRepository::new(db.clone()),
            ),
            payments: PaymentService::new(
                SurrealPaymentRepository::new(db.clone()),
                courses(),
                users(),
                gateway,
                payment_config,
            ),
            contacts: SurrealContactRepository::new(db.clone()),
        }
    }
}
