use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;

/// Create admin routes (all require the admin role)
pub fn routes(admin_service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/reports", get(handlers::list_reports))
        .route("/reports/summary", get(handlers::report_summary))
        .route(
            "/reports/{id}",
            patch(handlers::update_report).delete(handlers::delete_report),
        )
        .route("/profiles", get(handlers::list_profiles))
        .route(
            "/profiles/{id}",
            patch(handlers::update_profile).delete(handlers::delete_profile),
        )
        .with_state(admin_service)
}
