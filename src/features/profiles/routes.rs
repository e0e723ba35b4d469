use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::profiles::handlers;
use crate::features::profiles::services::ProfileService;

/// Create routes for the profile feature (auth middleware applied by caller)
pub fn routes(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route("/api/profile", get(handlers::get_my_profile))
        .with_state(service)
}
