use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Report routes readable without an account
pub fn public_routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/reports", get(handlers::list_reports))
        .route("/api/reports/{id}", get(handlers::get_report))
        .with_state(service)
}

/// Report routes for citizens (auth middleware applied by caller)
pub fn protected_routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/reports", post(handlers::submit_report))
        .route("/api/reports/mine", get(handlers::list_my_reports))
        .with_state(service)
}
