use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::features::analysis::handlers::analyze_image;
use crate::features::analysis::services::AnalysisService;

/// Multipart framing on top of the image itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the analysis feature
///
/// All routes require authentication
pub fn routes(service: Arc<AnalysisService>) -> Router {
    let body_limit = service.max_image_size() + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/api/analyze",
            post(analyze_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(service)
}
