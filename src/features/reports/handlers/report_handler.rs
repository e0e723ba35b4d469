use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{ReportQueryParams, ReportResponseDto, SubmitReportDto};
use crate::features::reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Submit a report from an acceptable analysis
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = SubmitReportDto,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Missing fields or rejected analysis"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Analysis not found"),
        (status = 409, description = "Analysis already submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn submit_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    ValidatedJson(dto): ValidatedJson<SubmitReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    let report = service.submit(&user, dto.analysis_id, &dto.to_form()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(report.into()),
            Some("Laporan berhasil dikirim".to_string()),
            None,
        )),
    ))
}

/// List reports (public)
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "List of reports", body = ApiResponse<Vec<ReportResponseDto>>)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(service): State<Arc<ReportService>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service
        .list(params.status, params.offset(), params.limit())
        .await?;
    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(|r| r.into()).collect();
    Ok(Json(ApiResponse::success(Some(dtos), None, Meta::total(total))))
}

/// List reports submitted by the authenticated user
#[utoipa::path(
    get,
    path = "/api/reports/mine",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of user's reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_my_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service
        .list_by_user(&user.sub, params.offset(), params.limit())
        .await?;
    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(|r| r.into()).collect();
    Ok(Json(ApiResponse::success(Some(dtos), None, Meta::total(total))))
}

/// Get report by ID (public)
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportResponseDto>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::routes;
    use crate::shared::test_helpers::{create_test_user, lazy_pool, with_user_auth};
    use axum::Router;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server(authenticated: bool) -> TestServer {
        let service = Arc::new(ReportService::new(lazy_pool()));
        let protected = routes::protected_routes(service.clone());
        let protected = if authenticated {
            with_user_auth(protected, create_test_user())
        } else {
            protected
        };
        let app = Router::new()
            .merge(routes::public_routes(service))
            .merge(protected);
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_coordinates_before_database() {
        let server = server(true);

        let response = server
            .post("/api/reports")
            .json(&json!({
                "analysis_id": "0190b6f0-0000-7000-8000-000000000001",
                "title": "Jalan rusak",
                "event_date": "2024-05-17",
                "latitude": -95.0,
                "longitude": 106.8
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_submit_rejects_malformed_body() {
        let server = server(true);

        let response = server
            .post("/api/reports")
            .json(&json!({"title": "tanpa analisis"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_requires_authentication() {
        let server = server(false);

        let response = server
            .post("/api/reports")
            .json(&json!({
                "analysis_id": "0190b6f0-0000-7000-8000-000000000001",
                "title": "Jalan rusak",
                "event_date": "2024-05-17"
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_status_filter_is_rejected() {
        let server = server(false);

        let response = server
            .get("/api/reports")
            .add_query_param("status", "Ditolak")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
