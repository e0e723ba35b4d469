use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, ValidatedJson};
use crate::features::admin::dtos::*;
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::features::profiles::dtos::{ProfileResponseDto, UpdateProfileDto};
use crate::features::reports::dtos::ReportResponseDto;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List all reports (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    params(AdminReportQueryParams),
    responses(
        (status = 200, description = "List of reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_reports(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<AdminReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service.list_reports(&params).await?;
    let items: Vec<ReportResponseDto> = reports.into_iter().map(|r| r.into()).collect();

    Ok(Json(ApiResponse::success(Some(items), None, Meta::total(total))))
}

/// Report counts per status
#[utoipa::path(
    get,
    path = "/api/admin/reports/summary",
    responses(
        (status = 200, description = "Report counts", body = ApiResponse<ReportSummaryDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn report_summary(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<ReportSummaryDto>>> {
    let summary = service.report_summary().await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

/// Update report status and/or damage level
#[utoipa::path(
    patch,
    path = "/api/admin/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Empty update or invalid damage level"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Report not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_report(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.update_report(id, &dto, &user).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Delete a report and its photo
#[utoipa::path(
    delete,
    path = "/api/admin/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Report not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_report(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_report(id, &user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Laporan berhasil dihapus".to_string()),
        None,
    )))
}

/// List all profiles (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/profiles",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of profiles", body = ApiResponse<Vec<ProfileResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_profiles(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ProfileResponseDto>>>> {
    let (profiles, total) = service
        .list_profiles(params.offset(), params.limit())
        .await?;
    let items: Vec<ProfileResponseDto> = profiles.into_iter().map(|p| p.into()).collect();

    Ok(Json(ApiResponse::success(Some(items), None, Meta::total(total))))
}

/// Change a user's username and/or role
#[utoipa::path(
    patch,
    path = "/api/admin/profiles/{id}",
    params(
        ("id" = String, Path, description = "Profile ID (identity subject)")
    ),
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Profile not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<ProfileResponseDto>>> {
    let profile = service.update_profile(&id, &dto, &user).await?;
    Ok(Json(ApiResponse::success(Some(profile.into()), None, None)))
}

/// Delete a user's profile
#[utoipa::path(
    delete,
    path = "/api/admin/profiles/{id}",
    params(
        ("id" = String, Path, description = "Profile ID (identity subject)")
    ),
    responses(
        (status = 200, description = "Profile deleted"),
        (status = 400, description = "Cannot delete own profile"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Profile not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_profile(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_profile(&id, &user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Profil berhasil dihapus".to_string()),
        None,
    )))
}
