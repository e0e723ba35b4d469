use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::analysis::{
    dtos as analysis_dtos, errors as analysis_errors, handlers as analysis_handlers,
    models as analysis_models,
};
use crate::features::auth;
use crate::features::profiles::{dtos as profiles_dtos, handlers as profiles_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Analysis
        analysis_handlers::analyze_image,
        // Reports
        reports_handlers::submit_report,
        reports_handlers::list_reports,
        reports_handlers::list_my_reports,
        reports_handlers::get_report,
        // Profile
        profiles_handlers::get_my_profile,
        // Admin
        admin_handlers::list_reports,
        admin_handlers::report_summary,
        admin_handlers::update_report,
        admin_handlers::delete_report,
        admin_handlers::list_profiles,
        admin_handlers::update_profile,
        admin_handlers::delete_profile,
    ),
    components(
        schemas(
            // Shared
            Meta,
            auth::model::AuthenticatedUser,
            // Analysis
            analysis_models::Severity,
            analysis_dtos::AnalyzeImageForm,
            analysis_dtos::AnalyzeResponseDto,
            analysis_errors::AnalysisErrorBody,
            // Reports
            reports_models::ReportStatus,
            reports_dtos::SubmitReportDto,
            reports_dtos::ReportResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            // Profiles
            profiles_dtos::ProfileResponseDto,
            profiles_dtos::UpdateProfileDto,
            ApiResponse<profiles_dtos::ProfileResponseDto>,
            ApiResponse<Vec<profiles_dtos::ProfileResponseDto>>,
            // Admin
            admin_dtos::SortDirection,
            admin_dtos::UpdateReportDto,
            admin_dtos::ReportSummaryDto,
            ApiResponse<admin_dtos::ReportSummaryDto>,
        )
    ),
    tags(
        (name = "analysis", description = "Damage photo analysis (detection + captioning)"),
        (name = "reports", description = "Citizen damage reports"),
        (name = "profile", description = "Profile of the authenticated user"),
        (name = "admin", description = "Report triage and role management (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Lapor Cepat API",
        version = "0.1.0",
        description = "API documentation for Lapor Cepat",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
