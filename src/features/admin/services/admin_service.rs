use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::{
    AdminReportQueryParams, ReportSummaryDto, UpdateReportDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::profiles::dtos::UpdateProfileDto;
use crate::features::profiles::models::Profile;
use crate::features::profiles::ProfileService;
use crate::features::reports::models::{Report, ReportStatus};
use crate::features::reports::services::REPORT_COLUMNS;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::ROLE_ADMIN;

/// Service for admin triage and role management
pub struct AdminService {
    pool: PgPool,
    profiles: Arc<ProfileService>,
    storage: Arc<MinIOClient>,
}

impl AdminService {
    pub fn new(pool: PgPool, profiles: Arc<ProfileService>, storage: Arc<MinIOClient>) -> Self {
        Self {
            pool,
            profiles,
            storage,
        }
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    /// List reports with pagination (all statuses)
    pub async fn list_reports(&self, params: &AdminReportQueryParams) -> Result<(Vec<Report>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE ($1::report_status IS NULL OR status = $1)",
        )
        .bind(params.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count reports: {:?}", e);
            AppError::Database(e)
        })?;

        let query = format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
            ORDER BY created_at {}
            LIMIT $2 OFFSET $3
            "#,
            params.sort.as_sql()
        );

        let reports = sqlx::query_as::<_, Report>(&query)
            .bind(params.status)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list reports: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((reports, total))
    }

    /// Report counts per status
    pub async fn report_summary(&self) -> Result<ReportSummaryDto> {
        let counts: Vec<(ReportStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM reports GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(ReportSummaryDto::from_counts(&counts))
    }

    /// Change status and/or damage level of a report
    pub async fn update_report(
        &self,
        id: Uuid,
        dto: &UpdateReportDto,
        admin: &AuthenticatedUser,
    ) -> Result<Report> {
        dto.check()?;

        let query = format!(
            r#"
            UPDATE reports
            SET status = COALESCE($2, status),
                damage_level = COALESCE($3, damage_level),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REPORT_COLUMNS}
            "#
        );

        let report = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(dto.status)
            .bind(dto.damage_level)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        tracing::info!(
            "Report {} updated by {}: status={}, damage_level={}",
            id,
            admin.sub,
            report.status,
            report.damage_level
        );

        Ok(report)
    }

    /// Delete a report and its stored photo
    pub async fn delete_report(&self, id: Uuid, admin: &AuthenticatedUser) -> Result<()> {
        let (image_key, image_url): (Option<String>, String) = sqlx::query_as(
            "DELETE FROM reports WHERE id = $1 RETURNING image_key, image_url",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        tracing::info!("Report {} deleted by {}", id, admin.sub);

        // The row is gone either way; a leftover object is only logged
        match image_key.or_else(|| self.storage.key_from_url(&image_url)) {
            Some(key) => {
                if let Err(e) = self.storage.delete(&key).await {
                    tracing::warn!("Failed to delete image {} of report {}: {}", key, id, e);
                }
            }
            None => tracing::warn!("Report {} image is not in our bucket: {}", id, image_url),
        }

        Ok(())
    }

    // =========================================================================
    // PROFILES
    // =========================================================================

    pub async fn list_profiles(&self, offset: i64, limit: i64) -> Result<(Vec<Profile>, i64)> {
        self.profiles.list(offset, limit).await
    }

    pub async fn update_profile(
        &self,
        id: &str,
        dto: &UpdateProfileDto,
        admin: &AuthenticatedUser,
    ) -> Result<Profile> {
        if id == admin.sub && dto.role.as_deref().is_some_and(|role| role != ROLE_ADMIN) {
            return Err(AppError::BadRequest(
                "Admin tidak dapat menurunkan perannya sendiri".to_string(),
            ));
        }

        self.profiles.update(id, dto).await
    }

    pub async fn delete_profile(&self, id: &str, admin: &AuthenticatedUser) -> Result<()> {
        if id == admin.sub {
            return Err(AppError::BadRequest(
                "Admin tidak dapat menghapus profilnya sendiri".to_string(),
            ));
        }

        self.profiles.delete(id).await
    }
}
