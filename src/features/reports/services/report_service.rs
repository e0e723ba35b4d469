use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::analysis::models::{AnalysisSession, AnalysisState};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::models::{NewReport, Report, ReportStatus};
use crate::features::reports::services::assembler::{assemble, ReportForm};
use crate::features::reports::services::submission_flow::{SubmissionEvent, SubmissionState};

pub(crate) const REPORT_COLUMNS: &str = r#"
    id, analysis_id, title, event_date, image_url, image_key, description,
    damage_level, detections, latitude, longitude, user_id, username,
    status, created_at, updated_at
"#;

/// Service for report operations
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Turn a held analysis into a report.
    ///
    /// The state moves and the insert share one transaction. The analysis row
    /// moves to `submitting` with a compare-and-set, so two concurrent submits
    /// of the same analysis produce at most one report, and a failed insert
    /// leaves the row resubmittable.
    pub async fn submit(
        &self,
        user: &AuthenticatedUser,
        analysis_id: Uuid,
        form: &ReportForm,
    ) -> Result<Report> {
        let session = self.find_session(analysis_id, &user.sub).await?;

        let new_report = assemble(form, &session, user)?;

        let current = SubmissionState::from_persisted(session.state, session.acceptable);
        let submitting = current.transition(SubmissionEvent::Submit)?;
        let submitted = submitting.transition(SubmissionEvent::SubmitSucceeded)?;
        let failed = submitting.transition(SubmissionEvent::SubmitFailed)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if !Self::move_session(&mut *tx, analysis_id, current, submitting).await? {
            return Err(AppError::Conflict(
                "Laporan untuk analisis ini sedang atau sudah dikirim.".to_string(),
            ));
        }

        let report = match Self::insert(&mut *tx, &new_report).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Failed to create report from analysis {}: {:?}", analysis_id, e);
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!("Rollback for analysis {} failed: {:?}", analysis_id, rollback);
                }
                // Row is back at `current`; recording the failure is best effort
                if let Err(mark) = Self::move_session(&self.pool, analysis_id, current, failed).await {
                    tracing::warn!(
                        "Failed to mark analysis {} as submit_failed: {:?}",
                        analysis_id,
                        mark
                    );
                }
                return Err(e);
            }
        };

        Self::move_session(&mut *tx, analysis_id, submitting, submitted).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Created report {} from analysis {} for user {}",
            report.id,
            analysis_id,
            user.sub
        );
        Ok(report)
    }

    async fn find_session(&self, id: Uuid, user_id: &str) -> Result<AnalysisSession> {
        sqlx::query_as::<_, AnalysisSession>(
            r#"
            SELECT id, user_id, description, damage_level, detections, acceptable,
                   image_key, image_url, state, created_at, updated_at
            FROM analyses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", id)))
    }

    /// Compare-and-set on the analysis state. `false` when someone else moved it first.
    async fn move_session<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        from: SubmissionState,
        to: SubmissionState,
    ) -> Result<bool> {
        let (Some(from), Some(to)) = (from.persisted(), to.persisted()) else {
            return Err(AppError::Internal(format!(
                "Cannot persist transition {:?} -> {:?}",
                from, to
            )));
        };

        let result = sqlx::query(
            "UPDATE analyses SET state = $3, updated_at = NOW() WHERE id = $1 AND state = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert<'e, E: PgExecutor<'e>>(executor: E, data: &NewReport) -> Result<Report> {
        let query = format!(
            r#"
            INSERT INTO reports (
                analysis_id, title, event_date, image_url, image_key, description,
                damage_level, detections, latitude, longitude, user_id, username
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {REPORT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Report>(&query)
            .bind(data.analysis_id)
            .bind(&data.title)
            .bind(data.event_date)
            .bind(&data.image_url)
            .bind(&data.image_key)
            .bind(&data.description)
            .bind(data.damage_level)
            .bind(data.detections.as_ref().map(Json))
            .bind(data.coordinates.latitude)
            .bind(data.coordinates.longitude)
            .bind(&data.user_id)
            .bind(&data.username)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)
    }

    /// List reports, newest first, optionally filtered by status
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE ($1::report_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let query = format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let reports = sqlx::query_as::<_, Report>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((reports, total))
    }

    /// List reports submitted by one user, newest first
    pub async fn list_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let query = format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM reports
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let reports = sqlx::query_as::<_, Report>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((reports, total))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Report> {
        let query = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");

        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_test_user, lazy_pool};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_submit_surfaces_database_failure() {
        let service = ReportService::new(lazy_pool());
        let form = ReportForm {
            title: "Jalan rusak".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            description: None,
            coordinates: None,
        };

        let err = service
            .submit(&create_test_user(), Uuid::now_v7(), &form)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_unpersisted_states_are_refused() {
        let pool = lazy_pool();
        let err = tokio_test::assert_err!(
            ReportService::move_session(
                &pool,
                Uuid::now_v7(),
                SubmissionState::Idle,
                SubmissionState::Analyzing,
            )
            .await
        );
        assert!(matches!(err, AppError::Internal(_)));
    }
}
