use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::core::error::{AppError, Result};
use crate::features::analysis::models::Severity;
use crate::features::reports::models::ReportStatus;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// COMMON SORT ENUM
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

// =============================================================================
// REPORT DTOs
// =============================================================================

/// Query params for the admin report list
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AdminReportQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Only reports with this status
    #[param(value_type = Option<String>, example = "Diproses")]
    pub status: Option<ReportStatus>,

    /// Sort by creation time (default: desc)
    #[serde(default)]
    #[param(value_type = Option<String>, example = "desc")]
    pub sort: SortDirection,
}

impl AdminReportQueryParams {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Triage change for a report
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateReportDto {
    pub status: Option<ReportStatus>,
    pub damage_level: Option<Severity>,
}

impl UpdateReportDto {
    /// At least one field, and never a damage level that would make the report invalid
    pub fn check(&self) -> Result<()> {
        if self.status.is_none() && self.damage_level.is_none() {
            return Err(AppError::BadRequest(
                "Nothing to update: provide status and/or damage_level".to_string(),
            ));
        }
        if self.damage_level == Some(Severity::NoDamage) {
            return Err(AppError::BadRequest(format!(
                "Laporan tidak boleh bertingkat '{}'",
                Severity::NoDamage
            )));
        }
        Ok(())
    }
}

/// Report counts per status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportSummaryDto {
    pub total: i64,
    pub awaiting_verification: i64,
    pub in_progress: i64,
    pub done: i64,
}

impl ReportSummaryDto {
    pub fn from_counts(counts: &[(ReportStatus, i64)]) -> Self {
        counts
            .iter()
            .fold(Self::default(), |mut summary, (status, count)| {
                summary.total += count;
                match status {
                    ReportStatus::AwaitingVerification => summary.awaiting_verification += count,
                    ReportStatus::InProgress => summary.in_progress += count,
                    ReportStatus::Done => summary.done += count,
                }
                summary
            })
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_report_check() {
        assert!(UpdateReportDto::default().check().is_err());

        let downgrade = UpdateReportDto {
            damage_level: Some(Severity::NoDamage),
            ..Default::default()
        };
        assert!(matches!(downgrade.check(), Err(AppError::BadRequest(_))));

        let triage: UpdateReportDto =
            serde_json::from_value(json!({"status": "Diproses", "damage_level": "Berat"}))
                .unwrap();
        assert!(triage.check().is_ok());
        assert_eq!(triage.status, Some(ReportStatus::InProgress));
        assert_eq!(triage.damage_level, Some(Severity::Severe));
    }

    #[test]
    fn test_summary_from_counts() {
        let summary = ReportSummaryDto::from_counts(&[
            (ReportStatus::AwaitingVerification, 4),
            (ReportStatus::Done, 2),
        ]);

        assert_eq!(
            summary,
            ReportSummaryDto {
                total: 6,
                awaiting_verification: 4,
                in_progress: 0,
                done: 2,
            }
        );
        assert_eq!(ReportSummaryDto::from_counts(&[]), ReportSummaryDto::default());
    }

    #[test]
    fn test_query_defaults() {
        let params: AdminReportQueryParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.sort.as_sql(), "DESC");
    }
}
