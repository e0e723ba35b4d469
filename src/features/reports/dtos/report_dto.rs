use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::analysis::models::{Detection, Severity};
use crate::features::reports::models::{Coordinates, Report, ReportStatus};
use crate::features::reports::services::ReportForm;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Request DTO for submitting a report from a held analysis
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitReportDto {
    /// `analysis_id` returned by the analyze endpoint
    pub analysis_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 200, message = "Judul maksimal 200 karakter"))]
    pub title: String,

    /// Day the damage was seen
    #[schema(value_type = String, format = Date, example = "2024-05-17")]
    pub event_date: NaiveDate,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude harus di antara -90 dan 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude harus di antara -180 dan 180"))]
    pub longitude: Option<f64>,

    /// Replaces the generated description
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

impl SubmitReportDto {
    pub fn to_form(&self) -> ReportForm {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        ReportForm {
            title: self.title.clone(),
            event_date: self.event_date,
            description: self.description.clone(),
            coordinates,
        }
    }
}

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub analysis_id: Option<Uuid>,
    pub title: String,
    #[schema(value_type = String, format = Date)]
    pub event_date: NaiveDate,
    pub image_url: String,
    pub description: String,
    pub damage_level: Severity,
    #[schema(value_type = Option<Vec<Object>>)]
    pub detections: Option<Vec<Detection>>,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: String,
    pub username: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            analysis_id: r.analysis_id,
            title: r.title,
            event_date: r.event_date,
            image_url: r.image_url,
            description: r.description,
            damage_level: r.damage_level,
            detections: r.detections.map(|d| d.0),
            latitude: r.latitude,
            longitude: r.longitude,
            user_id: r.user_id,
            username: r.username,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Query parameters for the public report list
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ReportQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Only reports with this status
    #[param(value_type = Option<String>, example = "Menunggu Verifikasi")]
    pub status: Option<ReportStatus>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ReportQueryParams {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}
