use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::analysis::models::{Detection, Severity};

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status")]
pub enum ReportStatus {
    #[sqlx(rename = "Menunggu Verifikasi")]
    #[serde(rename = "Menunggu Verifikasi")]
    AwaitingVerification,
    #[sqlx(rename = "Diproses")]
    #[serde(rename = "Diproses")]
    InProgress,
    #[sqlx(rename = "Selesai")]
    #[serde(rename = "Selesai")]
    Done,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::AwaitingVerification,
        ReportStatus::InProgress,
        ReportStatus::Done,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::AwaitingVerification => "Menunggu Verifikasi",
            ReportStatus::InProgress => "Diproses",
            ReportStatus::Done => "Selesai",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Database model for report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub analysis_id: Option<Uuid>,
    pub title: String,
    pub event_date: NaiveDate,
    pub image_url: String,
    pub image_key: Option<String>,
    pub description: String,
    pub damage_level: Severity,
    pub detections: Option<Json<Vec<Detection>>>,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: String,
    pub username: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where the damage is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Data for creating a new report, produced by the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub analysis_id: Uuid,
    pub title: String,
    pub event_date: NaiveDate,
    pub image_url: String,
    pub image_key: Option<String>,
    pub description: String,
    pub damage_level: Severity,
    pub detections: Option<Vec<Detection>>,
    pub coordinates: Coordinates,
    pub user_id: String,
    pub username: String,
}
