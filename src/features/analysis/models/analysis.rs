use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Detection, Severity};

/// Photo received from the citizen, alive only for the request
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl UploadedImage {
    /// Extension used when the image is stored
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

/// Outcome of one pass through the assessment pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub description: String,
    pub severity: Severity,
    pub detections: Vec<Detection>,
}

/// Where a held analysis is in the submission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "analysis_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Analyzed,
    Submitting,
    Submitted,
    SubmitFailed,
}

/// Database model for a held analysis
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    pub damage_level: Severity,
    pub detections: Json<Vec<Detection>>,
    pub acceptable: bool,
    pub image_key: Option<String>,
    pub image_url: Option<String>,
    pub state: AnalysisState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisSession {
    pub fn result(&self) -> AnalysisResult {
        AnalysisResult {
            description: self.description.clone(),
            severity: self.damage_level,
            detections: self.detections.0.clone(),
        }
    }
}

/// Data for persisting a fresh analysis
#[derive(Debug)]
pub struct CreateAnalysis<'a> {
    pub user_id: &'a str,
    pub result: &'a AnalysisResult,
    pub acceptable: bool,
    pub image_key: Option<String>,
    pub image_url: Option<String>,
}
