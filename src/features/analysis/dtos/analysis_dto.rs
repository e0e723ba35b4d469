use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::analysis::models::{Detection, Severity};
use crate::features::analysis::services::AnalysisOutcome;

/// Multipart form of the analyze endpoint, documented only.
/// The handler reads the multipart stream itself.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct AnalyzeImageForm {
    /// Photo of the damage (JPEG, PNG, WEBP or GIF)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

/// Result of analyzing one photo
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponseDto {
    /// Reference to pass back when submitting the report
    pub analysis_id: Uuid,
    /// Objects found by the detector, in detector order
    #[schema(value_type = Vec<Object>)]
    pub detections: Vec<Detection>,
    pub description: String,
    pub damage_level: Severity,
    /// Whether a report may be submitted with this photo
    pub acceptable: bool,
    /// Why the photo was rejected, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

impl From<AnalysisOutcome> for AnalyzeResponseDto {
    fn from(outcome: AnalysisOutcome) -> Self {
        let session = outcome.session;
        Self {
            analysis_id: session.id,
            detections: session.detections.0,
            description: session.description,
            damage_level: session.damage_level,
            acceptable: session.acceptable,
            advisory: outcome.advisory.map(str::to_string),
        }
    }
}
