use std::sync::Arc;

use crate::features::analysis::clients::{DamageCaptioner, ObjectDetector};
use crate::features::analysis::errors::AnalysisError;
use crate::features::analysis::models::{AnalysisResult, UploadedImage};
use crate::features::analysis::services::normalizer::ResponseNormalizer;

/// Detect, caption with the detections as context, then normalize.
///
/// The two calls run strictly in sequence and are never retried.
pub struct DamageAssessmentPipeline {
    detector: Arc<dyn ObjectDetector>,
    captioner: Arc<dyn DamageCaptioner>,
    normalizer: ResponseNormalizer,
}

impl DamageAssessmentPipeline {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        captioner: Arc<dyn DamageCaptioner>,
        normalizer: ResponseNormalizer,
    ) -> Self {
        Self {
            detector,
            captioner,
            normalizer,
        }
    }

    pub async fn assess(&self, image: &UploadedImage) -> Result<AnalysisResult, AnalysisError> {
        let detections = self.detector.detect(image).await?;
        let raw = self.captioner.caption(image, &detections).await?;

        Ok(self.normalizer.normalize(&raw, detections))
    }
}
