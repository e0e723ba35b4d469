//! Outbound clients for the detector and the captioning model.
//!
//! The pipeline depends on the traits so tests can swap in fakes.

mod detector_client;
mod gemini_client;

pub use detector_client::YoloDetectionClient;
pub use gemini_client::GeminiCaptionClient;

use async_trait::async_trait;

use crate::features::analysis::errors::{CaptionError, DetectionError};
use crate::features::analysis::models::{Detection, UploadedImage};

#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detections in detector order. No retries.
    async fn detect(&self, image: &UploadedImage) -> Result<Vec<Detection>, DetectionError>;
}

#[async_trait]
pub trait DamageCaptioner: Send + Sync {
    /// Raw model text describing the damage, with the detection labels as context
    async fn caption(
        &self,
        image: &UploadedImage,
        detections: &[Detection],
    ) -> Result<String, CaptionError>;
}
