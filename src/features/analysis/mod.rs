pub mod clients;
pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use clients::{GeminiCaptionClient, YoloDetectionClient};
pub use services::{AnalysisService, DamageAssessmentPipeline, ResponseNormalizer};
