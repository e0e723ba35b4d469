mod analysis_service;
pub mod normalizer;
pub mod pipeline;
pub mod policy;

pub use analysis_service::{AnalysisOutcome, AnalysisService};
pub use normalizer::{FallbackPolicy, ResponseNormalizer};
pub use pipeline::DamageAssessmentPipeline;
