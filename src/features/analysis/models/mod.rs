mod analysis;
mod caption;
mod detection;
mod severity;

pub use analysis::{AnalysisResult, AnalysisSession, AnalysisState, CreateAnalysis, UploadedImage};
pub use caption::CaptionPayload;
pub use detection::{BoundingBox, Detection};
pub use severity::Severity;
