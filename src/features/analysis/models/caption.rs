use schemars::JsonSchema;
use serde::Deserialize;

use super::Severity;
use crate::shared::llm::LlmResponse;

fn default_true() -> bool {
    true
}

/// JSON object the captioning model is asked to return
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CaptionPayload {
    /// One paragraph describing the visible damage
    #[serde(default, alias = "deskripsi")]
    pub description: Option<String>,

    /// Damage category
    #[serde(default, alias = "tingkat_kerusakan", alias = "severity")]
    #[schemars(with = "Option<Severity>")]
    pub damage_level: Option<String>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for CaptionPayload {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}
