use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// A payload the model is asked to emit as JSON.
///
/// Parsing never fails hard: when the text cannot be read as `Self`,
/// [`parse_with_fallback`](super::parse_with_fallback) hands back
/// `Self::default()` flagged through [`mark_as_fallback`](Self::mark_as_fallback).
pub trait LlmResponse: DeserializeOwned + Default + JsonSchema {
    fn mark_as_fallback(&mut self, error_message: String);

    fn is_success(&self) -> bool;

    /// Schema embedded in prompts so the model knows the expected shape
    fn json_schema_string() -> String {
        let schema = SchemaGenerator::default().into_root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}
