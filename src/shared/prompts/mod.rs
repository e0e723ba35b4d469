//! Prompt templates for the generative model.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

/// Render the damage captioning prompt.
///
/// `labels` are the detector's labels in detection order, `categories` the
/// severity names the model may answer with, `json_schema` the expected payload.
pub fn render_caption_prompt(
    labels: &[&str],
    categories: &[&str],
    json_schema: &str,
) -> Result<String, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("detections", Value::from_serialize(labels));
    ctx.insert("categories", Value::from_serialize(categories));
    ctx.insert("json_schema", Value::from(json_schema));

    render_template(engine::CAPTION_TEMPLATE, &ctx)
}
