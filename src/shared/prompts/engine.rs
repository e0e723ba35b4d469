//! Jinja prompt templates.
//!
//! Built-in templates are compiled into the binary. Files under
//! `templates/prompts/` (or `PROMPT_TEMPLATE_DIR`) override a built-in with
//! the same relative name, so prompts can be tuned without a rebuild.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const DEFAULT_TEMPLATE_DIR: &str = "templates/prompts";

pub const CAPTION_TEMPLATE: &str = "damage_assessment/caption.jinja";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(
    CAPTION_TEMPLATE,
    include_str!("../../../templates/prompts/damage_assessment/caption.jinja"),
)];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in BUILTIN_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!("Built-in template {} is invalid: {}", name, e);
        }
    }

    let dir = std::env::var("PROMPT_TEMPLATE_DIR").unwrap_or_else(|_| DEFAULT_TEMPLATE_DIR.into());
    let template_path = Path::new(&dir);
    if template_path.is_dir() {
        load_overrides(&mut env, template_path, template_path);
    }

    env
}

fn load_overrides(env: &mut Environment<'static>, base_path: &Path, current_path: &Path) {
    let Ok(entries) = std::fs::read_dir(current_path) else {
        return;
    };

    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            load_overrides(env, base_path, &path);
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == "jinja") {
            continue;
        }

        let (Ok(relative), Ok(content)) = (path.strip_prefix(base_path), std::fs::read_to_string(&path))
        else {
            continue;
        };
        // Template names are always forward-slash separated
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        // The environment lives for the whole process
        let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
        let static_content: &'static str = Box::leak(content.into_boxed_str());
        match env.add_template(static_name, static_content) {
            Ok(()) => tracing::debug!("Loaded prompt template override: {}", name),
            Err(e) => tracing::warn!("Ignoring invalid template {}: {}", name, e),
        }
    }
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render `template_name` (relative to the template root) with `ctx`
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    let render_ctx = Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())));

    template
        .render(render_ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}
