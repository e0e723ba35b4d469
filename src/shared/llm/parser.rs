use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    /// Fenced block, with or without a language tag
    static ref FENCED_BLOCK_RE: Regex = Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)```").unwrap();

    /// Comma directly before a closing brace or bracket
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// `"a" + "b"` style concatenation copied from JavaScript
    static ref JS_STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Locate the JSON object inside free-form model output.
///
/// A fenced block wins when it holds an object. Otherwise the first `{` is
/// taken and scanned to its matching `}` while skipping braces inside string
/// literals, so prose after the object is ignored. An object that never
/// closes is returned up to the end of the text and left for repair.
pub fn extract_json_string(text: &str) -> Option<&str> {
    if let Some(inner) = FENCED_BLOCK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|inner| inner.starts_with('{'))
    {
        return Some(balanced_object(inner).unwrap_or(inner));
    }

    let start = text.find('{')?;
    let candidate = &text[start..];
    Some(balanced_object(candidate).unwrap_or_else(|| candidate.trim_end()))
}

/// Slice `text` (which starts at `{`) up to the brace that closes it
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

/// `{"level": "Berat",}` -> `{"level": "Berat"}`
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").into_owned()
}

/// `"Jalan " + "berlubang"` -> `"Jalan berlubang"`
pub fn fix_js_string_concatenation(json_str: &str) -> String {
    JS_STRING_CONCAT_RE.replace_all(json_str, "").into_owned()
}

/// Hand the text to `llm_json` as a last resort
fn repair(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match outcome {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

fn try_parse<T: LlmResponse>(text: &str) -> Result<T, String> {
    let json_str =
        extract_json_string(text).ok_or_else(|| "No JSON object found in response".to_string())?;

    tracing::debug!(
        "Extracted JSON (first 300 chars): {}",
        json_str.chars().take(300).collect::<String>()
    );

    let quick_fixed = fix_trailing_commas(&fix_js_string_concatenation(json_str));
    let attempts = [Some(json_str.to_string()), Some(quick_fixed), repair(json_str)];

    attempts
        .into_iter()
        .flatten()
        .find_map(|candidate| serde_json::from_str::<T>(&candidate).ok())
        .ok_or_else(|| {
            format!(
                "Failed to parse JSON after all repair attempts. Original: {}",
                json_str.chars().take(200).collect::<String>()
            )
        })
}

/// Parse model output into `T`, degrading to a flagged default.
///
/// Tries the raw object, then quick fixes for trailing commas and string
/// concatenation, then `llm_json` repair.
pub fn parse_with_fallback<T: LlmResponse>(text: &str) -> T {
    try_parse::<T>(text).unwrap_or_else(|error_msg| {
        tracing::warn!("LLM response parsing failed, using fallback: {}", error_msg);
        let mut fallback = T::default();
        fallback.mark_as_fallback(error_msg);
        fallback
    })
}
