//! Turns the captioning model's free text into an [`AnalysisResult`].
//!
//! The model is asked for JSON but is not bound to it. Extraction runs a
//! ranked chain of [`SeverityStrategy`] values; the first one that yields an
//! [`Extraction`] wins. The chain always ends with the verbatim text, so
//! normalization never fails.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::config::AnalysisConfig;
use crate::features::analysis::models::{AnalysisResult, CaptionPayload, Detection, Severity};
use crate::shared::llm::{parse_with_fallback, LlmResponse};

lazy_static! {
    /// Trailing "Tingkat kerusakan: X" clause inside an already extracted description.
    /// The sentence's own full stop is kept.
    static ref TRAILING_CLAUSE_RE: Regex = Regex::new(
        r"(?is)[\s,;:*_]*tingkat\s+kerusakan[*_]*\s*:\s*[*_]*([\p{L}\s-]*?)[*_]*\s*[.!]?\s*$"
    )
    .unwrap();

    /// Whole response shaped as "<text> Tingkat kerusakan: <category>."
    static ref TRAILER_RE: Regex = Regex::new(
        r"(?is)^\s*(.*?)[\s.,;:*_]*tingkat\s+kerusakan[*_]*\s*:\s*[*_]*([\p{L}\s-]+?)[*_]*\s*[.!]?\s*$"
    )
    .unwrap();

    /// Checked in order, first hit wins. Unanchored so affixed forms
    /// ("keparahan", "ringannya") still count.
    static ref SEVERITY_KEYWORDS: Vec<(Regex, Severity)> = vec![
        (Regex::new(r"tidak\s+ada\s+kerusakan").unwrap(), Severity::NoDamage),
        (Regex::new(r"berat|parah").unwrap(), Severity::Severe),
        (Regex::new(r"sedang").unwrap(), Severity::Moderate),
        (Regex::new(r"ringan").unwrap(), Severity::Light),
    ];
}

/// What a strategy managed to read from the raw text
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub description: String,
    /// `None` when the text carried no severity at all
    pub severity: Option<Severity>,
}

/// One way of reading the model output
pub trait SeverityStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, raw: &str) -> Option<Extraction>;
}

/// What to do when the text names no severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Scan the text for severity words
    KeywordInference,
    /// Leave the severity `Unknown`
    Unknown,
}

impl From<&AnalysisConfig> for FallbackPolicy {
    fn from(config: &AnalysisConfig) -> Self {
        if config.keyword_fallback {
            FallbackPolicy::KeywordInference
        } else {
            FallbackPolicy::Unknown
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a duplicated severity clause, returning the cleaned text and the
/// clause's category token if one was present
fn strip_trailing_clause(text: &str) -> (String, Option<String>) {
    match TRAILING_CLAUSE_RE.captures(text) {
        Some(caps) => {
            let start = caps.get(0).map_or(text.len(), |m| m.start());
            let token = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|t| !t.is_empty());
            (text[..start].trim_end().to_string(), token)
        }
        None => (text.trim().to_string(), None),
    }
}

/// Severity from keywords in `text`, `None` when nothing matches
pub fn infer_from_keywords(text: &str) -> Option<Severity> {
    let lowered = text.to_lowercase();
    SEVERITY_KEYWORDS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&lowered))
        .map(|(_, severity)| *severity)
}

/// Reads a JSON object with `description` and `damage_level`
pub struct StructuredPayload;

impl SeverityStrategy for StructuredPayload {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, raw: &str) -> Option<Extraction> {
        if !raw.contains('{') {
            return None;
        }

        let payload: CaptionPayload = parse_with_fallback(raw);
        if !payload.is_success() {
            return None;
        }

        let (description, clause_token) =
            strip_trailing_clause(payload.description.as_deref().unwrap_or_default());

        let token = payload
            .damage_level
            .map(|level| level.trim().to_string())
            .filter(|level| !level.is_empty())
            .or(clause_token);

        // A level without a description still counts; the raw text stands in
        let description = match (description.is_empty(), &token) {
            (false, _) => description,
            (true, Some(_)) => raw.trim().to_string(),
            (true, None) => return None,
        };

        Some(Extraction {
            description,
            severity: token.as_deref().map(Severity::from_token),
        })
    }
}

/// Reads "<text>. Tingkat kerusakan: <category>."
pub struct TrailerPhrase;

impl SeverityStrategy for TrailerPhrase {
    fn name(&self) -> &'static str {
        "trailer"
    }

    fn extract(&self, raw: &str) -> Option<Extraction> {
        let caps = TRAILER_RE.captures(raw)?;
        let description = collapse_whitespace(caps.get(1)?.as_str());
        if description.is_empty() {
            return None;
        }

        Some(Extraction {
            description,
            severity: caps.get(2).map(|m| Severity::from_token(m.as_str())),
        })
    }
}

/// Verbatim text with a severity guessed from keywords
pub struct KeywordScan;

impl SeverityStrategy for KeywordScan {
    fn name(&self) -> &'static str {
        "keywords"
    }

    fn extract(&self, raw: &str) -> Option<Extraction> {
        let severity = infer_from_keywords(raw)?;
        Some(Extraction {
            description: raw.trim().to_string(),
            severity: Some(severity),
        })
    }
}

/// Verbatim text, no severity. Always succeeds.
pub struct RawText;

impl SeverityStrategy for RawText {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn extract(&self, raw: &str) -> Option<Extraction> {
        Some(Extraction {
            description: raw.trim().to_string(),
            severity: None,
        })
    }
}

pub struct ResponseNormalizer {
    strategies: Vec<Box<dyn SeverityStrategy>>,
    policy: FallbackPolicy,
}

impl ResponseNormalizer {
    pub fn new(policy: FallbackPolicy) -> Self {
        let mut strategies: Vec<Box<dyn SeverityStrategy>> =
            vec![Box::new(StructuredPayload), Box::new(TrailerPhrase)];
        if policy == FallbackPolicy::KeywordInference {
            strategies.push(Box::new(KeywordScan));
        }
        strategies.push(Box::new(RawText));

        Self { strategies, policy }
    }

    /// Never fails; unreadable text degrades to itself with `Unknown` severity
    pub fn normalize(&self, raw: &str, detections: Vec<Detection>) -> AnalysisResult {
        let (strategy, extraction) = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.extract(raw).map(|e| (strategy.name(), e)))
            .unwrap_or_else(|| {
                let description = raw.trim().to_string();
                ("raw", Extraction { description, severity: None })
            });

        let severity = extraction
            .severity
            .or_else(|| match self.policy {
                FallbackPolicy::KeywordInference => infer_from_keywords(&extraction.description),
                FallbackPolicy::Unknown => None,
            })
            .unwrap_or(Severity::Unknown);

        tracing::debug!(
            "Caption normalized via {} strategy: severity={}",
            strategy,
            severity
        );

        AnalysisResult {
            description: extraction.description,
            severity,
            detections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    fn keywords() -> ResponseNormalizer {
        ResponseNormalizer::new(FallbackPolicy::KeywordInference)
    }

    fn strict() -> ResponseNormalizer {
        ResponseNormalizer::new(FallbackPolicy::Unknown)
    }

    #[test]
    fn test_json_payload_is_taken_verbatim() {
        let raw = r#"{"description":"Jalan berlubang cukup dalam.","damage_level":"Sedang"}"#;
        let result = strict().normalize(raw, vec![Detection::label("Jalan")]);

        assert_eq!(result.description, "Jalan berlubang cukup dalam.");
        assert_eq!(result.severity, Severity::Moderate);
        assert_eq!(result.detections, vec![Detection::label("Jalan")]);
    }

    #[test]
    fn test_json_in_fenced_block_with_chatter() {
        let raw = "Berikut hasilnya:\n```json\n{\"description\": \"Trotoar retak.\", \"damage_level\": \"ringan\",}\n```\nSemoga membantu.";
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "Trotoar retak.");
        assert_eq!(result.severity, Severity::Light);
    }

    #[test]
    fn test_json_description_loses_duplicated_clause() {
        let raw = r#"{"description": "Tiang listrik miring ke jalan. Tingkat kerusakan: Berat.", "damage_level": "Berat"}"#;
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "Tiang listrik miring ke jalan.");
        assert_eq!(result.severity, Severity::Severe);
    }

    #[test]
    fn test_json_without_level_uses_stripped_clause() {
        let raw = r#"{"description": "Pagar taman roboh. Tingkat kerusakan: Parah."}"#;
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "Pagar taman roboh.");
        assert_eq!(result.severity, Severity::Severe);
    }

    #[test]
    fn test_json_with_unrecognised_level_is_unknown() {
        let raw = r#"{"description": "Lampu jalan padam.", "damage_level": "Sedikit"}"#;
        let result = keywords().normalize(raw, vec![]);

        assert_eq!(result.severity, Severity::Unknown);
    }

    #[test]
    fn test_json_level_without_description_is_kept() {
        for raw in [
            r#"{"damage_level": "Berat"}"#,
            r#"{"description": null, "damage_level": "Berat"}"#,
        ] {
            let result = strict().normalize(raw, vec![]);

            assert_eq!(result.severity, Severity::Severe, "{raw}");
            assert_eq!(result.description, raw);
        }
    }

    #[test]
    fn test_json_without_description_or_level_falls_through() {
        assert!(StructuredPayload.extract(r#"{"description": null}"#).is_none());
    }

    #[test]
    fn test_trailer_sentence() {
        let raw = "Jalan  berlubang\ncukup dalam. Tingkat kerusakan: Berat.";
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "Jalan berlubang cukup dalam");
        assert_eq!(result.severity, Severity::Severe);
    }

    #[test]
    fn test_trailer_for_any_text() {
        for _ in 0..20 {
            let text: String = Sentence(3..10).fake();
            let text = text.trim_end_matches('.').to_string();
            let raw = format!("{}. Tingkat kerusakan: Berat.", text);

            let result = strict().normalize(&raw, vec![]);

            assert_eq!(result.description, collapse_whitespace(&text));
            assert_eq!(result.severity, Severity::Severe);
        }
    }

    #[test]
    fn test_trailer_tokens_are_case_insensitive() {
        for token in ["RINGAN", "ringan", "Ringan"] {
            let raw = format!("Cat jembatan mengelupas. Tingkat kerusakan: {}.", token);
            assert_eq!(strict().normalize(&raw, vec![]).severity, Severity::Light);
        }
    }

    #[test]
    fn test_trailer_with_markdown_emphasis() {
        let raw = "Saluran air tersumbat. **Tingkat kerusakan:** Sedang";
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "Saluran air tersumbat");
        assert_eq!(result.severity, Severity::Moderate);
    }

    #[test]
    fn test_no_damage_trailer() {
        let raw = "Tidak terlihat kerusakan. Tingkat kerusakan: Tidak ada kerusakan.";
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "Tidak terlihat kerusakan");
        assert_eq!(result.severity, Severity::NoDamage);
    }

    #[test]
    fn test_keyword_fallback_priority() {
        let normalizer = keywords();
        let cases = [
            ("Secara umum tidak ada kerusakan yang berat.", Severity::NoDamage),
            ("Retakan ringan tetapi amblesnya parah.", Severity::Severe),
            ("Kerusakan sedang hingga ringan.", Severity::Moderate),
            ("Hanya goresan ringan.", Severity::Light),
            ("Foto buram.", Severity::Unknown),
        ];

        for (raw, expected) in cases {
            let result = normalizer.normalize(raw, vec![]);
            assert_eq!(result.severity, expected, "{raw}");
            assert_eq!(result.description, raw);
        }
    }

    #[test]
    fn test_keywords_match_affixed_forms() {
        let normalizer = keywords();
        let cases = [
            ("Jalan amblas dengan keparahan tinggi.", Severity::Severe),
            ("Kerusakannya parahnya terlihat jelas.", Severity::Severe),
            ("Retakan ringannya di trotoar.", Severity::Light),
        ];

        for (raw, expected) in cases {
            assert_eq!(normalizer.normalize(raw, vec![]).severity, expected, "{raw}");
        }
    }

    #[test]
    fn test_keyword_fallback_disabled() {
        let result = strict().normalize("Kerusakan jalan sangat parah.", vec![]);

        assert_eq!(result.description, "Kerusakan jalan sangat parah.");
        assert_eq!(result.severity, Severity::Unknown);
    }

    #[test]
    fn test_unparsable_json_degrades_to_text() {
        let raw = "{ rusak";
        let result = strict().normalize(raw, vec![]);

        assert_eq!(result.description, "{ rusak");
        assert_eq!(result.severity, Severity::Unknown);
    }

    #[test]
    fn test_empty_output() {
        let result = keywords().normalize("   ", vec![]);

        assert_eq!(result.description, "");
        assert_eq!(result.severity, Severity::Unknown);
    }

    #[test]
    fn test_renormalizing_description_without_keywords() {
        let first = strict().normalize("Jalan berlubang cukup dalam. Tingkat kerusakan: Berat.", vec![]);
        let second = strict().normalize(&first.description, vec![]);

        assert_eq!(second.description, first.description);
        assert_eq!(second.severity, Severity::Unknown);
    }

    #[test]
    fn test_renormalizing_description_with_keywords() {
        let first = keywords().normalize(
            "Aspal retak dengan kerusakan sedang. Tingkat kerusakan: Sedang.",
            vec![],
        );
        let second = keywords().normalize(&first.description, vec![]);

        assert_eq!(second.description, first.description);
        assert_eq!(second.severity, infer_from_keywords(&first.description).unwrap());
        assert_eq!(second.severity, Severity::Moderate);

        let plain = keywords().normalize("Jalan berlubang cukup dalam", vec![]);
        assert_eq!(plain.severity, Severity::Unknown);
    }

    #[test]
    fn test_each_strategy_in_isolation() {
        assert!(StructuredPayload.extract("Tingkat kerusakan: Berat.").is_none());
        assert!(TrailerPhrase.extract("Tingkat kerusakan: Berat.").is_none());
        assert!(TrailerPhrase.extract("Jalan rusak.").is_none());
        assert!(KeywordScan.extract("Jalan rusak.").is_none());
        assert_eq!(
            RawText.extract(" Jalan rusak. "),
            Some(Extraction {
                description: "Jalan rusak.".to_string(),
                severity: None
            })
        );
    }

    #[test]
    fn test_policy_from_config() {
        let config = AnalysisConfig {
            keyword_fallback: false,
            max_image_size: 1024,
        };
        assert_eq!(FallbackPolicy::from(&config), FallbackPolicy::Unknown);
    }
}
