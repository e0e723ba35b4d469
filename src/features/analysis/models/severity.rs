use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

/// Damage severity, labelled with the Indonesian category names used on the
/// wire and in the database
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "damage_level")]
pub enum Severity {
    #[serde(rename = "Tidak ada kerusakan")]
    #[sqlx(rename = "Tidak ada kerusakan")]
    NoDamage,
    #[serde(rename = "Ringan")]
    #[sqlx(rename = "Ringan")]
    Light,
    #[serde(rename = "Sedang")]
    #[sqlx(rename = "Sedang")]
    Moderate,
    #[serde(rename = "Berat")]
    #[sqlx(rename = "Berat")]
    Severe,
    #[serde(rename = "Tidak diketahui")]
    #[sqlx(rename = "Tidak diketahui")]
    Unknown,
}

impl Severity {
    /// Categories the captioning model is asked to pick from
    pub const PROMPT_CATEGORIES: [Severity; 4] = [
        Severity::Light,
        Severity::Moderate,
        Severity::Severe,
        Severity::NoDamage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Severity::NoDamage => "Tidak ada kerusakan",
            Severity::Light => "Ringan",
            Severity::Moderate => "Sedang",
            Severity::Severe => "Berat",
            Severity::Unknown => "Tidak diketahui",
        }
    }

    /// Map a free-form token to a severity.
    ///
    /// Case-insensitive, ignores surrounding quotes, markdown emphasis and
    /// trailing punctuation. Unrecognised tokens map to `Unknown`.
    pub fn from_token(token: &str) -> Severity {
        let cleaned = token
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '_' | '`'))
            .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .to_lowercase();
        let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        match normalized.as_str() {
            "ringan" => Severity::Light,
            "sedang" => Severity::Moderate,
            "berat" | "parah" => Severity::Severe,
            "tidak ada kerusakan" | "tidak ada" => Severity::NoDamage,
            _ => Severity::Unknown,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_map_case_insensitively() {
        for token in ["Berat", "berat", "BERAT", "Berat.", " berat! ", "**Berat**"] {
            assert_eq!(Severity::from_token(token), Severity::Severe, "{token}");
        }
        assert_eq!(Severity::from_token("Ringan"), Severity::Light);
        assert_eq!(Severity::from_token("SEDANG,"), Severity::Moderate);
        assert_eq!(
            Severity::from_token("Tidak  ada kerusakan."),
            Severity::NoDamage
        );
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Severity::from_token("Parah"), Severity::Severe);
        assert_eq!(Severity::from_token("tidak ada"), Severity::NoDamage);
        assert_eq!(Severity::from_token("Tidak diketahui"), Severity::Unknown);
    }

    #[test]
    fn test_unrecognised_token_is_unknown() {
        assert_eq!(Severity::from_token("Katastrofik"), Severity::Unknown);
        assert_eq!(Severity::from_token(""), Severity::Unknown);
    }

    #[test]
    fn test_wire_labels() {
        assert_eq!(
            serde_json::to_string(&Severity::NoDamage).unwrap(),
            "\"Tidak ada kerusakan\""
        );
        let parsed: Severity = serde_json::from_str("\"Sedang\"").unwrap();
        assert_eq!(parsed, Severity::Moderate);
        assert_eq!(Severity::Severe.to_string(), "Berat");
    }
}
