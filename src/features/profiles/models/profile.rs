use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::shared::constants::ROLE_ADMIN;

/// Database model for a user profile, keyed by the identity subject
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// First username for a new profile, derived from the name in the token.
///
/// Whitespace becomes `.`, other characters outside `[A-Za-z0-9_.-]` are
/// dropped, and leading separators are trimmed. Falls back to a name built
/// from the subject when nothing usable remains.
pub fn seed_username(display_name: &str, sub: &str) -> String {
    let mut username = String::with_capacity(display_name.len());
    for c in display_name.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            username.push(c);
        } else if c.is_whitespace() && !username.ends_with('.') {
            username.push('.');
        }
    }

    let username = username
        .trim_start_matches(['_', '.', '-'])
        .chars()
        .take(50)
        .collect::<String>();

    if username.is_empty() {
        let suffix: String = sub.chars().filter(|c| c.is_ascii_alphanumeric()).take(8).collect();
        format!("warga-{}", suffix)
    } else {
        username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::USERNAME_REGEX;

    #[test]
    fn test_seed_username() {
        assert_eq!(seed_username("budi", "s"), "budi");
        assert_eq!(seed_username("Budi  Santoso", "s"), "Budi.Santoso");
        assert_eq!(seed_username("_rt-05", "s"), "rt-05");
        assert_eq!(seed_username("Siti (RW 3)", "s"), "Siti.RW.3");
        assert_eq!(
            seed_username("   ", "3f2a-91bc-d00d-0001"),
            "warga-3f2a91bc"
        );
    }

    #[test]
    fn test_seeded_usernames_are_valid() {
        for name in ["Ny. Ratna", "andi@mail", "---", "Ω", "a b c"] {
            let seeded = seed_username(name, "abc123");
            assert!(USERNAME_REGEX.is_match(&seeded), "{} -> {}", name, seeded);
        }
    }
}
