use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating username fields
    /// Letters, digits, underscores, dots and hyphens; must start with a letter or digit
    /// - Valid: "budi", "budi.santoso", "warga_01", "rt-05"
    /// - Invalid: "_budi", ".budi", "budi santoso", ""
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").unwrap();
}
