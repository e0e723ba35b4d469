mod profile;

pub use profile::{seed_username, Profile};
