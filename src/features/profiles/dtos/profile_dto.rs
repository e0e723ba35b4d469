use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::features::profiles::models::Profile;
use crate::shared::constants::PROFILE_ROLES;
use crate::shared::validation::USERNAME_REGEX;

/// Response DTO for profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponseDto {
    pub id: String,
    pub username: String,
    /// `user` or `admin`
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponseDto {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            role: p.role,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Request DTO for changing a profile (admin)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(
        length(min = 3, max = 50),
        regex(path = *USERNAME_REGEX, message = "Username hanya boleh berisi huruf, angka, titik, garis bawah, dan tanda hubung")
    )]
    pub username: Option<String>,

    #[validate(custom(function = "validate_role"))]
    #[schema(example = "admin")]
    pub role: Option<String>,
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if PROFILE_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ValidationError::new("role").with_message("Role harus 'user' atau 'admin'".into()))
    }
}
