use super::model::{AuthenticatedUser, UserMetadata};
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl Claims {
    /// Name seeded into a new profile: explicit username, then provider
    /// username, then the local part of the email, then the subject
    fn display_name(&self) -> String {
        let metadata = self.user_metadata.as_ref();
        metadata
            .and_then(|m| m.username.clone())
            .or_else(|| self.preferred_username.clone())
            .or_else(|| metadata.and_then(|m| m.full_name.clone()))
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .map(str::to_string)
            })
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.sub.clone())
    }
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    /// Verify signature, issuer, audience and lifetime. Roles are filled in
    /// later from the caller's profile.
    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header =
            decode_header(token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Missing kid in token header".to_string()))?;

        let signing_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        // Never let the token choose a weaker algorithm than its key
        if header.alg != signing_key.algorithm {
            return Err(AppError::Unauthorized(format!(
                "Unexpected algorithm {:?} for key {}",
                header.alg, kid
            )));
        }

        let mut validation = Validation::new(signing_key.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &signing_key.key, &validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?
            .claims;

        Ok(AuthenticatedUser {
            display_name: claims.display_name(),
            sub: claims.sub,
            email: claims.email,
            roles: Vec::new(),
        })
    }
}
