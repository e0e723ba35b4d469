use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::profiles::dtos::UpdateProfileDto;
use crate::features::profiles::models::{seed_username, Profile};

/// Service for user profiles and their roles
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Profile of the caller, created with role `user` on first sight.
    /// An existing row is returned untouched.
    pub async fn ensure_profile(&self, user: &AuthenticatedUser) -> Result<Profile> {
        let username = seed_username(&user.display_name, &user.sub);

        // Empty when a concurrent first request inserted the row after this
        // statement's snapshot was taken; the row is visible to a fresh read.
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            WITH inserted AS (
                INSERT INTO profiles (id, username)
                VALUES ($1, $2)
                ON CONFLICT (id) DO NOTHING
                RETURNING id, username, role, created_at, updated_at
            )
            SELECT id, username, role, created_at, updated_at FROM inserted
            UNION ALL
            SELECT id, username, role, created_at, updated_at FROM profiles WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(&user.sub)
        .bind(&username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to ensure profile for {}: {:?}", user.sub, e);
            AppError::Database(e)
        })?;

        match profile {
            Some(profile) => Ok(profile),
            None => {
                tracing::debug!("Profile {} created concurrently, reading it back", user.sub);
                self.get(&user.sub).await
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(
            "SELECT id, username, role, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    /// List profiles ordered by username
    pub async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<Profile>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, role, created_at, updated_at
            FROM profiles
            ORDER BY username
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok((profiles, total))
    }

    /// Change username and/or role; absent fields keep their value
    pub async fn update(&self, id: &str, dto: &UpdateProfileDto) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET username = COALESCE($2, username),
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&dto.username)
        .bind(&dto.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))?;

        tracing::info!(
            "Updated profile {}: username={}, role={}",
            profile.id,
            profile.username,
            profile.role
        );

        Ok(profile)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Profile {} not found", id)));
        }

        tracing::info!("Deleted profile {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_test_user, lazy_pool};

    #[tokio::test]
    async fn test_ensure_profile_surfaces_database_failure() {
        let service = ProfileService::new(lazy_pool());

        let err = service.ensure_profile(&create_test_user()).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }
}
