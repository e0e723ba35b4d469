use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::analysis::errors::AnalysisError;
use crate::features::analysis::models::{
    AnalysisResult, AnalysisSession, CreateAnalysis, UploadedImage,
};
use crate::features::analysis::services::pipeline::DamageAssessmentPipeline;
use crate::features::analysis::services::policy;
use crate::features::auth::model::AuthenticatedUser;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::ALLOWED_IMAGE_TYPES;

const SESSION_COLUMNS: &str = r#"
    id, user_id, description, damage_level, detections, acceptable,
    image_key, image_url, state, created_at, updated_at
"#;

/// Users with an analysis currently running
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    users: Arc<Mutex<HashSet<String>>>,
}

/// Holds a user's slot until dropped
pub struct InFlightGuard {
    users: Arc<Mutex<HashSet<String>>>,
    user_id: String,
}

impl InFlightRegistry {
    /// `None` when the user already has an analysis running
    pub fn try_acquire(&self, user_id: &str) -> Option<InFlightGuard> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if !users.insert(user_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            users: self.users.clone(),
            user_id: user_id.to_string(),
        })
    }

    #[cfg(test)]
    pub fn is_busy(&self, user_id: &str) -> bool {
        self.users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(user_id)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.user_id);
    }
}

/// An analysis as returned to the citizen
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub session: AnalysisSession,
    pub advisory: Option<&'static str>,
}

/// Runs the pipeline for a citizen and holds the result for their report form
pub struct AnalysisService {
    pipeline: DamageAssessmentPipeline,
    pool: PgPool,
    storage: Arc<MinIOClient>,
    in_flight: InFlightRegistry,
    max_image_size: usize,
}

impl AnalysisService {
    pub fn new(
        pipeline: DamageAssessmentPipeline,
        pool: PgPool,
        storage: Arc<MinIOClient>,
        max_image_size: usize,
    ) -> Self {
        Self {
            pipeline,
            pool,
            storage,
            in_flight: InFlightRegistry::default(),
            max_image_size,
        }
    }

    pub fn max_image_size(&self) -> usize {
        self.max_image_size
    }

    pub fn validate_image(&self, image: &UploadedImage) -> Result<(), AnalysisError> {
        if image.bytes.is_empty() {
            return Err(AnalysisError::MissingInput(
                "File gambar dibutuhkan.".to_string(),
            ));
        }
        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return Err(AnalysisError::InvalidInput(format!(
                "Format gambar '{}' tidak didukung. Gunakan JPEG, PNG, WEBP, atau GIF.",
                image.content_type
            )));
        }
        if image.bytes.len() > self.max_image_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Ukuran gambar melebihi batas {} MB.",
                self.max_image_size / (1024 * 1024)
            )));
        }
        Ok(())
    }

    /// Analyze one photo. A user may only have one analysis running at a time.
    pub async fn analyze(
        &self,
        user: &AuthenticatedUser,
        image: UploadedImage,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        self.validate_image(&image)?;

        let _guard = self.in_flight.try_acquire(&user.sub).ok_or_else(|| {
            tracing::warn!("Rejecting concurrent analysis for user {}", user.sub);
            AnalysisError::AnalysisInProgress
        })?;

        let result = self.pipeline.assess(&image).await?;
        let advisory = policy::rejection_advisory(&result);
        let acceptable = advisory.is_none();

        tracing::info!(
            "Analysis for user {}: severity={}, detections={}, acceptable={}",
            user.sub,
            result.severity,
            result.detections.len(),
            acceptable
        );

        // Rejected photos are never kept
        let (image_key, image_url) = if acceptable {
            let key = self.storage.report_image_key(&user.sub, image.extension());
            self.storage
                .upload(&key, &image.bytes, &image.content_type)
                .await
                .map_err(|e| AnalysisError::Internal(e.to_string()))?;
            let url = self.storage.public_url(&key);
            (Some(key), Some(url))
        } else {
            (None, None)
        };

        let data = CreateAnalysis {
            user_id: &user.sub,
            result: &result,
            acceptable,
            image_key,
            image_url,
        };

        let session = match self.create_session(&data).await {
            Ok(session) => session,
            Err(e) => {
                if let Some(key) = &data.image_key {
                    if let Err(cleanup) = self.storage.delete(key).await {
                        tracing::warn!("Failed to remove orphaned image {}: {}", key, cleanup);
                    }
                }
                return Err(e.into());
            }
        };

        Ok(AnalysisOutcome { session, advisory })
    }

    async fn create_session(
        &self,
        data: &CreateAnalysis<'_>,
    ) -> Result<AnalysisSession, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO analyses (user_id, description, damage_level, detections, acceptable, image_key, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let AnalysisResult {
            description,
            severity,
            detections,
        } = data.result;

        sqlx::query_as::<_, AnalysisSession>(&query)
            .bind(data.user_id)
            .bind(description)
            .bind(severity)
            .bind(Json(detections))
            .bind(data.acceptable)
            .bind(&data.image_key)
            .bind(&data.image_url)
            .fetch_one(&self.pool)
            .await
    }

    /// A held analysis owned by `user_id`
    pub async fn get_for_user(&self, id: Uuid, user_id: &str) -> Result<AnalysisSession, AppError> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM analyses WHERE id = $1 AND user_id = $2");

        sqlx::query_as::<_, AnalysisSession>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analysis::services::normalizer::{FallbackPolicy, ResponseNormalizer};
    use crate::shared::test_helpers::{
        create_test_user, lazy_pool, sample_image, test_storage, FakeCaptioner, FakeDetector,
    };
    use std::time::Duration;

    fn service(detector: FakeDetector, captioner: FakeCaptioner) -> AnalysisService {
        let pipeline = DamageAssessmentPipeline::new(
            Arc::new(detector),
            Arc::new(captioner),
            ResponseNormalizer::new(FallbackPolicy::KeywordInference),
        );
        AnalysisService::new(pipeline, lazy_pool(), test_storage(), 1024)
    }

    #[test]
    fn test_registry_releases_on_drop() {
        let registry = InFlightRegistry::default();

        let guard = registry.try_acquire("u-1").unwrap();
        assert!(registry.is_busy("u-1"));
        assert!(registry.try_acquire("u-1").is_none());
        assert!(registry.try_acquire("u-2").is_some());

        drop(guard);
        assert!(!registry.is_busy("u-1"));
        assert!(registry.try_acquire("u-1").is_some());
    }

    #[tokio::test]
    async fn test_validate_image() {
        let service = service(FakeDetector::labels(&[]), FakeCaptioner::text(""));

        assert!(service.validate_image(&sample_image()).is_ok());

        let empty = UploadedImage {
            bytes: Vec::new(),
            ..sample_image()
        };
        assert!(matches!(
            service.validate_image(&empty),
            Err(AnalysisError::MissingInput(_))
        ));

        let pdf = UploadedImage {
            content_type: "application/pdf".to_string(),
            ..sample_image()
        };
        assert!(matches!(
            service.validate_image(&pdf),
            Err(AnalysisError::InvalidInput(_))
        ));

        let huge = UploadedImage {
            bytes: vec![0; 2048],
            ..sample_image()
        };
        assert!(matches!(
            service.validate_image(&huge),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_slot_is_released_after_upstream_failure() {
        let service = service(
            FakeDetector::labels(&["Jalan"]),
            FakeCaptioner::failing(crate::features::analysis::errors::CaptionError::Timeout),
        );
        let user = create_test_user();

        let err = service.analyze(&user, sample_image()).await.unwrap_err();

        assert!(matches!(err, AnalysisError::UpstreamTimeout(_)));
        assert!(!service.in_flight.is_busy(&user.sub));
    }

    #[tokio::test]
    async fn test_concurrent_analysis_for_same_user_is_rejected() {
        let service = Arc::new(service(
            FakeDetector::labels(&[]),
            FakeCaptioner::slow("Foto buram.", Duration::from_millis(300)),
        ));
        let user = create_test_user();

        let first = {
            let service = service.clone();
            let user = user.clone();
            tokio::spawn(async move { service.analyze(&user, sample_image()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = service.analyze(&user, sample_image()).await;
        assert!(matches!(second, Err(AnalysisError::AnalysisInProgress)));

        // The first run ends at the unreachable database, but it does end
        let first = first.await.unwrap();
        assert!(matches!(first, Err(AnalysisError::Internal(_))));
        assert!(!service.in_flight.is_busy(&user.sub));
    }
}
