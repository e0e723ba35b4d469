use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::debug;

use crate::features::analysis::dtos::{AnalyzeImageForm, AnalyzeResponseDto};
use crate::features::analysis::errors::{AnalysisError, AnalysisErrorBody};
use crate::features::analysis::models::UploadedImage;
use crate::features::analysis::services::AnalysisService;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::constants::IMAGE_FIELD;

/// Analyze a photo of damaged infrastructure
///
/// Runs object detection, then captioning with the detected labels as
/// context, and classifies the damage level. Acceptable photos are stored
/// and can be turned into a report with the returned `analysis_id`.
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "analysis",
    request_body(
        content = AnalyzeImageForm,
        content_type = "multipart/form-data",
        description = "Photo in the `image` field",
    ),
    responses(
        (status = 200, description = "Photo analyzed", body = AnalyzeResponseDto),
        (status = 400, description = "Missing or invalid image", body = AnalysisErrorBody),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Another analysis is still running", body = AnalysisErrorBody),
        (status = 500, description = "Detector or caption service failed", body = AnalysisErrorBody),
        (status = 504, description = "Caption service timed out", body = AnalysisErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze_image(
    user: AuthenticatedUser,
    State(service): State<Arc<AnalysisService>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponseDto>, AnalysisError> {
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AnalysisError::InvalidInput(format!("Gagal membaca data unggahan: {}", e.body_text()))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != IMAGE_FIELD {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "image".to_string());
        let bytes = field.bytes().await.map_err(|e| {
            debug!("Failed to read image bytes: {}", e);
            AnalysisError::InvalidInput(format!("Gagal membaca file gambar: {}", e.body_text()))
        })?;

        image = Some(UploadedImage {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        });
    }

    let image =
        image.ok_or_else(|| AnalysisError::MissingInput("File gambar dibutuhkan.".to_string()))?;

    debug!(
        "Analyzing {} ({}, {} bytes) for user {}",
        image.file_name,
        image.content_type,
        image.bytes.len(),
        user.sub
    );

    let outcome = service.analyze(&user, image).await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analysis::errors::{CaptionError, DetectionError};
    use crate::features::analysis::routes::routes;
    use crate::features::analysis::services::{
        DamageAssessmentPipeline, FallbackPolicy, ResponseNormalizer,
    };
    use crate::shared::test_helpers::{
        create_test_user, lazy_pool, test_storage, with_user_auth, FakeCaptioner, FakeDetector,
    };
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn server(detector: FakeDetector, captioner: FakeCaptioner) -> TestServer {
        let pipeline = DamageAssessmentPipeline::new(
            Arc::new(detector),
            Arc::new(captioner),
            ResponseNormalizer::new(FallbackPolicy::KeywordInference),
        );
        let service = Arc::new(AnalysisService::new(
            pipeline,
            lazy_pool(),
            test_storage(),
            1024 * 1024,
        ));
        TestServer::new(with_user_auth(routes(service), create_test_user())).unwrap()
    }

    fn image_form(mime: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "image",
            Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
                .file_name("jalan.jpg")
                .mime_type(mime),
        )
    }

    #[tokio::test]
    async fn test_missing_image_is_bad_request() {
        let server = server(FakeDetector::labels(&[]), FakeCaptioner::text(""));

        let response = server
            .post("/api/analyze")
            .multipart(MultipartForm::new().add_text("catatan", "jalan rusak"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "File gambar dibutuhkan."}));
    }

    #[tokio::test]
    async fn test_unsupported_type_is_bad_request() {
        let server = server(FakeDetector::labels(&[]), FakeCaptioner::text(""));

        let response = server
            .post("/api/analyze")
            .multipart(image_form("application/pdf"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("application/pdf"));
    }

    #[tokio::test]
    async fn test_detector_failure_is_server_error() {
        let server = server(
            FakeDetector::failing(DetectionError::Status {
                status: 503,
                body: "model loading".to_string(),
            }),
            FakeCaptioner::text(""),
        );

        let response = server
            .post("/api/analyze")
            .multipart(image_form("image/jpeg"))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({"error": "Gagal menganalisis gambar."}));
    }

    #[tokio::test]
    async fn test_caption_timeout_is_gateway_timeout() {
        let server = server(
            FakeDetector::labels(&["Jalan"]),
            FakeCaptioner::failing(CaptionError::Timeout),
        );

        let response = server
            .post("/api/analyze")
            .multipart(image_form("image/png"))
            .await;

        response.assert_status(StatusCode::GATEWAY_TIMEOUT);
        response.assert_json(&json!({"error": "Analisis gambar melebihi batas waktu."}));
    }

    #[tokio::test]
    async fn test_second_upload_while_analyzing_is_conflict() {
        let server = server(
            FakeDetector::labels(&[]),
            FakeCaptioner::slow("Foto tidak jelas.", Duration::from_millis(300)),
        );

        let first = server
            .post("/api/analyze")
            .multipart(image_form("image/jpeg"));
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            server
                .post("/api/analyze")
                .multipart(image_form("image/jpeg"))
                .await
        };

        let (_first, second) = tokio::join!(async { first.await }, second);

        second.assert_status(StatusCode::CONFLICT);
        second.assert_json(&json!({"error": "Analisis gambar sebelumnya masih berjalan."}));
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let pipeline = DamageAssessmentPipeline::new(
            Arc::new(FakeDetector::labels(&[])),
            Arc::new(FakeCaptioner::text("")),
            ResponseNormalizer::new(FallbackPolicy::Unknown),
        );
        let service = Arc::new(AnalysisService::new(
            pipeline,
            lazy_pool(),
            test_storage(),
            1024,
        ));
        let server = TestServer::new(routes(service)).unwrap();

        let response = server
            .post("/api/analyze")
            .multipart(image_form("image/jpeg"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
