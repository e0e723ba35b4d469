use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::ObjectDetector;
use crate::core::config::DetectorConfig;
use crate::features::analysis::errors::DetectionError;
use crate::features::analysis::models::{Detection, UploadedImage};
use crate::shared::constants::IMAGE_FIELD;

/// Client for the YOLO model server
pub struct YoloDetectionClient {
    endpoint: String,
    http_client: Client,
}

/// Detector reply. Older servers answer with `results`.
#[derive(Debug, Deserialize)]
struct DetectorResponse {
    #[serde(default)]
    detections: Option<Vec<Detection>>,
    #[serde(default)]
    results: Option<Vec<Detection>>,
}

impl DetectorResponse {
    fn into_detections(self) -> Vec<Detection> {
        self.detections.or(self.results).unwrap_or_default()
    }
}

fn transport_error(e: reqwest::Error) -> DetectionError {
    if e.is_timeout() {
        DetectionError::Timeout
    } else {
        DetectionError::Request(e.to_string())
    }
}

impl YoloDetectionClient {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectionError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DetectionError::Request(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl ObjectDetector for YoloDetectionClient {
    async fn detect(&self, image: &UploadedImage) -> Result<Vec<Detection>, DetectionError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| DetectionError::Request(e.to_string()))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        tracing::debug!(
            "Sending {} ({} bytes) to detector",
            image.file_name,
            image.bytes.len()
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed: DetectorResponse =
            serde_json::from_str(&body).map_err(|e| DetectionError::Malformed(e.to_string()))?;
        let detections = parsed.into_detections();

        tracing::info!("Detector returned {} detections", detections.len());
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{sample_image, spawn_upstream};
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::time::Duration;

    fn client(endpoint: String, timeout: Duration) -> YoloDetectionClient {
        YoloDetectionClient::new(&DetectorConfig { endpoint, timeout }).unwrap()
    }

    #[tokio::test]
    async fn test_detect_sends_image_field_and_reads_detections() {
        let router = Router::new().route(
            "/predict",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("image"));
                assert_eq!(field.file_name(), Some("jalan.jpg"));
                Json(serde_json::json!({"detections": ["pothole", "road"]}))
            }),
        );
        let base = spawn_upstream(router).await;

        let detections = client(format!("{base}/predict"), Duration::from_secs(5))
            .detect(&sample_image())
            .await
            .unwrap();

        assert_eq!(
            detections,
            vec![Detection::label("pothole"), Detection::label("road")]
        );
    }

    #[tokio::test]
    async fn test_detect_reads_legacy_results_key() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json(serde_json::json!({"results": [{"name": "crack"}]})) }),
        );
        let base = spawn_upstream(router).await;

        let detections = client(format!("{base}/predict"), Duration::from_secs(5))
            .detect(&sample_image())
            .await
            .unwrap();

        assert_eq!(detections, vec![Detection::label("crack")]);
    }

    #[tokio::test]
    async fn test_detect_without_detection_list_is_empty() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json(serde_json::json!({"status": "ok"})) }),
        );
        let base = spawn_upstream(router).await;

        let detections = client(format!("{base}/predict"), Duration::from_secs(5))
            .detect(&sample_image())
            .await
            .unwrap();

        assert!(detections.is_empty());
    }

    #[tokio::test]
    async fn test_detect_non_success_status() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        );
        let base = spawn_upstream(router).await;

        let result = client(format!("{base}/predict"), Duration::from_secs(5))
            .detect(&sample_image())
            .await;

        match result {
            Err(DetectionError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "model not loaded");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detect_times_out() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({"detections": []}))
            }),
        );
        let base = spawn_upstream(router).await;

        let result = client(format!("{base}/predict"), Duration::from_millis(200))
            .detect(&sample_image())
            .await;

        assert!(matches!(result, Err(DetectionError::Timeout)));
    }
}
