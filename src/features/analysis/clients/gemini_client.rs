use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::DamageCaptioner;
use crate::core::config::CaptionerConfig;
use crate::features::analysis::errors::CaptionError;
use crate::features::analysis::models::{CaptionPayload, Detection, Severity, UploadedImage};
use crate::shared::llm::LlmResponse;
use crate::shared::prompts::render_caption_prompt;

/// Captions damage photos with Gemini `generateContent`
pub struct GeminiCaptionClient {
    api_base: String,
    api_key: String,
    model: String,
    timeout: Duration,
    http_client: Client,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined. Empty when the model
    /// answered with nothing usable.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn transport_error(e: reqwest::Error) -> CaptionError {
    if e.is_timeout() {
        CaptionError::Timeout
    } else {
        CaptionError::Request(e.to_string())
    }
}

impl GeminiCaptionClient {
    pub fn new(config: &CaptionerConfig) -> Result<Self, CaptionError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CaptionError::Request(e.to_string()))?;

        Ok(Self {
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_prompt(detections: &[Detection]) -> Result<String, CaptionError> {
        let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        let categories: Vec<&str> = Severity::PROMPT_CATEGORIES
            .iter()
            .map(|s| s.label())
            .collect();

        Ok(render_caption_prompt(
            &labels,
            &categories,
            &CaptionPayload::json_schema_string(),
        )?)
    }

    async fn generate(&self, body: serde_json::Value) -> Result<String, CaptionError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CaptionError::Timeout
            } else {
                CaptionError::Malformed(e.to_string())
            }
        })?;

        Ok(payload.text())
    }
}

#[async_trait]
impl DamageCaptioner for GeminiCaptionClient {
    async fn caption(
        &self,
        image: &UploadedImage,
        detections: &[Detection],
    ) -> Result<String, CaptionError> {
        let prompt = Self::build_prompt(detections)?;

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": image.content_type,
                            "data": BASE64_STANDARD.encode(&image.bytes),
                        }
                    }
                ]
            }],
            "generationConfig": { "temperature": 0.2 }
        });

        tracing::debug!("Requesting caption from {}", self.model);

        // Covers connect, upload and body read as one deadline
        let text = tokio::time::timeout(self.timeout, self.generate(body))
            .await
            .map_err(|_| CaptionError::Timeout)??;

        if text.trim().is_empty() {
            tracing::warn!("Caption model returned no text");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{sample_image, spawn_upstream};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    fn client(api_base: String, timeout: Duration) -> GeminiCaptionClient {
        GeminiCaptionClient::new(&CaptionerConfig {
            api_base,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout,
        })
        .unwrap()
    }

    #[test]
    fn test_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Jalan berlubang. "}, {"text": "Tingkat kerusakan: Berat."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();

        assert_eq!(response.text(), "Jalan berlubang. Tingkat kerusakan: Berat.");
    }

    #[test]
    fn test_text_of_empty_response() {
        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(blocked.text(), "");

        let no_content: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(no_content.text(), "");
    }

    #[test]
    fn test_prompt_embeds_labels() {
        let prompt = GeminiCaptionClient::build_prompt(&[
            Detection::label("pothole"),
            Detection::label("road"),
        ])
        .unwrap();
        assert!(prompt.contains("- pothole"));
        assert!(prompt.contains("damage_level"));
    }

    #[tokio::test]
    async fn test_caption_posts_inline_image() {
        let router = Router::new().route(
            "/models/test-model:generateContent",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers["x-goog-api-key"], "test-key");
                let parts = &body["contents"][0]["parts"];
                assert!(parts[0]["text"].as_str().unwrap().contains("pothole"));
                assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": "Tingkat kerusakan: Sedang."}]}}]
                }))
            }),
        );
        let base = spawn_upstream(router).await;

        let text = client(base, Duration::from_secs(5))
            .caption(&sample_image(), &[Detection::label("pothole")])
            .await
            .unwrap();

        assert_eq!(text, "Tingkat kerusakan: Sedang.");
    }

    #[tokio::test]
    async fn test_caption_non_success_status() {
        let router = Router::new().route(
            "/models/test-model:generateContent",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let base = spawn_upstream(router).await;

        let result = client(base, Duration::from_secs(5))
            .caption(&sample_image(), &[])
            .await;

        assert!(matches!(
            result,
            Err(CaptionError::Status { status: 429, .. })
        ));
    }

    #[tokio::test]
    async fn test_caption_deadline_is_a_timeout() {
        let router = Router::new().route(
            "/models/test-model:generateContent",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"candidates": []}))
            }),
        );
        let base = spawn_upstream(router).await;

        let result = client(base, Duration::from_millis(200))
            .caption(&sample_image(), &[])
            .await;

        assert!(matches!(result, Err(CaptionError::Timeout)));
    }
}
