use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::shared::prompts::TemplateError;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detector request failed: {0}")]
    Request(String),

    #[error("detector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("detector did not answer in time")]
    Timeout,

    #[error("detector response could not be read: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption request failed: {0}")]
    Request(String),

    #[error("caption service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("caption service did not answer in time")]
    Timeout,

    #[error("caption response could not be read: {0}")]
    Malformed(String),

    #[error(transparent)]
    Prompt(#[from] TemplateError),
}

/// Failures of the analyze contract, rendered as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Analisis gambar sebelumnya masih berjalan.")]
    AnalysisInProgress,

    #[error("Gagal menganalisis gambar.")]
    Upstream(String),

    #[error("Analisis gambar melebihi batas waktu.")]
    UpstreamTimeout(String),

    #[error("Gagal menyimpan hasil analisis.")]
    Internal(String),
}

/// Body of an analyze failure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisErrorBody {
    pub error: String,
}

impl From<DetectionError> for AnalysisError {
    fn from(e: DetectionError) -> Self {
        // A slow detector is still an upstream failure, only captioning has its own timeout
        AnalysisError::Upstream(e.to_string())
    }
}

impl From<CaptionError> for AnalysisError {
    fn from(e: CaptionError) -> Self {
        let cause = e.to_string();
        match e {
            CaptionError::Timeout => AnalysisError::UpstreamTimeout(cause),
            _ => AnalysisError::Upstream(cause),
        }
    }
}

impl From<sqlx::Error> for AnalysisError {
    fn from(e: sqlx::Error) -> Self {
        AnalysisError::Internal(format!("database: {}", e))
    }
}

impl AnalysisError {
    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisError::MissingInput(_) | AnalysisError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AnalysisError::AnalysisInProgress => StatusCode::CONFLICT,
            AnalysisError::Upstream(_) | AnalysisError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AnalysisError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        match &self {
            AnalysisError::Upstream(cause)
            | AnalysisError::UpstreamTimeout(cause)
            | AnalysisError::Internal(cause) => {
                tracing::error!("Image analysis failed: {}", cause);
            }
            _ => {}
        }

        let body = AnalysisErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
