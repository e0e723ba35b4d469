//! Lifecycle of one report form, from picking a photo to a stored report.
//!
//! ```text
//! Idle -> Analyzing -> Analyzed | AnalysisFailed
//! Analyzed (acceptable) -> Submitting -> Submitted | SubmitFailed
//! AnalysisFailed | SubmitFailed -> back to the form
//! ```
//!
//! The persisted part of this machine lives on the `analyses` row.

use thiserror::Error;

use crate::core::error::AppError;
use crate::features::analysis::models::AnalysisState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Analyzing,
    Analyzed { acceptable: bool },
    AnalysisFailed,
    Submitting,
    Submitted,
    SubmitFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEvent {
    ImageSelected,
    AnalysisSucceeded { acceptable: bool },
    AnalysisFailed,
    Submit,
    SubmitSucceeded,
    SubmitFailed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("Analisis gambar sebelumnya masih berjalan.")]
    AnalysisInProgress,

    #[error("Laporan sedang dikirim.")]
    SubmissionInProgress,

    #[error("Laporan untuk analisis ini sudah dikirim.")]
    AlreadySubmitted,

    #[error("Hasil analisis tidak dapat dilaporkan.")]
    NotAcceptable,

    #[error("Invalid transition from {from:?} on {event:?}")]
    InvalidTransition {
        from: SubmissionState,
        event: SubmissionEvent,
    },
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::NotAcceptable => AppError::BadRequest(e.to_string()),
            _ => AppError::Conflict(e.to_string()),
        }
    }
}

impl SubmissionState {
    pub fn transition(self, event: SubmissionEvent) -> Result<SubmissionState, FlowError> {
        use SubmissionEvent as E;
        use SubmissionState as S;

        match (self, event) {
            (S::Analyzing, E::ImageSelected) => Err(FlowError::AnalysisInProgress),
            (S::Submitting, E::ImageSelected) => Err(FlowError::SubmissionInProgress),
            (S::Submitted, E::ImageSelected) => Err(FlowError::AlreadySubmitted),
            (_, E::ImageSelected) => Ok(S::Analyzing),

            (S::Analyzing, E::AnalysisSucceeded { acceptable }) => Ok(S::Analyzed { acceptable }),
            (S::Analyzing, E::AnalysisFailed) => Ok(S::AnalysisFailed),

            (S::Analyzed { acceptable: true } | S::SubmitFailed, E::Submit) => Ok(S::Submitting),
            (S::Analyzed { acceptable: false }, E::Submit) => Err(FlowError::NotAcceptable),
            (S::Analyzing, E::Submit) => Err(FlowError::AnalysisInProgress),
            (S::Submitting, E::Submit) => Err(FlowError::SubmissionInProgress),
            (S::Submitted, E::Submit) => Err(FlowError::AlreadySubmitted),

            (S::Submitting, E::SubmitSucceeded) => Ok(S::Submitted),
            (S::Submitting, E::SubmitFailed) => Ok(S::SubmitFailed),

            (from, event) => Err(FlowError::InvalidTransition { from, event }),
        }
    }

    /// State of a stored analysis
    pub fn from_persisted(state: AnalysisState, acceptable: bool) -> Self {
        match state {
            AnalysisState::Analyzed => SubmissionState::Analyzed { acceptable },
            AnalysisState::Submitting => SubmissionState::Submitting,
            AnalysisState::Submitted => SubmissionState::Submitted,
            AnalysisState::SubmitFailed => SubmissionState::SubmitFailed,
        }
    }

    /// Column value for this state; `None` for states that never reach the database
    pub fn persisted(self) -> Option<AnalysisState> {
        match self {
            SubmissionState::Analyzed { .. } => Some(AnalysisState::Analyzed),
            SubmissionState::Submitting => Some(AnalysisState::Submitting),
            SubmissionState::Submitted => Some(AnalysisState::Submitted),
            SubmissionState::SubmitFailed => Some(AnalysisState::SubmitFailed),
            SubmissionState::Idle | SubmissionState::Analyzing | SubmissionState::AnalysisFailed => {
                None
            }
        }
    }
}
