//! Turns a held analysis plus the citizen's form into a report.
//!
//! No I/O happens here. Everything that can make a submission invalid is
//! decided before the database is touched.

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::error::AppError;
use crate::features::analysis::models::AnalysisSession;
use crate::features::analysis::services::policy;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::models::{Coordinates, NewReport};

/// Fields the citizen fills in on the report form
#[derive(Debug, Clone)]
pub struct ReportForm {
    pub title: String,
    pub event_date: NaiveDate,
    /// Replaces the generated description when not blank
    pub description: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AssemblyError {
    #[error("{0}")]
    Rejected(&'static str),

    #[error("Judul laporan wajib diisi.")]
    MissingTitle,

    #[error("Foto kerusakan wajib diunggah.")]
    MissingImage,

    #[error("Lokasi kejadian wajib diisi.")]
    MissingLocation,
}

impl From<AssemblyError> for AppError {
    fn from(e: AssemblyError) -> Self {
        match e {
            AssemblyError::Rejected(advisory) => AppError::BadRequest(advisory.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

pub fn assemble(
    form: &ReportForm,
    session: &AnalysisSession,
    author: &AuthenticatedUser,
) -> Result<NewReport, AssemblyError> {
    let result = session.result();

    // A rejected analysis never becomes a report, whatever the form says
    if let Some(advisory) = policy::rejection_advisory(&result) {
        return Err(AssemblyError::Rejected(advisory));
    }

    let title = form.title.trim();
    if title.is_empty() {
        return Err(AssemblyError::MissingTitle);
    }

    let image_url = session
        .image_url
        .clone()
        .filter(|url| !url.is_empty())
        .ok_or(AssemblyError::MissingImage)?;

    let coordinates = form.coordinates.ok_or(AssemblyError::MissingLocation)?;

    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or(result.description);

    let detections = Some(result.detections).filter(|d| !d.is_empty());

    Ok(NewReport {
        analysis_id: session.id,
        title: title.to_string(),
        event_date: form.event_date,
        image_url,
        image_key: session.image_key.clone(),
        description,
        damage_level: result.severity,
        detections,
        coordinates,
        user_id: author.sub.clone(),
        username: author.display_name.clone(),
    })
}
