//! Outcomes of the two remote calls

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::services::content_client::{ExtractionResponse, GenerationResponse};

/// Text stored when extraction succeeds without usable text
pub const EXTRACTION_PLACEHOLDER: &str =
    "AI could not read the text. Please type or paste it here.";

/// Result of an extraction call
///
/// `Empty` is soft degradation, not an error: the user types the text instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Text(String),
    Empty,
    Failed(ServiceError),
}

impl ExtractionOutcome {
    pub fn from_result(result: Result<ExtractionResponse, ServiceError>) -> Self {
        match result {
            Ok(response) => match response.extracted_text {
                Some(text) if !text.trim().is_empty() => ExtractionOutcome::Text(text),
                _ => ExtractionOutcome::Empty,
            },
            Err(e) => ExtractionOutcome::Failed(e),
        }
    }
}

/// Teaching materials produced by one successful generation
///
/// All three fields are populated together or the set does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifactSet {
    pub lesson_plan: String,
    pub worksheet: String,
    pub quiz: String,
}

impl GeneratedArtifactSet {
    /// Build an artifact set from a generation response
    ///
    /// `success: false` or any missing field yields an error; partial sets are
    /// never constructed.
    pub fn from_response(response: GenerationResponse) -> Result<Self, ServiceError> {
        if !response.success {
            return Err(ServiceError::Rejected);
        }

        Ok(Self {
            lesson_plan: response
                .lesson_plan
                .ok_or(ServiceError::Incomplete("lesson_plan"))?,
            worksheet: response
                .worksheet
                .ok_or(ServiceError::Incomplete("worksheet"))?,
            quiz: response.quiz.ok_or(ServiceError::Incomplete("quiz"))?,
        })
    }
}
