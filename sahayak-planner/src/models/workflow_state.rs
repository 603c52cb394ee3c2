//! Session-scoped workflow state store
//!
//! One [`WorkflowState`] exists per user session. It is created empty, mutated
//! only through the phase controller (and the few user edits exposed here),
//! and dropped with the session. Nothing is persisted.
//!
//! # Request cycles
//! `cycle` is a monotonically increasing [`RequestToken`]. Starting an
//! extraction advances it, and every generation request records the cycle it
//! was issued under. A generation response whose token no longer equals the
//! current cycle belongs to text that has since been replaced and is dropped.

use chrono::{DateTime, Utc};
use sahayak_common::events::{Phase, WorkflowEvent};
use serde::Serialize;
use uuid::Uuid;

use super::{GeneratedArtifactSet, SourceImage, WorkflowConfiguration};
use crate::error::ValidationError;

const EXTRACT_LABEL: &str = "Extract Text";
const EXTRACT_BUSY_LABEL: &str = "Reading Image...";
const GENERATE_LABEL: &str = "Generate Materials";
const GENERATE_BUSY_LABEL: &str = "Generating...";

/// Request cycle identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        RequestToken(self.0 + 1)
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Phase transition record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    pub session_id: Uuid,
    pub old_phase: Phase,
    pub new_phase: Phase,
    pub transitioned_at: DateTime<Utc>,
}

impl PhaseTransition {
    /// False for self-transitions (e.g. ReadyToGenerate → ReadyToGenerate)
    pub fn is_change(&self) -> bool {
        self.old_phase != self.new_phase
    }

    pub fn into_event(self) -> WorkflowEvent {
        WorkflowEvent::PhaseChanged {
            session_id: self.session_id,
            old_phase: self.old_phase,
            new_phase: self.new_phase,
            timestamp: self.transitioned_at,
        }
    }
}

/// UI affordances derived from the current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub can_extract: bool,
    pub can_edit_text: bool,
    pub can_generate: bool,
    pub show_results: bool,
    pub extract_label: &'static str,
    pub generate_label: &'static str,
}

/// Read model handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub session_id: Uuid,
    pub phase: Phase,
    pub config: WorkflowConfiguration,
    pub staged_file: Option<String>,
    pub extracted_text: Option<String>,
    pub artifacts: Option<GeneratedArtifactSet>,
    pub error: Option<String>,
    pub token: RequestToken,
    pub affordances: Affordances,
    pub created_at: DateTime<Utc>,
}

/// Current values of every workflow field for one session
#[derive(Debug, Clone)]
pub struct WorkflowState {
    session_id: Uuid,
    config: WorkflowConfiguration,
    staged_image: Option<SourceImage>,
    extracted_text: Option<String>,
    artifacts: Option<GeneratedArtifactSet>,
    phase: Phase,
    error: Option<String>,
    cycle: RequestToken,
    extraction_in_flight: Option<RequestToken>,
    generation_in_flight: Option<RequestToken>,
    created_at: DateTime<Utc>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    /// Create empty state for a new session
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            config: WorkflowConfiguration::default(),
            staged_image: None,
            extracted_text: None,
            artifacts: None,
            phase: Phase::Idle,
            error: None,
            cycle: RequestToken::default(),
            extraction_in_flight: None,
            generation_in_flight: None,
            created_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &WorkflowConfiguration {
        &self.config
    }

    pub fn staged_image(&self) -> Option<&SourceImage> {
        self.staged_image.as_ref()
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn artifacts(&self) -> Option<&GeneratedArtifactSet> {
        self.artifacts.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Cycle that new generation requests are tagged with
    pub fn current_token(&self) -> RequestToken {
        self.cycle
    }

    pub fn extraction_in_flight(&self) -> Option<RequestToken> {
        self.extraction_in_flight
    }

    pub fn generation_in_flight(&self) -> Option<RequestToken> {
        self.generation_in_flight
    }

    /// Replace the generation parameters
    pub fn set_config(&mut self, config: WorkflowConfiguration) {
        self.config = config;
    }

    /// Stage an image, returning the one it replaces
    pub fn stage_image(&mut self, image: SourceImage) -> Option<SourceImage> {
        self.staged_image.replace(image)
    }

    /// Overwrite the extracted text with the user's correction
    ///
    /// Does not change the phase.
    pub fn edit_extracted_text(&mut self, text: String) -> Result<(), ValidationError> {
        match self.extracted_text.as_mut() {
            Some(current) => {
                *current = text;
                Ok(())
            }
            None => Err(ValidationError::NoExtractedText),
        }
    }

    /// Transition to new phase
    pub(crate) fn transition_to(&mut self, new_phase: Phase) -> PhaseTransition {
        let transition = PhaseTransition {
            session_id: self.session_id,
            old_phase: self.phase,
            new_phase,
            transitioned_at: Utc::now(),
        };
        self.phase = new_phase;
        transition
    }

    /// Clear every text-dependent result and open a new request cycle
    ///
    /// Must run before an extraction request is issued so stale results are
    /// never visible next to the in-flight request.
    pub(crate) fn open_extraction_cycle(&mut self) -> RequestToken {
        self.extracted_text = None;
        self.artifacts = None;
        self.error = None;
        self.cycle = self.cycle.next();
        self.extraction_in_flight = Some(self.cycle);
        self.cycle
    }

    /// Clear previous results and tag a generation with the current cycle
    pub(crate) fn open_generation(
        &mut self,
        config: WorkflowConfiguration,
        text: String,
    ) -> RequestToken {
        self.config = config;
        self.extracted_text = Some(text);
        self.artifacts = None;
        self.error = None;
        self.generation_in_flight = Some(self.cycle);
        self.cycle
    }

    /// Mark the extraction tagged `token` as no longer outstanding
    pub(crate) fn close_extraction(&mut self, token: RequestToken) {
        if self.extraction_in_flight == Some(token) {
            self.extraction_in_flight = None;
        }
    }

    /// Mark the generation tagged `token` as no longer outstanding
    pub(crate) fn close_generation(&mut self, token: RequestToken) {
        if self.generation_in_flight == Some(token) {
            self.generation_in_flight = None;
        }
    }

    pub(crate) fn store_extracted_text(&mut self, text: String) {
        self.extracted_text = Some(text);
    }

    pub(crate) fn store_artifacts(&mut self, artifacts: GeneratedArtifactSet) {
        self.artifacts = Some(artifacts);
        self.error = None;
    }

    pub(crate) fn store_error(&mut self, message: &str) {
        self.artifacts = None;
        self.error = Some(message.to_string());
    }

    /// Drop the staged image if it is still the one identified by `image_id`
    pub(crate) fn release_staged_image(&mut self, image_id: Uuid) {
        if self.staged_image.as_ref().map(|i| i.id) == Some(image_id) {
            self.staged_image = None;
        }
    }

    /// Derive UI affordances from phase and result presence
    pub fn affordances(&self) -> Affordances {
        let has_text = self.extracted_text.is_some();
        Affordances {
            can_extract: self.extraction_in_flight.is_none(),
            can_edit_text: has_text,
            can_generate: has_text
                && self.phase == Phase::ReadyToGenerate
                && self.generation_in_flight.is_none(),
            show_results: self.artifacts.is_some(),
            extract_label: if self.phase == Phase::Extracting {
                EXTRACT_BUSY_LABEL
            } else {
                EXTRACT_LABEL
            },
            generate_label: if self.phase == Phase::Generating {
                GENERATE_BUSY_LABEL
            } else {
                GENERATE_LABEL
            },
        }
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            session_id: self.session_id,
            phase: self.phase,
            config: self.config.clone(),
            staged_file: self.staged_image.as_ref().map(|i| i.file_name.clone()),
            extracted_text: self.extracted_text.clone(),
            artifacts: self.artifacts.clone(),
            error: self.error.clone(),
            token: self.cycle,
            affordances: self.affordances(),
            created_at: self.created_at,
        }
    }
}
