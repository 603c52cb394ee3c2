//! Two-phase generation workflow controller
//!
//! # State Progression
//! Idle → Extracting → ReadyToGenerate ⇄ Generating
//!                  ↘ Failed → Extracting (retry)
//!
//! # Architecture
//! Each operation has two halves:
//! - **begin** (synchronous, under the state lock): validation, single-flight
//!   check, result reset, token assignment, phase transition
//! - **finish** (async): the remote call, then token-checked application of
//!   the outcome under the lock again
//!
//! The lock is never held across a remote call, so an extraction may start
//! while a generation is outstanding. Responses are applied in completion
//! order; a generation response tagged with a superseded cycle is dropped.
//!
//! Remote failures never surface as `Err`: they become a user-facing error
//! string plus a phase reset. `Err` is reserved for local rejections.

use chrono::Utc;
use sahayak_common::events::{EventBus, Phase, RequestKind, WorkflowEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{ControllerError, ValidationError};
use crate::models::{
    ExtractionOutcome, GeneratedArtifactSet, PhaseTransition, RequestToken, SourceImage,
    WorkflowConfiguration, WorkflowSnapshot, WorkflowState, EXTRACTION_PLACEHOLDER,
};
use crate::services::content_client::{ContentService, GenerationRequest};

/// Shown when the extraction call fails
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to extract text from image.";
/// Shown when the generation call fails
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate materials.";

/// How a finished request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Result (including the extraction placeholder) written to session state
    Applied,
    /// Failure written to session state, with the message shown to the user
    Failed(&'static str),
    /// Response belonged to a superseded cycle and was dropped
    Superseded,
}

/// Accepted extraction awaiting its remote call
#[derive(Debug)]
pub struct ExtractionTicket {
    token: RequestToken,
    image: SourceImage,
}

impl ExtractionTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }
}

/// Accepted generation awaiting its remote call
///
/// Carries the text as it was at issue time; later edits do not affect it.
#[derive(Debug)]
pub struct GenerationTicket {
    token: RequestToken,
    request: GenerationRequest,
}

impl GenerationTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

/// Phase controller for one session
pub struct PhaseController {
    session_id: Uuid,
    state: Arc<RwLock<WorkflowState>>,
    service: Arc<dyn ContentService>,
    event_bus: EventBus,
    last_activity: RwLock<Instant>,
}

impl PhaseController {
    /// Create a controller over a session's state
    ///
    /// # Arguments
    /// * `state` - Session-scoped workflow state store
    /// * `service` - Remote content service
    /// * `event_bus` - Bus for phase and completion events
    pub fn new(
        state: WorkflowState,
        service: Arc<dyn ContentService>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            session_id: state.session_id(),
            state: Arc::new(RwLock::new(state)),
            service,
            event_bus,
            last_activity: RwLock::new(Instant::now()),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Shared handle to the session's state store
    pub fn state(&self) -> Arc<RwLock<WorkflowState>> {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.state.read().await.snapshot()
    }

    /// Mark the session as used now
    pub async fn touch(&self) {
        *self.last_activity.write().await = Instant::now();
    }

    /// Time since the session was last used
    pub async fn idle_for(&self) -> Duration {
        self.last_activity.read().await.elapsed()
    }

    /// True while an extraction or a current-cycle generation is outstanding
    pub async fn is_busy(&self) -> bool {
        self.state.read().await.phase().is_transitional()
    }

    pub async fn update_configuration(&self, config: WorkflowConfiguration) -> WorkflowSnapshot {
        let mut state = self.state.write().await;
        state.set_config(config);
        state.snapshot()
    }

    pub async fn stage_image(&self, image: SourceImage) -> WorkflowSnapshot {
        let mut state = self.state.write().await;
        if let Some(previous) = state.stage_image(image) {
            tracing::debug!(
                session_id = %self.session_id,
                file_name = %previous.file_name,
                "Discarded previously staged image"
            );
        }
        state.snapshot()
    }

    pub async fn edit_extracted_text(
        &self,
        text: String,
    ) -> Result<WorkflowSnapshot, ControllerError> {
        let mut state = self.state.write().await;
        state.edit_extracted_text(text)?;
        Ok(state.snapshot())
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    /// Extract text from `image` and store it for verification
    pub async fn submit_extraction(
        &self,
        image: Option<SourceImage>,
        config: WorkflowConfiguration,
    ) -> Result<Completion, ControllerError> {
        let ticket = self.begin_extraction(image, config).await?;
        Ok(self.finish_extraction(ticket).await)
    }

    /// Extract text from the currently staged image
    pub async fn submit_staged_extraction(&self) -> Result<Completion, ControllerError> {
        let ticket = self.begin_staged_extraction().await?;
        Ok(self.finish_extraction(ticket).await)
    }

    /// Accept an extraction request and reset text-dependent state
    pub async fn begin_extraction(
        &self,
        image: Option<SourceImage>,
        config: WorkflowConfiguration,
    ) -> Result<ExtractionTicket, ControllerError> {
        let mut state = self.state.write().await;
        let ticket = self.open_extraction(&mut state, image)?;
        state.set_config(config);
        Ok(ticket)
    }

    /// Accept an extraction of the staged image using the stored configuration
    pub async fn begin_staged_extraction(&self) -> Result<ExtractionTicket, ControllerError> {
        let mut state = self.state.write().await;
        let image = state.staged_image().cloned();
        self.open_extraction(&mut state, image)
    }

    fn open_extraction(
        &self,
        state: &mut WorkflowState,
        image: Option<SourceImage>,
    ) -> Result<ExtractionTicket, ControllerError> {
        let image = image.ok_or(ValidationError::MissingFile)?;
        if state.extraction_in_flight().is_some() {
            return Err(ControllerError::Busy(RequestKind::Extraction));
        }

        let token = state.open_extraction_cycle();
        let transition = state.transition_to(Phase::Extracting);

        tracing::info!(
            session_id = %self.session_id,
            token = %token,
            file_name = %image.file_name,
            "Extraction started"
        );
        self.emit_transition(transition);

        Ok(ExtractionTicket { token, image })
    }

    /// Run the extraction call and apply its outcome
    pub async fn finish_extraction(&self, ticket: ExtractionTicket) -> Completion {
        let result = self.service.extract_text(&ticket.image).await;
        let outcome = ExtractionOutcome::from_result(result);
        self.apply_extraction(ticket, outcome).await
    }

    async fn apply_extraction(
        &self,
        ticket: ExtractionTicket,
        outcome: ExtractionOutcome,
    ) -> Completion {
        let ExtractionTicket { token, image } = ticket;
        let mut state = self.state.write().await;
        state.close_extraction(token);

        let current = state.current_token();
        if current != token {
            drop(state);
            self.discard_stale(RequestKind::Extraction, token, current);
            return Completion::Superseded;
        }

        let (transition, completion) = match outcome {
            ExtractionOutcome::Text(text) => {
                state.store_extracted_text(text);
                state.release_staged_image(image.id);
                tracing::info!(
                    session_id = %self.session_id,
                    token = %token,
                    "Extraction completed"
                );
                self.emit_extraction_completed(token, false);
                (state.transition_to(Phase::ReadyToGenerate), Completion::Applied)
            }
            ExtractionOutcome::Empty => {
                state.store_extracted_text(EXTRACTION_PLACEHOLDER.to_string());
                state.release_staged_image(image.id);
                tracing::warn!(
                    session_id = %self.session_id,
                    token = %token,
                    "Extraction returned no usable text, placeholder stored"
                );
                self.emit_extraction_completed(token, true);
                (state.transition_to(Phase::ReadyToGenerate), Completion::Applied)
            }
            ExtractionOutcome::Failed(err) => {
                state.store_error(EXTRACTION_FAILED_MESSAGE);
                tracing::error!(
                    session_id = %self.session_id,
                    token = %token,
                    class = ?err.class(),
                    error = %err,
                    "Extraction failed"
                );
                self.emit_failed(RequestKind::Extraction, EXTRACTION_FAILED_MESSAGE);
                (
                    state.transition_to(Phase::Failed),
                    Completion::Failed(EXTRACTION_FAILED_MESSAGE),
                )
            }
        };

        drop(state);
        self.emit_transition(transition);
        self.touch().await;
        completion
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    /// Generate teaching materials from verified text
    pub async fn submit_generation(
        &self,
        config: WorkflowConfiguration,
        extracted_text: String,
    ) -> Result<Completion, ControllerError> {
        let ticket = self.begin_generation(config, extracted_text).await?;
        Ok(self.finish_generation(ticket).await)
    }

    /// Generate from the configuration and text currently in the store
    pub async fn submit_current_generation(&self) -> Result<Completion, ControllerError> {
        let ticket = self.begin_current_generation().await?;
        Ok(self.finish_generation(ticket).await)
    }

    /// Accept a generation request, tagging it with the current cycle
    pub async fn begin_generation(
        &self,
        config: WorkflowConfiguration,
        extracted_text: String,
    ) -> Result<GenerationTicket, ControllerError> {
        let mut state = self.state.write().await;
        self.open_generation(&mut state, config, extracted_text)
    }

    /// Accept a generation using the stored configuration and text
    pub async fn begin_current_generation(&self) -> Result<GenerationTicket, ControllerError> {
        let mut state = self.state.write().await;
        let config = state.config().clone();
        let text = state.extracted_text().unwrap_or_default().to_string();
        self.open_generation(&mut state, config, text)
    }

    fn open_generation(
        &self,
        state: &mut WorkflowState,
        config: WorkflowConfiguration,
        extracted_text: String,
    ) -> Result<GenerationTicket, ControllerError> {
        if extracted_text.trim().is_empty() {
            return Err(ValidationError::EmptyText.into());
        }
        config.validate_for_generation()?;
        if state.generation_in_flight().is_some() {
            return Err(ControllerError::Busy(RequestKind::Generation));
        }
        if state.extraction_in_flight().is_some() {
            return Err(ControllerError::Busy(RequestKind::Extraction));
        }

        let request = GenerationRequest::new(&config, extracted_text.clone());
        let token = state.open_generation(config, extracted_text);
        let transition = state.transition_to(Phase::Generating);

        tracing::info!(
            session_id = %self.session_id,
            token = %token,
            language = %request.language,
            grade_level = %request.grade_level,
            subject = %request.subject,
            "Generation started"
        );
        self.emit_transition(transition);

        Ok(GenerationTicket { token, request })
    }

    /// Run the generation call and apply its outcome
    pub async fn finish_generation(&self, ticket: GenerationTicket) -> Completion {
        let result = self
            .service
            .generate_content(&ticket.request)
            .await
            .and_then(GeneratedArtifactSet::from_response);

        let token = ticket.token;
        let mut state = self.state.write().await;
        state.close_generation(token);

        let current = state.current_token();
        if current != token {
            drop(state);
            self.discard_stale(RequestKind::Generation, token, current);
            return Completion::Superseded;
        }

        let completion = match result {
            Ok(artifacts) => {
                state.store_artifacts(artifacts);
                tracing::info!(
                    session_id = %self.session_id,
                    token = %token,
                    "Generation completed"
                );
                self.event_bus.emit_lossy(WorkflowEvent::GenerationCompleted {
                    session_id: self.session_id,
                    token: token.value(),
                    timestamp: Utc::now(),
                });
                Completion::Applied
            }
            Err(err) => {
                state.store_error(GENERATION_FAILED_MESSAGE);
                tracing::error!(
                    session_id = %self.session_id,
                    token = %token,
                    class = ?err.class(),
                    error = %err,
                    "Generation failed"
                );
                self.emit_failed(RequestKind::Generation, GENERATION_FAILED_MESSAGE);
                Completion::Failed(GENERATION_FAILED_MESSAGE)
            }
        };

        // Verified text is kept either way so the user can regenerate
        let transition = state.transition_to(Phase::ReadyToGenerate);
        drop(state);
        self.emit_transition(transition);
        self.touch().await;
        completion
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn discard_stale(&self, kind: RequestKind, token: RequestToken, current: RequestToken) {
        tracing::debug!(
            session_id = %self.session_id,
            kind = %kind,
            token = %token,
            current_token = %current,
            "Discarding response from superseded request cycle"
        );
        self.event_bus.emit_lossy(WorkflowEvent::StaleResponseDiscarded {
            session_id: self.session_id,
            kind,
            token: token.value(),
            current_token: current.value(),
            timestamp: Utc::now(),
        });
    }

    fn emit_transition(&self, transition: PhaseTransition) {
        if transition.is_change() {
            self.event_bus.emit_lossy(transition.into_event());
        }
    }

    fn emit_extraction_completed(&self, token: RequestToken, degraded: bool) {
        self.event_bus.emit_lossy(WorkflowEvent::ExtractionCompleted {
            session_id: self.session_id,
            token: token.value(),
            degraded,
            timestamp: Utc::now(),
        });
    }

    fn emit_failed(&self, kind: RequestKind, message: &str) {
        self.event_bus.emit_lossy(WorkflowEvent::WorkflowFailed {
            session_id: self.session_id,
            kind,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}
