//! Services for sahayak-planner
//!
//! - `content_client`: remote content service contract and HTTP client
//! - `phase_controller`: two-phase workflow state machine
//! - `session_registry`: live sessions keyed by id

pub mod content_client;
pub mod phase_controller;
pub mod session_registry;

pub use content_client::{
    ContentService, ContentServiceConfig, ExtractionResponse, GenerationRequest,
    GenerationResponse, HttpContentService,
};
pub use phase_controller::{
    Completion, ExtractionTicket, GenerationTicket, PhaseController, EXTRACTION_FAILED_MESSAGE,
    GENERATION_FAILED_MESSAGE,
};
pub use session_registry::SessionRegistry;
