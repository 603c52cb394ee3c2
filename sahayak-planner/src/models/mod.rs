//! Data models for sahayak-planner
//!
//! - Workflow configuration chosen by the user
//! - Staged source image
//! - Extraction/generation outcomes
//! - Session-scoped workflow state store and its read model

pub mod artifacts;
pub mod source_image;
pub mod workflow_config;
pub mod workflow_state;

pub use artifacts::{ExtractionOutcome, GeneratedArtifactSet, EXTRACTION_PLACEHOLDER};
pub use sahayak_common::events::{Phase, RequestKind};
pub use source_image::SourceImage;
pub use workflow_config::{Language, LanguageOption, WorkflowConfiguration};
pub use workflow_state::{
    Affordances, PhaseTransition, RequestToken, WorkflowSnapshot, WorkflowState,
};
