//! Workflow types shared between the planner service and event consumers

use serde::{Deserialize, Serialize};

/// Discrete stage of the extract → verify → generate workflow
///
/// Exactly one phase is active per session at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing submitted yet in this session
    #[default]
    Idle,
    /// Text extraction request outstanding
    Extracting,
    /// Extracted text available for review; generation may be (re)run
    ReadyToGenerate,
    /// Content generation request outstanding
    Generating,
    /// Last extraction failed; extraction may be retried immediately
    Failed,
}

impl Phase {
    /// True while a remote request owns the phase
    pub fn is_transitional(&self) -> bool {
        matches!(self, Phase::Extracting | Phase::Generating)
    }
}

/// The two kinds of remote request a session can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Extraction,
    Generation,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Extraction => write!(f, "extraction"),
            RequestKind::Generation => write!(f, "generation"),
        }
    }
}
