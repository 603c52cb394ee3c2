//! # Sahayak Common Library
//!
//! Shared code for the Shiksha Sahayak services including:
//! - Error and result types
//! - Configuration loading (TOML + environment overrides)
//! - Workflow event types and the broadcast event bus
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
