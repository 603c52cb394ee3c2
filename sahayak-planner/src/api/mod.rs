//! HTTP API handlers for sahayak-planner
//!
//! REST endpoints drive a session's workflow; SSE streams push its state
//! changes to the presentation layer.

pub mod health;
pub mod sse;
pub mod workflow;

pub use health::health_routes;
pub use sse::{event_stream, session_event_stream};
pub use workflow::workflow_routes;
