//! sahayak-planner library interface
//!
//! Exposes the workflow core and HTTP surface for the binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sahayak_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::{ContentService, SessionRegistry};

/// Room for multipart framing on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live workflow sessions
    pub sessions: SessionRegistry,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Largest accepted image upload in bytes
    pub max_image_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        content_service: Arc<dyn ContentService>,
        event_bus: EventBus,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(content_service, event_bus.clone()),
            event_bus,
            max_image_bytes,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Record an error for the health endpoint
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let body_limit = state.max_image_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(api::workflow_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
