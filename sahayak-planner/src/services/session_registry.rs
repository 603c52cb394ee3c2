//! Registry of live workflow sessions
//!
//! Each session owns a fresh [`WorkflowState`] behind its own controller;
//! nothing is shared between sessions except the content service and the
//! event bus.
//!
//! Clients are expected to delete their session, but one that never does is
//! reaped once it has been idle longer than the configured timeout.

use chrono::Utc;
use sahayak_common::events::{EventBus, WorkflowEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use crate::models::WorkflowState;
use crate::services::{ContentService, PhaseController};

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<PhaseController>>>>,
    service: Arc<dyn ContentService>,
    event_bus: EventBus,
}

impl SessionRegistry {
    pub fn new(service: Arc<dyn ContentService>, event_bus: EventBus) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            service,
            event_bus,
        }
    }

    /// Start a session with empty workflow state
    pub async fn create(&self) -> Arc<PhaseController> {
        let controller = Arc::new(PhaseController::new(
            WorkflowState::new(),
            Arc::clone(&self.service),
            self.event_bus.clone(),
        ));
        let session_id = controller.session_id();

        self.sessions
            .write()
            .await
            .insert(session_id, Arc::clone(&controller));

        tracing::info!(session_id = %session_id, "Workflow session created");
        self.event_bus.emit_lossy(WorkflowEvent::SessionCreated {
            session_id,
            timestamp: Utc::now(),
        });

        controller
    }

    /// Look up a session, counting the lookup as activity
    pub async fn get(&self, session_id: Uuid) -> Option<Arc<PhaseController>> {
        let controller = self.sessions.read().await.get(&session_id).cloned()?;
        controller.touch().await;
        Some(controller)
    }

    /// Discard a session
    ///
    /// Requests still in flight keep their controller alive until they
    /// finish, but their results are no longer reachable.
    pub async fn remove(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Workflow session closed");
            self.event_bus.emit_lossy(WorkflowEvent::SessionClosed {
                session_id,
                timestamp: Utc::now(),
            });
        }
        removed
    }

    /// Remove every session idle for at least `idle_timeout`
    ///
    /// Sessions with a request outstanding are kept. Returns the number removed.
    pub async fn reap_idle(&self, idle_timeout: Duration) -> usize {
        let controllers: Vec<Arc<PhaseController>> =
            self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for controller in controllers {
            if controller.idle_for().await >= idle_timeout && !controller.is_busy().await {
                expired.push(controller.session_id());
            }
        }

        let mut removed = 0;
        for session_id in expired {
            if self.remove(session_id).await {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "Reaped idle workflow sessions");
        }
        removed
    }

    /// Run [`reap_idle`](Self::reap_idle) every `period` on a background task
    pub fn spawn_reaper(&self, period: Duration, idle_timeout: Duration) -> JoinHandle<()> {
        tracing::info!(
            "Starting session reaper (period: {}s, idle timeout: {}s)",
            period.as_secs(),
            idle_timeout.as_secs()
        );

        let registry = self.clone();
        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                registry.reap_idle(idle_timeout).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
