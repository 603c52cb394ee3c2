//! Session registry lifecycle tests
//!
//! Run on a paused clock so idle timeouts can be crossed instantly.

mod helpers;

use helpers::{syllabus_image, ScriptedContentService};
use sahayak_common::events::{EventBus, WorkflowEvent};
use sahayak_planner::models::WorkflowConfiguration;
use sahayak_planner::services::{ContentService, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;

const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

fn registry_with(service: Arc<ScriptedContentService>) -> (SessionRegistry, EventBus) {
    let service: Arc<dyn ContentService> = service;
    let bus = EventBus::new(1000);
    (SessionRegistry::new(service, bus.clone()), bus)
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_sessions_are_reaped() {
    let (registry, _bus) = registry_with(Arc::new(ScriptedContentService::new()));
    for _ in 0..50 {
        let controller = registry.create().await;
        controller.stage_image(syllabus_image()).await;
    }
    assert_eq!(registry.len().await, 50);

    tokio::time::advance(IDLE_TIMEOUT - Duration::from_secs(1)).await;
    assert_eq!(registry.reap_idle(IDLE_TIMEOUT).await, 0);
    assert_eq!(registry.len().await, 50);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(registry.reap_idle(IDLE_TIMEOUT).await, 50);
    assert_eq!(registry.len().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_keeps_session_alive() {
    let (registry, bus) = registry_with(Arc::new(ScriptedContentService::new()));
    let mut rx = bus.subscribe();
    let active = registry.create().await.session_id();
    let abandoned = registry.create().await.session_id();

    tokio::time::advance(IDLE_TIMEOUT / 2).await;
    assert!(registry.get(active).await.is_some());
    tokio::time::advance(IDLE_TIMEOUT / 2).await;

    assert_eq!(registry.reap_idle(IDLE_TIMEOUT).await, 1);
    assert!(registry.get(active).await.is_some());
    assert!(registry.get(abandoned).await.is_none());

    let closed: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|event| match event {
            WorkflowEvent::SessionClosed { session_id, .. } => Some(session_id),
            _ => None,
        })
        .collect();
    assert_eq!(closed, vec![abandoned]);
}

#[tokio::test(start_paused = true)]
async fn test_session_with_outstanding_request_is_kept() {
    let (registry, _bus) = registry_with(Arc::new(ScriptedContentService::new()));
    let controller = registry.create().await;
    let _ticket = controller
        .begin_extraction(Some(syllabus_image()), WorkflowConfiguration::default())
        .await
        .unwrap();

    tokio::time::advance(IDLE_TIMEOUT * 2).await;

    assert_eq!(registry.reap_idle(IDLE_TIMEOUT).await, 0);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_completed_request_counts_as_activity() {
    let service = Arc::new(ScriptedContentService::new());
    let (registry, _bus) = registry_with(Arc::clone(&service));
    let controller = registry.create().await;
    let ticket = controller
        .begin_extraction(Some(syllabus_image()), WorkflowConfiguration::default())
        .await
        .unwrap();

    tokio::time::advance(IDLE_TIMEOUT).await;
    service.push_extraction_text("Photosynthesis");
    controller.finish_extraction(ticket).await;

    assert_eq!(registry.reap_idle(IDLE_TIMEOUT).await, 0);
    tokio::time::advance(IDLE_TIMEOUT).await;
    assert_eq!(registry.reap_idle(IDLE_TIMEOUT).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_reaper_removes_idle_sessions() {
    let (registry, _bus) = registry_with(Arc::new(ScriptedContentService::new()));
    for _ in 0..5 {
        registry.create().await;
    }

    let reaper = registry.spawn_reaper(Duration::from_secs(60), IDLE_TIMEOUT);

    // Paused clock auto-advances through the reaper's ticks while we sleep
    tokio::time::sleep(IDLE_TIMEOUT / 2).await;
    assert_eq!(registry.len().await, 5);

    tokio::time::sleep(IDLE_TIMEOUT / 2 + Duration::from_secs(120)).await;
    assert_eq!(registry.len().await, 0);

    reaper.abort();
}
