//! Shared test helpers
//!
//! `ScriptedContentService` answers from queues of canned responses, counts
//! calls, records generation requests, and can hold responses behind a gate so
//! tests control completion order.

#![allow(dead_code)]

use async_trait::async_trait;
use sahayak_planner::error::ServiceError;
use sahayak_planner::models::SourceImage;
use sahayak_planner::services::{
    ContentService, ExtractionResponse, GenerationRequest, GenerationResponse,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub struct ScriptedContentService {
    extractions: Mutex<VecDeque<Result<ExtractionResponse, ServiceError>>>,
    generations: Mutex<VecDeque<Result<GenerationResponse, ServiceError>>>,
    extraction_calls: AtomicUsize,
    generation_calls: AtomicUsize,
    generation_requests: Mutex<Vec<GenerationRequest>>,
    extraction_gate: Mutex<Option<Arc<Notify>>>,
    generation_gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedContentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_extraction_text(&self, text: &str) -> &Self {
        self.push_extraction(Ok(ExtractionResponse {
            extracted_text: Some(text.to_string()),
        }))
    }

    pub fn push_extraction(&self, response: Result<ExtractionResponse, ServiceError>) -> &Self {
        self.extractions.lock().unwrap().push_back(response);
        self
    }

    pub fn push_generation_success(&self, lesson_plan: &str, worksheet: &str, quiz: &str) -> &Self {
        self.push_generation(Ok(GenerationResponse {
            success: true,
            lesson_plan: Some(lesson_plan.to_string()),
            worksheet: Some(worksheet.to_string()),
            quiz: Some(quiz.to_string()),
        }))
    }

    pub fn push_generation(&self, response: Result<GenerationResponse, ServiceError>) -> &Self {
        self.generations.lock().unwrap().push_back(response);
        self
    }

    /// Hold every extraction response until the returned gate is notified
    pub fn gate_extractions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.extraction_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold every generation response until the returned gate is notified
    pub fn gate_generations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.generation_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn extraction_calls(&self) -> usize {
        self.extraction_calls.load(Ordering::SeqCst)
    }

    pub fn generation_calls(&self) -> usize {
        self.generation_calls.load(Ordering::SeqCst)
    }

    pub fn generation_requests(&self) -> Vec<GenerationRequest> {
        self.generation_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentService for ScriptedContentService {
    async fn extract_text(&self, _image: &SourceImage) -> Result<ExtractionResponse, ServiceError> {
        self.extraction_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.extraction_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Network("no scripted extraction".to_string())))
    }

    async fn generate_content(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ServiceError> {
        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        self.generation_requests.lock().unwrap().push(request.clone());
        let gate = self.generation_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Network("no scripted generation".to_string())))
    }
}

pub fn syllabus_image() -> SourceImage {
    SourceImage::new("syllabus.png", "image/png", vec![0x89, b'P', b'N', b'G', 1, 2, 3])
}
