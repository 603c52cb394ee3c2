//! HTTP content service client tests
//!
//! Runs a stub content service on an ephemeral port and checks the wire
//! format and error mapping of `HttpContentService`.

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Url;
use sahayak_planner::error::ServiceError;
use sahayak_planner::models::{Language, SourceImage, WorkflowConfiguration};
use sahayak_planner::services::{
    ContentService, ContentServiceConfig, GenerationRequest, HttpContentService,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;

/// Echoes the uploaded part back as `name|content-type|length`
async fn echo_extraction(mut multipart: Multipart) -> Json<Value> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        return Json(json!({
            "extracted_text": format!("{}|{}|{}", file_name, content_type, bytes.len())
        }));
    }
    Json(json!({}))
}

/// Builds artifacts from the request so tests can see what was sent
async fn echo_generation(Json(request): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "lesson_plan": format!("Lesson in {}", request["language"].as_str().unwrap_or("?")),
        "worksheet": format!("Worksheet for {}", request["grade_level"].as_str().unwrap_or("?")),
        "quiz": format!(
            "Quiz on {}: {}",
            request["subject"].as_str().unwrap_or("?"),
            request["extracted_text"].as_str().unwrap_or("?")
        ),
    }))
}

async fn failing() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "AI Model not configured.")
}

async fn not_json() -> &'static str {
    "<html>gateway</html>"
}

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> HttpContentService {
    let base = Url::parse(&format!("http://{}", addr)).unwrap();
    HttpContentService::new(ContentServiceConfig::new(base, Duration::from_secs(5))).unwrap()
}

fn image() -> SourceImage {
    SourceImage::new("page.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 1])
}

fn request() -> GenerationRequest {
    let config = WorkflowConfiguration {
        language: Language::Assamese,
        grade_level: "Class 6".to_string(),
        subject: "Geography".to_string(),
    };
    GenerationRequest::new(&config, "Rivers of Assam")
}

fn echo_router() -> Router {
    Router::new()
        .route("/api/v1/extract-text-from-image", post(echo_extraction))
        .route("/api/v1/generate-content-from-text", post(echo_generation))
}

#[tokio::test]
async fn test_extraction_uploads_file_part() {
    let addr = spawn_stub(echo_router()).await;
    let client = client_for(addr);

    let response = client.extract_text(&image()).await.unwrap();

    assert_eq!(response.extracted_text.as_deref(), Some("page.jpg|image/jpeg|6"));
}

#[tokio::test]
async fn test_generation_posts_json_body() {
    let addr = spawn_stub(echo_router()).await;
    let client = client_for(addr);

    let response = client.generate_content(&request()).await.unwrap();

    assert!(response.success);
    assert_eq!(response.lesson_plan.as_deref(), Some("Lesson in assamese"));
    assert_eq!(response.worksheet.as_deref(), Some("Worksheet for Class 6"));
    assert_eq!(
        response.quiz.as_deref(),
        Some("Quiz on Geography: Rivers of Assam")
    );
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let router = Router::new()
        .route("/api/v1/extract-text-from-image", post(failing))
        .route("/api/v1/generate-content-from-text", post(failing));
    let addr = spawn_stub(router).await;
    let client = client_for(addr);

    let extraction = client.extract_text(&image()).await;
    let generation = client.generate_content(&request()).await;

    assert_eq!(
        extraction.unwrap_err(),
        ServiceError::Api(500, "AI Model not configured.".to_string())
    );
    assert_eq!(
        generation.unwrap_err(),
        ServiceError::Api(500, "AI Model not configured.".to_string())
    );
}

#[tokio::test]
async fn test_non_json_body_maps_to_parse_error() {
    let router = Router::new().route("/api/v1/generate-content-from-text", post(not_json));
    let addr = spawn_stub(router).await;
    let client = client_for(addr);

    let result = client.generate_content(&request()).await;

    assert!(matches!(result, Err(ServiceError::Parse(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_missing_route_maps_to_api_error() {
    let addr = spawn_stub(Router::new()).await;
    let client = client_for(addr);

    let result = client.extract_text(&image()).await;

    assert!(matches!(result, Err(ServiceError::Api(404, _))), "got {:?}", result);
}

#[tokio::test]
async fn test_unreachable_service_maps_to_network_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(addr);

    let result = client.extract_text(&image()).await;

    assert!(matches!(result, Err(ServiceError::Network(_))), "got {:?}", result);
}
