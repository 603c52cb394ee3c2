//! Remote content service client
//!
//! The content service is a stateless pair of endpoints:
//! - `POST <extraction_path>`: multipart upload with one `file` part,
//!   answers `{ "extracted_text": "..." }`
//! - `POST <generation_path>`: JSON `{language, grade_level, subject, extracted_text}`,
//!   answers `{ "success": bool, "lesson_plan", "worksheet", "quiz" }`

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ServiceError;
use crate::models::{Language, SourceImage, WorkflowConfiguration};

pub const DEFAULT_EXTRACTION_PATH: &str = "/api/v1/extract-text-from-image";
pub const DEFAULT_GENERATION_PATH: &str = "/api/v1/generate-content-from-text";
const USER_AGENT: &str = concat!("sahayak-planner/", env!("CARGO_PKG_VERSION"));

/// Extraction endpoint response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub extracted_text: Option<String>,
}

/// Generation endpoint request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub language: Language,
    pub grade_level: String,
    pub subject: String,
    pub extracted_text: String,
}

impl GenerationRequest {
    pub fn new(config: &WorkflowConfiguration, extracted_text: impl Into<String>) -> Self {
        Self {
            language: config.language,
            grade_level: config.grade_level.clone(),
            subject: config.subject.clone(),
            extracted_text: extracted_text.into(),
        }
    }
}

/// Generation endpoint response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub lesson_plan: Option<String>,
    #[serde(default)]
    pub worksheet: Option<String>,
    #[serde(default)]
    pub quiz: Option<String>,
}

/// Contract consumed by the phase controller
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Read the text printed on a syllabus image
    async fn extract_text(&self, image: &SourceImage) -> Result<ExtractionResponse, ServiceError>;

    /// Produce lesson plan, worksheet and quiz from verified text
    async fn generate_content(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ServiceError>;
}

/// Connection settings for [`HttpContentService`]
#[derive(Debug, Clone)]
pub struct ContentServiceConfig {
    pub base_url: Url,
    pub extraction_path: String,
    pub generation_path: String,
    pub timeout: Duration,
}

impl ContentServiceConfig {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        Self {
            base_url,
            extraction_path: DEFAULT_EXTRACTION_PATH.to_string(),
            generation_path: DEFAULT_GENERATION_PATH.to_string(),
            timeout,
        }
    }
}

/// HTTP implementation of [`ContentService`]
pub struct HttpContentService {
    http_client: reqwest::Client,
    extraction_url: Url,
    generation_url: Url,
}

impl HttpContentService {
    pub fn new(config: ContentServiceConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let extraction_url = config
            .base_url
            .join(&config.extraction_path)
            .map_err(|e| ServiceError::Parse(format!("Invalid extraction path: {}", e)))?;
        let generation_url = config
            .base_url
            .join(&config.generation_path)
            .map_err(|e| ServiceError::Parse(format!("Invalid generation path: {}", e)))?;

        Ok(Self {
            http_client,
            extraction_url,
            generation_url,
        })
    }

    pub fn extraction_url(&self) -> &Url {
        &self.extraction_url
    }

    pub fn generation_url(&self) -> &Url {
        &self.generation_url
    }

    /// Map non-success status codes to `ServiceError::Api`
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await.unwrap_or_default();
        Err(ServiceError::Api(status.as_u16(), error_text))
    }
}

#[async_trait]
impl ContentService for HttpContentService {
    async fn extract_text(&self, image: &SourceImage) -> Result<ExtractionResponse, ServiceError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| ServiceError::Parse(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            file_name = %image.file_name,
            bytes = image.len(),
            url = %self.extraction_url,
            "Requesting text extraction"
        );

        let response = self
            .http_client
            .post(self.extraction_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let extraction: ExtractionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        tracing::info!(
            chars = extraction.extracted_text.as_ref().map(|t| t.len()).unwrap_or(0),
            "Text extraction response received"
        );

        Ok(extraction)
    }

    async fn generate_content(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ServiceError> {
        tracing::debug!(
            language = %request.language,
            grade_level = %request.grade_level,
            subject = %request.subject,
            url = %self.generation_url,
            "Requesting content generation"
        );

        let response = self
            .http_client
            .post(self.generation_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let generation: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        tracing::info!(success = generation.success, "Content generation response received");

        Ok(generation)
    }
}
