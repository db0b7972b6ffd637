//! Gemini provider implementation
//!
//! Implements [`GenerationService`] and [`FileService`] against the Gemini
//! REST API:
//!
//! - `POST v1beta/models/{model}:generateContent` for text generation
//! - resumable `POST upload/v1beta/files` for uploads
//! - `GET` / `DELETE v1beta/files/{id}` for state polling and release
//!
//! The API key travels in the `x-goog-api-key` header so it never appears
//! in URLs or in error messages built from them.

use crate::config::GeminiConfig;
use crate::credentials::Credential;
use crate::error::{Result, TutorError};
use crate::providers::{
    FileService, FileState, GenerationRequest, GenerationService, ProviderError, ProviderResult,
    RemoteFile,
};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini API client
///
/// # Examples
///
/// ```
/// use syllabus_tutor::config::GeminiConfig;
/// use syllabus_tutor::providers::GeminiProvider;
///
/// let provider = GeminiProvider::new(&GeminiConfig::default()).unwrap();
/// assert_eq!(provider.api_base(), "https://generativelanguage.googleapis.com");
/// ```
pub struct GeminiProvider {
    client: Client,
    api_base: String,
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

/// Response body from generateContent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// File resource as returned by the Files API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    state: Option<FileState>,
}

impl From<FileResource> for RemoteFile {
    fn from(file: FileResource) -> Self {
        Self {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
            display_name: file.display_name,
            state: file.state.unwrap_or(FileState::StateUnspecified),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

impl GeminiProvider {
    /// Create a new Gemini client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("syllabus-tutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TutorError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = config.api_base.trim_end_matches('/').to_string();
        tracing::info!("Initialized Gemini provider: api_base={}", api_base);

        Ok(Self { client, api_base })
    }

    /// Configured API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Sends a request and turns non-success statuses into provider errors
    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Gemini request failed: {}", e);
            ProviderError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_error(status, &body);
        tracing::warn!("Gemini returned {}: {}", status, error);
        Err(error)
    }
}

/// Maps an error response to a provider error
///
/// HTTP 429 and a `RESOURCE_EXHAUSTED` status in the body both count as the
/// quota signal.
fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let exhausted = parsed
        .as_ref()
        .map(|e| e.status == "RESOURCE_EXHAUSTED")
        .unwrap_or(false);

    let message = parsed
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        ProviderError::QuotaExceeded(message)
    } else {
        ProviderError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn build_request_body(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(document) = &request.document {
        parts.push(Part {
            file_data: Some(FileData {
                mime_type: document.mime_type.clone(),
                file_uri: document.uri.clone(),
            }),
            ..Default::default()
        });
    }
    parts.push(Part {
        text: Some(request.prompt.clone()),
        ..Default::default()
    });

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part {
                text: Some(text.clone()),
                ..Default::default()
            }],
        }),
    }
}

/// Concatenates the text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> ProviderResult<String> {
    if response.candidates.is_empty() {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Blocked(reason));
        }
        return Ok(String::new());
    }

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(text)
}

#[async_trait]
impl GenerationService for GeminiProvider {
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> ProviderResult<String> {
        let url = self.endpoint(&format!("v1beta/models/{}:generateContent", request.model));
        let body = build_request_body(request);

        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            with_document = request.document.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .send(
                self.client
                    .post(&url)
                    .header(API_KEY_HEADER, credential.expose())
                    .json(&body),
            )
            .await?;

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ProviderError::InvalidResponse(e.to_string())
        })?;

        extract_text(parsed)
    }
}

#[async_trait]
impl FileService for GeminiProvider {
    async fn upload(
        &self,
        credential: &Credential,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> ProviderResult<RemoteFile> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ProviderError::LocalFile(format!("Failed to read {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            "Starting resumable upload of {} ({} bytes, {})",
            display_name,
            bytes.len(),
            mime_type
        );

        let start = self
            .send(
                self.client
                    .post(self.endpoint("upload/v1beta/files"))
                    .header(API_KEY_HEADER, credential.expose())
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type)
                    .json(&serde_json::json!({ "file": { "display_name": display_name } })),
            )
            .await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!("missing {} header", UPLOAD_URL_HEADER))
            })?;

        let finished = self
            .send(
                self.client
                    .post(&upload_url)
                    .header(API_KEY_HEADER, credential.expose())
                    .header("X-Goog-Upload-Offset", "0")
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .header(CONTENT_TYPE, mime_type)
                    .body(bytes),
            )
            .await?;

        let uploaded: UploadResponse = finished.json().await.map_err(|e| {
            tracing::error!("Failed to parse upload response: {}", e);
            ProviderError::InvalidResponse(e.to_string())
        })?;

        let file = RemoteFile::from(uploaded.file);
        tracing::info!("Uploaded {} as {} ({})", display_name, file.name, file.state);
        Ok(file)
    }

    async fn get(&self, credential: &Credential, name: &str) -> ProviderResult<RemoteFile> {
        let response = self
            .send(
                self.client
                    .get(self.endpoint(&format!("v1beta/{}", name)))
                    .header(API_KEY_HEADER, credential.expose()),
            )
            .await?;

        let file: FileResource = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse file resource: {}", e);
            ProviderError::InvalidResponse(e.to_string())
        })?;

        Ok(file.into())
    }

    async fn delete(&self, credential: &Credential, name: &str) -> ProviderResult<()> {
        self.send(
            self.client
                .delete(self.endpoint(&format!("v1beta/{}", name)))
                .header(API_KEY_HEADER, credential.expose()),
        )
        .await?;

        tracing::info!("Deleted file {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::DocumentRef;

    #[test]
    fn test_endpoint_trims_slashes() {
        let config = GeminiConfig {
            api_base: "http://localhost:1234/".to_string(),
            ..Default::default()
        };
        let provider = GeminiProvider::new(&config).unwrap();
        assert_eq!(
            provider.endpoint("/v1beta/files/abc"),
            "http://localhost:1234/v1beta/files/abc"
        );
    }

    #[test]
    fn test_classify_error_429_is_quota() {
        let error = classify_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(error, ProviderError::QuotaExceeded("slow down".to_string()));
    }

    #[test]
    fn test_classify_error_resource_exhausted_body_is_quota() {
        let body = r#"{"error":{"code":403,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;
        let error = classify_error(StatusCode::FORBIDDEN, body);
        assert_eq!(
            error,
            ProviderError::QuotaExceeded("Quota exceeded for metric".to_string())
        );
    }

    #[test]
    fn test_classify_error_other_status() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let error = classify_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            error,
            ProviderError::Api {
                status: 400,
                message: "API key not valid".to_string()
            }
        );
    }

    #[test]
    fn test_request_body_places_file_before_prompt() {
        let request = GenerationRequest::new("gemini-2.0-flash-lite", "Explain limits")
            .with_document(DocumentRef {
                uri: "https://files/abc".to_string(),
                mime_type: "application/pdf".to_string(),
            })
            .with_system_instruction("Be a tutor");

        let value = serde_json::to_value(build_request_body(&request)).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["fileData"]["fileUri"], "https://files/abc");
        assert_eq!(parts[0]["fileData"]["mimeType"], "application/pdf");
        assert_eq!(parts[1]["text"], "Explain limits");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be a tutor");
        assert!(value["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_request_body_without_system_instruction() {
        let request = GenerationRequest::new("m", "hi");
        let value = serde_json::to_value(build_request_body(&request)).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert_eq!(value["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r###"{"candidates":[{"content":{"role":"model","parts":[{"text":"## Explanation"},{"text":"\nLimits..."}]},"finishReason":"STOP"}]}"###,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "## Explanation\nLimits...");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(
            extract_text(response),
            Err(ProviderError::Blocked("SAFETY".to_string()))
        );
    }

    #[test]
    fn test_extract_text_no_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(response).unwrap(), "");
    }
}
