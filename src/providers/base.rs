//! Service traits and common types for the hosted model
//!
//! The hosted model is reached through two seams:
//!
//! - [`GenerationService`]: one text generation call with one credential
//! - [`FileService`]: upload, state polling and release of indexed files
//!
//! Neither trait retries anything. Credential rotation lives in
//! [`crate::failover`], upload sequencing in [`crate::session`].

use crate::credentials::Credential;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Failure of a single call to the hosted service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The key's quota or rate limit is exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Non-success HTTP status other than a quota signal
    #[error("Gemini API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message reported by the service
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("Request failed: {0}")]
    Network(String),

    /// The service answered with a payload we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The local file to upload could not be read
    #[error("Local file error: {0}")]
    LocalFile(String),

    /// The prompt was rejected by the service's safety filters
    #[error("Prompt blocked: {0}")]
    Blocked(String),
}

impl ProviderError {
    /// Whether the failover caller should move on to the next credential
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

/// Result alias for single service calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Processing state of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// Still being ingested; poll again
    Processing,
    /// Ready to be referenced by generation calls
    Active,
    /// Ingestion failed permanently
    Failed,
    /// Any state this client does not know about
    #[serde(other)]
    StateUnspecified,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => write!(f, "PROCESSING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Failed => write!(f, "FAILED"),
            Self::StateUnspecified => write!(f, "STATE_UNSPECIFIED"),
        }
    }
}

/// A file as reported by the file service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`
    pub name: String,
    /// URI referenced from generation requests
    pub uri: String,
    /// MIME type recorded by the service
    pub mime_type: String,
    /// Human-readable name given at upload time
    pub display_name: String,
    /// Current processing state
    pub state: FileState,
}

/// Reference to an indexed file inside a generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub uri: String,
    pub mime_type: String,
}

/// Everything needed for one generation call, minus the credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Model identifier, e.g. `gemini-2.0-flash-lite`
    pub model: String,
    /// User prompt text
    pub prompt: String,
    /// Optional indexed file placed before the prompt
    pub document: Option<DocumentRef>,
    /// Optional system instruction
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    /// Creates a plain prompt request
    ///
    /// # Examples
    ///
    /// ```
    /// use syllabus_tutor::providers::GenerationRequest;
    ///
    /// let request = GenerationRequest::new("gemini-2.0-flash-lite", "Explain eigenvalues")
    ///     .with_system_instruction("You are a tutor");
    /// assert!(request.document.is_none());
    /// assert_eq!(request.system_instruction.as_deref(), Some("You are a tutor"));
    /// ```
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            document: None,
            system_instruction: None,
        }
    }

    /// Attaches an indexed file
    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    /// Sets the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Hosted text generation
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Performs one generation call authenticated with `credential`
    ///
    /// Returns the raw (untrimmed, possibly empty) response text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::QuotaExceeded`] for quota / rate-limit
    /// responses and another variant for every other failure.
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> ProviderResult<String>;
}

/// Hosted file indexing
#[async_trait]
pub trait FileService: Send + Sync {
    /// Uploads the file at `path` and returns its initial state
    async fn upload(
        &self,
        credential: &Credential,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> ProviderResult<RemoteFile>;

    /// Reads the current state of an uploaded file
    async fn get(&self, credential: &Credential, name: &str) -> ProviderResult<RemoteFile>;

    /// Releases an uploaded file
    async fn delete(&self, credential: &Credential, name: &str) -> ProviderResult<()>;
}
