//! Error types for the syllabus tutor
//!
//! This module defines the error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Two enums live here:
//!
//! - [`TutorError`]: application-level failures (configuration, indexing,
//!   session preconditions, I/O).
//! - [`GenerationError`]: the tagged error half of a failover generation
//!   call. These are never propagated further up; the session shows them to
//!   the user as assistant text.

use thiserror::Error;

/// Main error type for syllabus tutor operations
#[derive(Error, Debug)]
pub enum TutorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, unexpected payloads)
    #[error("Provider error: {0}")]
    Provider(String),

    /// No credential is available for an operation that needs one
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The uploaded file extension is not one the tutor can index
    #[error("Unsupported file type: {0}. Supported types: pdf, docx, txt, md, png, jpg, jpeg")]
    UnsupportedFileType(String),

    /// The file service reported a terminal state other than ACTIVE
    #[error("File processing failed with state: {0}")]
    IndexingFailed(String),

    /// The per-session user message quota has been used up
    #[error("You have reached the {limit}-message limit. Please clear the chat to start over.")]
    QuotaExceeded {
        /// The configured quota
        limit: usize,
    },

    /// A question was asked before any syllabus was indexed
    #[error("Please upload and index your syllabus first.")]
    NoDocument,

    /// More preferences were selected than the catalog allows
    #[error("At most {max} preferences can be active at once")]
    TooManyPreferences {
        /// Maximum number of simultaneous preferences
        max: usize,
    },

    /// A preference tag did not match the catalog
    #[error("Unknown preference: {0}")]
    UnknownPreference(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure kinds of a failover generation call
///
/// The display strings are user-facing: the chat transcript shows them
/// verbatim in place of an answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The credential pool is empty; nothing was sent
    #[error("ERROR: No API keys configured.")]
    NoCredentials,

    /// Every credential answered with a quota-exceeded signal
    #[error("ERROR: All API keys are currently rate-limited. Please wait and try again.")]
    AllRateLimited,

    /// The model answered, but with blank text
    #[error("ERROR: Empty response from model.")]
    EmptyResponse,

    /// Any other provider or transport failure
    #[error("ERROR: An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Result type alias for syllabus tutor operations
///
/// Uses `anyhow::Error` so command handlers can attach context freely.
/// Session operations whose callers branch on the failure kind return
/// `std::result::Result<T, TutorError>` instead.
pub type Result<T> = anyhow::Result<T>;
