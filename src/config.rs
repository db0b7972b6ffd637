//! Configuration management for the syllabus tutor
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files and environment variables.

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Gemini API settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Where API keys are loaded from
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Chat session behavior
    #[serde(default)]
    pub session: SessionConfig,
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL (override for tests and proxies)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used to answer tutoring questions
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for topic extraction (handles scanned and handwritten pages)
    #[serde(default = "default_topics_model")]
    pub topics_model: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_chat_model() -> String {
    "gemini-2.0-flash-lite".to_string()
}

fn default_topics_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            chat_model: default_chat_model(),
            topics_model: default_topics_model(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Credential source configuration
///
/// Process environment variables are always consulted; these two files are
/// optional extra sources and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Local key-value file in `.env` format
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// Deployment secret store: a flat YAML mapping of slot name to key
    #[serde(default = "default_secrets_file")]
    pub secrets_file: PathBuf,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from("config/secrets.yaml")
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
            secrets_file: default_secrets_file(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of user questions per indexed syllabus
    #[serde(default = "default_user_message_quota")]
    pub user_message_quota: usize,

    /// Input that lifts the quota for the rest of the session
    #[serde(default = "default_unlock_phrase")]
    pub unlock_phrase: String,

    /// Delay between file state polls while the upload is processing (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Run topic extraction right after a successful upload
    #[serde(default = "default_extract_topics_on_upload")]
    pub extract_topics_on_upload: bool,
}

fn default_user_message_quota() -> usize {
    5
}

fn default_unlock_phrase() -> String {
    "himanshu".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_extract_topics_on_upload() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_message_quota: default_user_message_quota(),
            unlock_phrase: default_unlock_phrase(),
            poll_interval_seconds: default_poll_interval(),
            extract_topics_on_upload: default_extract_topics_on_upload(),
        }
    }
}

impl SessionConfig {
    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TutorError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TutorError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_base) = std::env::var("SYLLABUS_TUTOR_API_BASE") {
            self.gemini.api_base = api_base;
        }

        if let Ok(model) = std::env::var("SYLLABUS_TUTOR_CHAT_MODEL") {
            self.gemini.chat_model = model;
        }

        if let Ok(model) = std::env::var("SYLLABUS_TUTOR_TOPICS_MODEL") {
            self.gemini.topics_model = model;
        }

        if let Ok(phrase) = std::env::var("SYLLABUS_TUTOR_UNLOCK_PHRASE") {
            self.session.unlock_phrase = phrase;
        }

        if let Ok(quota) = std::env::var("SYLLABUS_TUTOR_MESSAGE_QUOTA") {
            match quota.parse::<usize>() {
                Ok(v) => {
                    self.session.user_message_quota = v;
                    tracing::debug!(
                        user_message_quota = v,
                        "Env override: SYLLABUS_TUTOR_MESSAGE_QUOTA"
                    );
                }
                Err(_) => {
                    tracing::warn!("Invalid value for SYLLABUS_TUTOR_MESSAGE_QUOTA: {}", quota);
                }
            }
        }

        if let Ok(interval) = std::env::var("SYLLABUS_TUTOR_POLL_INTERVAL") {
            match interval.parse::<u64>() {
                Ok(v) => {
                    self.session.poll_interval_seconds = v;
                    tracing::debug!(
                        poll_interval_seconds = v,
                        "Env override: SYLLABUS_TUTOR_POLL_INTERVAL"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SYLLABUS_TUTOR_POLL_INTERVAL: {}",
                        interval
                    );
                }
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_base.trim().is_empty() {
            return Err(TutorError::Config("gemini.api_base cannot be empty".to_string()).into());
        }

        if self.gemini.chat_model.trim().is_empty() {
            return Err(
                TutorError::Config("gemini.chat_model cannot be empty".to_string()).into(),
            );
        }

        if self.gemini.topics_model.trim().is_empty() {
            return Err(
                TutorError::Config("gemini.topics_model cannot be empty".to_string()).into(),
            );
        }

        if self.gemini.request_timeout_seconds == 0 {
            return Err(TutorError::Config(
                "gemini.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.user_message_quota == 0 {
            return Err(TutorError::Config(
                "session.user_message_quota must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.poll_interval_seconds == 0 {
            return Err(TutorError::Config(
                "session.poll_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.unlock_phrase.trim().is_empty() {
            return Err(
                TutorError::Config("session.unlock_phrase cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}
