//! Session orchestrator
//!
//! Sequences the user-triggered actions of one chat session: indexing a
//! syllabus, extracting its outline, answering questions and clearing.
//! All session data lives in the [`SessionState`] passed to each call.

use super::documents::{mime_type_for, stage_bytes};
use super::state::{IndexedDocument, Message, SessionState};
use crate::config::{GeminiConfig, SessionConfig};
use crate::credentials::{Credential, CredentialPool};
use crate::error::{GenerationError, TutorError};
use crate::failover::FailoverCaller;
use crate::prompts::build_tutor_instruction;
use crate::providers::{FileService, FileState, GenerationRequest, GenerationService, RemoteFile};
use crate::topics::{self, TopicOutline};
use std::sync::Arc;

/// Assistant-side result of a chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The unlock phrase was entered; nothing was sent or recorded
    Unlocked,
    /// Model answer, already recorded in history
    Answer(String),
    /// Generation failed; the error text was recorded in history
    Failed(GenerationError),
}

impl Reply {
    /// Text shown to the student
    pub fn text(&self) -> String {
        match self {
            Self::Unlocked => {
                "Unlocked. The message limit no longer applies to this session.".to_string()
            }
            Self::Answer(text) => text.clone(),
            Self::Failed(error) => error.to_string(),
        }
    }
}

/// Drives one or more [`SessionState`] values against the hosted services
pub struct Orchestrator {
    caller: FailoverCaller,
    files: Arc<dyn FileService>,
    pool: Arc<CredentialPool>,
    config: SessionConfig,
    chat_model: String,
    topics_model: String,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `pool` - Shared credential pool
    /// * `generator` - Hosted generation service
    /// * `files` - Hosted file service
    /// * `gemini` - Model selection
    /// * `config` - Quota, unlock phrase and polling settings
    pub fn new(
        pool: Arc<CredentialPool>,
        generator: Arc<dyn GenerationService>,
        files: Arc<dyn FileService>,
        gemini: &GeminiConfig,
        config: SessionConfig,
    ) -> Self {
        Self {
            caller: FailoverCaller::new(Arc::clone(&pool), generator),
            files,
            pool,
            config,
            chat_model: gemini.chat_model.clone(),
            topics_model: gemini.topics_model.clone(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Questions left before the quota applies, or `None` when unlocked
    pub fn remaining_messages(&self, state: &SessionState) -> Option<usize> {
        if state.is_unlocked() {
            return None;
        }
        Some(
            self.config
                .user_message_quota
                .saturating_sub(state.user_message_count()),
        )
    }

    /// Uploads a syllabus and makes it the live document
    ///
    /// Any previously live document is released first. On failure no
    /// document is live and the remote handle, if one was created, has been
    /// released.
    ///
    /// # Errors
    ///
    /// - [`TutorError::UnsupportedFileType`] before anything is uploaded
    /// - [`TutorError::MissingCredentials`] when the pool is empty
    /// - [`TutorError::Provider`] when the upload or a state poll fails
    /// - [`TutorError::IndexingFailed`] when processing ends in a non-ACTIVE state
    pub async fn index_document(
        &self,
        state: &mut SessionState,
        bytes: &[u8],
        display_name: &str,
    ) -> Result<IndexedDocument, TutorError> {
        self.release_document(state).await;

        let mime_type = mime_type_for(display_name)?;
        let credential = self.file_credential()?;

        tracing::info!(
            session = %state.id(),
            "Uploading {} ({}, {} bytes)",
            display_name,
            mime_type,
            bytes.len()
        );

        let staged = stage_bytes(bytes, display_name)?;
        let uploaded = self
            .files
            .upload(credential, staged.path(), display_name, mime_type)
            .await;
        drop(staged);

        let uploaded = uploaded.map_err(|e| {
            tracing::error!("Upload of {} failed: {}", display_name, e);
            TutorError::Provider(e.to_string())
        })?;

        let settled = match self.poll_until_settled(credential, uploaded).await {
            Ok(file) => file,
            Err((name, error)) => {
                self.discard_remote(credential, &name).await;
                return Err(error);
            }
        };

        if settled.state != FileState::Active {
            tracing::error!("File {} finished in state {}", settled.name, settled.state);
            self.discard_remote(credential, &settled.name).await;
            return Err(TutorError::IndexingFailed(settled.state.to_string()));
        }

        let mut document = IndexedDocument::from(settled);
        if document.display_name.is_empty() {
            document.display_name = display_name.to_string();
        }
        tracing::info!(session = %state.id(), "Indexed {} as {}", display_name, document.name);
        state.attach_document(document.clone());

        if self.config.extract_topics_on_upload {
            let outline = self.extract_topics(&document).await;
            state.set_outline(outline);
        }

        Ok(document)
    }

    /// Best-effort outline of an indexed document
    pub async fn extract_topics(&self, document: &IndexedDocument) -> Option<TopicOutline> {
        let outline =
            topics::extract_topics(&self.caller, &self.topics_model, document.document_ref())
                .await;
        match &outline {
            Some(outline) => tracing::debug!("Extracted {} topic(s)", outline.len()),
            None => tracing::debug!("No outline for {}", document.name),
        }
        outline
    }

    /// Re-runs topic extraction for the live document and stores the result
    pub async fn refresh_topics(
        &self,
        state: &mut SessionState,
    ) -> Result<Option<TopicOutline>, TutorError> {
        let document = state.document().cloned().ok_or(TutorError::NoDocument)?;
        let outline = self.extract_topics(&document).await;
        state.set_outline(outline.clone());
        Ok(outline)
    }

    /// Handles one chat turn
    ///
    /// The unlock phrase is checked first and is never recorded. Otherwise
    /// the quota and the live document are enforced before anything is
    /// sent. Generation failures do not surface as `Err`: they are recorded
    /// in history and returned as [`Reply::Failed`].
    ///
    /// # Errors
    ///
    /// - [`TutorError::QuotaExceeded`] when the quota is used up and the session is locked
    /// - [`TutorError::NoDocument`] when no syllabus is live
    pub async fn ask(&self, state: &mut SessionState, prompt: &str) -> Result<Reply, TutorError> {
        if self.is_unlock_phrase(prompt) {
            tracing::info!(session = %state.id(), "Message limit lifted");
            state.unlock();
            return Ok(Reply::Unlocked);
        }

        if !state.is_unlocked() && state.user_message_count() >= self.config.user_message_quota {
            tracing::debug!(session = %state.id(), "Rejecting message over quota");
            return Err(TutorError::QuotaExceeded {
                limit: self.config.user_message_quota,
            });
        }

        let document = state.document().ok_or(TutorError::NoDocument)?;
        let request = GenerationRequest::new(&self.chat_model, prompt)
            .with_document(document.document_ref())
            .with_system_instruction(build_tutor_instruction(state.preferences()));

        let reply = match self.caller.generate(&request).await {
            Ok(text) => Reply::Answer(text),
            Err(error) => Reply::Failed(error),
        };

        state.push(Message::user(prompt));
        state.push(Message::assistant(reply.text()));
        Ok(reply)
    }

    /// Releases the live document and clears the transcript
    ///
    /// Preferences and the unlock flag are kept.
    pub async fn clear(&self, state: &mut SessionState) {
        self.release_document(state).await;
        tracing::info!(session = %state.id(), "Session cleared");
    }

    fn is_unlock_phrase(&self, prompt: &str) -> bool {
        prompt
            .trim()
            .eq_ignore_ascii_case(self.config.unlock_phrase.trim())
    }

    fn file_credential(&self) -> Result<&Credential, TutorError> {
        self.pool.primary().ok_or_else(|| {
            TutorError::MissingCredentials("no API key available for file upload".to_string())
        })
    }

    /// Polls while the file is processing
    ///
    /// On a poll error returns the resource name together with the error so
    /// the caller can release the handle.
    async fn poll_until_settled(
        &self,
        credential: &Credential,
        mut file: RemoteFile,
    ) -> Result<RemoteFile, (String, TutorError)> {
        while file.state == FileState::Processing {
            tracing::debug!("{} is processing, polling again", file.name);
            tokio::time::sleep(self.config.poll_interval()).await;

            let name = file.name.clone();
            file = self
                .files
                .get(credential, &name)
                .await
                .map_err(|e| (name, TutorError::Provider(e.to_string())))?;
        }
        Ok(file)
    }

    async fn release_document(&self, state: &mut SessionState) {
        if let Some(document) = state.take_document() {
            match self.pool.primary() {
                Some(credential) => self.discard_remote(credential, &document.name).await,
                None => tracing::warn!("Cannot release {}: no API key", document.name),
            }
        }
    }

    async fn discard_remote(&self, credential: &Credential, name: &str) {
        match self.files.delete(credential, name).await {
            Ok(()) => tracing::debug!("Released {}", name),
            Err(e) => tracing::warn!("Failed to release {}: {}", name, e),
        }
    }
}
