//! Test utilities for the syllabus tutor
//!
//! Scripted in-memory stand-ins for the hosted generation and file
//! services, plus small helpers shared by unit tests.

use crate::config::{GeminiConfig, SessionConfig};
use crate::credentials::{Credential, CredentialPool};
use crate::providers::{
    FileService, FileState, GenerationRequest, GenerationService, ProviderError, ProviderResult,
    RemoteFile,
};
use crate::session::Orchestrator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Generation service that replays a fixed script of outcomes
///
/// Every call pops the next outcome and records the key and request it was
/// made with. Running past the end of the script yields an API error.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<ProviderResult<String>>>,
    keys_used: Mutex<Vec<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<ProviderResult<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            keys_used: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Keys in the order they were tried
    pub fn keys_used(&self) -> Vec<String> {
        self.keys_used.lock().unwrap().clone()
    }

    /// Requests in the order they were made
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> ProviderResult<String> {
        self.keys_used
            .lock()
            .unwrap()
            .push(credential.expose().to_string());
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Api {
                    status: 500,
                    message: "script exhausted".to_string(),
                })
            })
    }
}

/// A call observed by [`FakeFileService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCall {
    /// Upload with the given display name
    Upload(String),
    /// State poll of the given resource name
    Get(String),
    /// Release of the given resource name
    Delete(String),
}

#[derive(Default)]
struct FakeFiles {
    next_id: usize,
    upload_state: Option<FileState>,
    poll_states: VecDeque<FileState>,
    upload_error: Option<ProviderError>,
    get_error: Option<ProviderError>,
    delete_error: Option<ProviderError>,
    calls: Vec<FileCall>,
    uploaded_contents: Vec<Vec<u8>>,
    staged_paths: Vec<PathBuf>,
}

/// In-memory file service
///
/// Uploads get names `files/1`, `files/2`, ... and start in
/// `upload_state` (ACTIVE unless configured). Each poll pops the next state
/// from `poll_states`, falling back to ACTIVE.
#[derive(Default)]
pub struct FakeFileService {
    inner: Mutex<FakeFiles>,
}

impl FakeFileService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_state(self, state: FileState) -> Self {
        self.inner.lock().unwrap().upload_state = Some(state);
        self
    }

    pub fn with_poll_states(self, states: Vec<FileState>) -> Self {
        self.inner.lock().unwrap().poll_states = states.into();
        self
    }

    pub fn failing_upload(self, error: ProviderError) -> Self {
        self.inner.lock().unwrap().upload_error = Some(error);
        self
    }

    pub fn failing_get(self, error: ProviderError) -> Self {
        self.inner.lock().unwrap().get_error = Some(error);
        self
    }

    pub fn failing_delete(self, error: ProviderError) -> Self {
        self.inner.lock().unwrap().delete_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<FileCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Bytes read from the staged file of each upload
    pub fn uploaded_contents(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().uploaded_contents.clone()
    }

    /// Paths that were handed to `upload`
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().staged_paths.clone()
    }

    fn remote(name: &str, display_name: &str, state: FileState) -> RemoteFile {
        RemoteFile {
            name: name.to_string(),
            uri: format!("https://fake.example/v1beta/{}", name),
            mime_type: "application/pdf".to_string(),
            display_name: display_name.to_string(),
            state,
        }
    }
}

#[async_trait]
impl FileService for FakeFileService {
    async fn upload(
        &self,
        _credential: &Credential,
        path: &Path,
        display_name: &str,
        _mime_type: &str,
    ) -> ProviderResult<RemoteFile> {
        let contents = std::fs::read(path).map_err(|e| ProviderError::LocalFile(e.to_string()))?;
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(FileCall::Upload(display_name.to_string()));
        inner.staged_paths.push(path.to_path_buf());
        inner.uploaded_contents.push(contents);

        if let Some(error) = inner.upload_error.clone() {
            return Err(error);
        }

        inner.next_id += 1;
        let name = format!("files/{}", inner.next_id);
        let state = inner.upload_state.unwrap_or(FileState::Active);
        Ok(Self::remote(&name, display_name, state))
    }

    async fn get(&self, _credential: &Credential, name: &str) -> ProviderResult<RemoteFile> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(FileCall::Get(name.to_string()));
        if let Some(error) = inner.get_error.clone() {
            return Err(error);
        }
        let state = inner.poll_states.pop_front().unwrap_or(FileState::Active);
        Ok(Self::remote(name, "polled", state))
    }

    async fn delete(&self, _credential: &Credential, name: &str) -> ProviderResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(FileCall::Delete(name.to_string()));
        match inner.delete_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Session settings for tests: quota 3, no polling delay, no topic extraction
pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        user_message_quota: 3,
        poll_interval_seconds: 0,
        extract_topics_on_upload: false,
        ..Default::default()
    }
}

/// Orchestrator over the given fakes with a two-key pool
pub fn test_orchestrator(
    generator: &Arc<ScriptedGenerator>,
    files: &Arc<FakeFileService>,
    session: SessionConfig,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(CredentialPool::from_keys(["key-one", "key-two"])),
        generator.clone(),
        files.clone(),
        &GeminiConfig::default(),
        session,
    )
}
