use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use syllabus_tutor::config::{Config, GeminiConfig};

/// Gemini settings pointing at a mock server
#[allow(dead_code)]
pub fn gemini_config(api_base: &str) -> GeminiConfig {
    GeminiConfig {
        api_base: api_base.to_string(),
        request_timeout_seconds: 5,
        ..Default::default()
    }
}

/// Full configuration pointing at a mock server with no polling delay
#[allow(dead_code)]
pub fn mock_config(api_base: &str) -> Config {
    let mut config = Config::default();
    config.gemini = gemini_config(api_base);
    config.session.poll_interval_seconds = 0;
    config.session.extract_topics_on_upload = false;
    config
}

/// generateContent success body with a single text part
#[allow(dead_code)]
pub fn answer_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Google error envelope with RESOURCE_EXHAUSTED status
#[allow(dead_code)]
pub fn quota_body() -> Value {
    json!({
        "error": {
            "code": 429,
            "message": "Resource has been exhausted (e.g. check quota).",
            "status": "RESOURCE_EXHAUSTED"
        }
    })
}

/// File resource as returned by the Files API
#[allow(dead_code)]
pub fn file_body(id: &str, state: &str) -> Value {
    json!({
        "name": format!("files/{}", id),
        "displayName": "syllabus.pdf",
        "mimeType": "application/pdf",
        "uri": format!("https://generativelanguage.googleapis.com/v1beta/files/{}", id),
        "state": state
    })
}

#[allow(dead_code)]
pub fn temp_file(name: &str, contents: &[u8]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let path = temp_dir.path().join(name);
    fs::write(&path, contents).expect("failed to write temp file");
    (temp_dir, path)
}
