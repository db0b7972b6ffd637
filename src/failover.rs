//! Credential failover for generation calls
//!
//! A call walks the credential pool in order, one attempt per key. Only a
//! quota-exceeded response moves on to the next key; every other outcome
//! ends the call. Each call starts again from the first key.

use crate::credentials::CredentialPool;
use crate::error::GenerationError;
use crate::providers::{GenerationRequest, GenerationService};
use std::sync::Arc;

/// Generation front-end that rotates credentials on quota errors
#[derive(Clone)]
pub struct FailoverCaller {
    pool: Arc<CredentialPool>,
    service: Arc<dyn GenerationService>,
}

impl FailoverCaller {
    /// Creates a caller over a shared pool and generation service
    pub fn new(pool: Arc<CredentialPool>, service: Arc<dyn GenerationService>) -> Self {
        Self { pool, service }
    }

    /// Number of keys available for rotation
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Generates text, rotating keys on quota errors
    ///
    /// # Returns
    ///
    /// The trimmed, non-empty response text
    ///
    /// # Errors
    ///
    /// - [`GenerationError::NoCredentials`] when the pool is empty
    /// - [`GenerationError::EmptyResponse`] when a key answers with blank text
    /// - [`GenerationError::Unexpected`] on the first non-quota failure
    /// - [`GenerationError::AllRateLimited`] when every key hit its quota
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use syllabus_tutor::config::GeminiConfig;
    /// use syllabus_tutor::providers::{GeminiProvider, GenerationRequest};
    /// use syllabus_tutor::{CredentialPool, FailoverCaller, GenerationError};
    ///
    /// # tokio_test::block_on(async {
    /// let provider = GeminiProvider::new(&GeminiConfig::default()).unwrap();
    /// let pool = CredentialPool::from_keys(Vec::<String>::new());
    /// let caller = FailoverCaller::new(Arc::new(pool), Arc::new(provider));
    ///
    /// let request = GenerationRequest::new("gemini-2.0-flash-lite", "Explain limits");
    /// let result = caller.generate(&request).await;
    /// assert_eq!(result, Err(GenerationError::NoCredentials));
    /// # });
    /// ```
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        if self.pool.is_empty() {
            tracing::warn!("Generation requested with no API keys configured");
            return Err(GenerationError::NoCredentials);
        }

        let total = self.pool.len();
        for (index, credential) in self.pool.credentials().iter().enumerate() {
            tracing::debug!(
                "Generation attempt {}/{} with key {}",
                index + 1,
                total,
                credential
            );

            match self.service.generate(credential, request).await {
                Ok(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        tracing::warn!("Model {} returned an empty response", request.model);
                        return Err(GenerationError::EmptyResponse);
                    }
                    return Ok(trimmed.to_string());
                }
                Err(e) if e.is_quota_exceeded() => {
                    tracing::warn!(
                        "Key {}/{} is rate-limited, trying next key: {}",
                        index + 1,
                        total,
                        e
                    );
                    continue;
                }
                Err(e) => {
                    tracing::error!("Generation failed: {}", e);
                    return Err(GenerationError::Unexpected(e.to_string()));
                }
            }
        }

        tracing::warn!("All {} API key(s) are rate-limited", total);
        Err(GenerationError::AllRateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::test_utils::ScriptedGenerator;

    fn caller(keys: &[&str], generator: &Arc<ScriptedGenerator>) -> FailoverCaller {
        FailoverCaller::new(
            Arc::new(CredentialPool::from_keys(keys.iter().copied())),
            generator.clone(),
        )
    }

    fn quota() -> ProviderError {
        ProviderError::QuotaExceeded("429".to_string())
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("gemini-test", "Explain matrices")
    }

    #[tokio::test]
    async fn test_empty_pool_makes_no_attempt() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("unused".to_string())]));
        let result = caller(&[], &generator).generate(&request()).await;
        assert_eq!(result, Err(GenerationError::NoCredentials));
        assert!(generator.keys_used().is_empty());
    }

    #[tokio::test]
    async fn test_first_key_success_is_trimmed() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("  answer \n".to_string())]));
        let result = caller(&["k1", "k2"], &generator).generate(&request()).await;
        assert_eq!(result, Ok("answer".to_string()));
        assert_eq!(generator.keys_used(), vec!["k1"]);
    }

    #[tokio::test]
    async fn test_all_keys_rate_limited() {
        for size in 1..=4 {
            let keys: Vec<String> = (0..size).map(|i| format!("key-{}", i)).collect();
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let generator = Arc::new(ScriptedGenerator::new(
                (0..size).map(|_| Err(quota())).collect(),
            ));
            let result = caller(&key_refs, &generator).generate(&request()).await;
            assert_eq!(result, Err(GenerationError::AllRateLimited));
            assert_eq!(generator.keys_used(), key_refs);
        }
    }

    #[tokio::test]
    async fn test_rotation_stops_at_first_success() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(quota()),
            Ok("from second".to_string()),
            Ok("never".to_string()),
        ]));
        let result = caller(&["k1", "k2", "k3"], &generator)
            .generate(&request())
            .await;
        assert_eq!(result, Ok("from second".to_string()));
        assert_eq!(generator.keys_used(), vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn test_non_quota_error_is_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(ProviderError::Api {
                status: 500,
                message: "internal".to_string(),
            }),
            Ok("would have worked".to_string()),
        ]));
        let result = caller(&["k1", "k2"], &generator).generate(&request()).await;
        assert!(matches!(result, Err(GenerationError::Unexpected(ref m)) if m.contains("internal")));
        assert_eq!(generator.keys_used(), vec!["k1"]);
    }

    #[tokio::test]
    async fn test_whitespace_response_is_empty_and_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(" \n\t ".to_string()),
            Ok("second".to_string()),
        ]));
        let result = caller(&["k1", "k2"], &generator).generate(&request()).await;
        assert_eq!(result, Err(GenerationError::EmptyResponse));
        assert_eq!(generator.keys_used(), vec!["k1"]);
    }

    #[tokio::test]
    async fn test_each_call_restarts_from_first_key() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(quota()),
            Ok("one".to_string()),
            Ok("two".to_string()),
        ]));
        let caller = caller(&["k1", "k2"], &generator);
        assert_eq!(caller.generate(&request()).await, Ok("one".to_string()));
        assert_eq!(caller.generate(&request()).await, Ok("two".to_string()));
        assert_eq!(generator.keys_used(), vec!["k1", "k2", "k1"]);
    }
}
