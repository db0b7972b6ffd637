//! Gemini API credential pool
//!
//! Keys are gathered once at startup from three sources, in this order:
//!
//! 1. process environment variables
//! 2. an optional local `.env` file
//! 3. an optional YAML secret store
//!
//! Each source may fill the slots in [`KEY_SLOTS`]. The merged list keeps
//! the first occurrence of every key, so the order above is also the order
//! in which the failover caller tries them. A missing or unreadable source
//! contributes nothing.

use crate::config::CredentialsConfig;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Slot names read from every credential source, in priority order
pub const KEY_SLOTS: [&str; 3] = ["GEMINI_API_KEY_1", "GEMINI_API_KEY_2", "GEMINI_API_KEY"];

/// An API key
///
/// `Debug` and `Display` only ever show a masked form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw key, trimming whitespace
    ///
    /// Returns `None` for blank values.
    ///
    /// # Examples
    ///
    /// ```
    /// use syllabus_tutor::credentials::Credential;
    ///
    /// assert!(Credential::new("  ").is_none());
    /// assert_eq!(Credential::new(" abc ").unwrap().expose(), "abc");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw key, for placing in a request header
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form safe for terminals and logs
    ///
    /// # Examples
    ///
    /// ```
    /// use syllabus_tutor::credentials::Credential;
    ///
    /// let key = Credential::new("AIzaSyExample1234567890").unwrap();
    /// assert_eq!(key.masked(), "AIza...7890");
    /// assert_eq!(Credential::new("short").unwrap().masked(), "****");
    /// ```
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Ordered, deduplicated set of API keys
///
/// Built once per process and shared read-only behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// Loads keys from the process environment and the configured files
    pub fn load(config: &CredentialsConfig) -> Self {
        Self::load_with(config, |name| std::env::var(name).ok())
    }

    /// Loads keys using `env` in place of the process environment
    ///
    /// # Arguments
    ///
    /// * `config` - Paths of the optional `.env` file and secret store
    /// * `env` - Lookup for environment variables
    pub fn load_with<F>(config: &CredentialsConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_file = read_env_file(&config.env_file);
        let secrets = read_secrets_file(&config.secrets_file);

        let mut raw = Vec::new();
        raw.extend(KEY_SLOTS.iter().filter_map(|slot| env(slot)));
        raw.extend(KEY_SLOTS.iter().filter_map(|slot| env_file.get(*slot).cloned()));
        raw.extend(KEY_SLOTS.iter().filter_map(|slot| secrets.get(*slot).cloned()));

        let pool = Self::from_keys(raw);
        tracing::info!("Loaded {} Gemini API key(s)", pool.len());
        pool
    }

    /// Builds a pool from raw keys, dropping blanks and duplicates
    ///
    /// # Examples
    ///
    /// ```
    /// use syllabus_tutor::credentials::CredentialPool;
    ///
    /// let pool = CredentialPool::from_keys(["k1", "", "k2", "k1"]);
    /// assert_eq!(pool.len(), 2);
    /// assert_eq!(pool.primary().unwrap().expose(), "k1");
    /// ```
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut credentials: Vec<Credential> = Vec::new();
        for credential in keys.into_iter().filter_map(Credential::new) {
            if !credentials.contains(&credential) {
                credentials.push(credential);
            }
        }
        Self { credentials }
    }

    /// Keys in failover order
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// First key; used for file operations
    pub fn primary(&self) -> Option<&Credential> {
        self.credentials.first()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        tracing::debug!("No env file at {}", path.display());
        return HashMap::new();
    }

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) => {
            tracing::warn!("Could not read env file {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let mut values = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(e) => {
                tracing::warn!("Skipping malformed line in {}: {}", path.display(), e);
            }
        }
    }
    values
}

fn read_secrets_file(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        tracing::debug!("No secret store at {}", path.display());
        return HashMap::new();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Could not read secret store {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&contents) {
        Ok(map) => map
            .into_iter()
            .filter_map(|(key, value)| value.as_str().map(|v| (key, v.to_string())))
            .collect(),
        Err(e) => {
            tracing::warn!("Could not parse secret store {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}
