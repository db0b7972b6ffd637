//! Syllabus Tutor - chat tutor grounded in an uploaded syllabus
//!
//! This library uploads a syllabus to the Gemini file service and answers
//! questions about it, rotating across several API keys when one runs out of
//! quota.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `credentials`: API key pool loaded from the environment, `.env` and a secrets file
//! - `failover`: Generation calls that rotate keys on quota errors
//! - `providers`: Hosted service abstraction and the Gemini REST client
//! - `session`: Session state and the upload / ask / clear orchestrator
//! - `topics`: Best-effort topic outline extraction
//! - `preferences`: Student preference catalog
//! - `prompts`: System prompts
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use syllabus_tutor::{Config, CredentialPool};
//! use syllabus_tutor::commands::build_orchestrator;
//! use syllabus_tutor::session::SessionState;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let pool = Arc::new(CredentialPool::load(&config.credentials));
//!     let orchestrator = build_orchestrator(&config, pool, config.session.clone())?;
//!     let mut state = SessionState::new();
//!
//!     let bytes = std::fs::read("syllabus.pdf")?;
//!     orchestrator.index_document(&mut state, &bytes, "syllabus.pdf").await?;
//!     let reply = orchestrator.ask(&mut state, "Explain eigenvalues").await?;
//!     println!("{}", reply.text());
//!     orchestrator.clear(&mut state).await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod failover;
pub mod preferences;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod topics;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credential, CredentialPool};
pub use error::{GenerationError, Result, TutorError};
pub use failover::FailoverCaller;
pub use session::{Orchestrator, Reply, SessionState};

#[cfg(test)]
pub mod test_utils;
