//! Chat session state and orchestration
//!
//! - `state`: transcript, live document, outline, preferences, unlock flag
//! - `documents`: MIME detection and temporary staging of uploaded bytes
//! - `orchestrator`: upload/index, topics, chat turns and clearing

pub mod documents;
pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, Reply};
pub use state::{IndexedDocument, Message, Role, SessionState};
