//! Provider module
//!
//! This module contains the hosted-model service abstraction and the Gemini
//! implementation.

pub mod base;
pub mod gemini;

pub use base::{
    DocumentRef, FileService, FileState, GenerationRequest, GenerationService, ProviderError,
    ProviderResult, RemoteFile,
};
pub use gemini::GeminiProvider;
