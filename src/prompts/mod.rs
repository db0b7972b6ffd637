//! System prompts and instruction texts
//!
//! - `tutor_prompt`: base tutoring instruction plus preference rendering
//! - `topics_prompt`: topic extraction instruction and output contract

pub mod topics_prompt;
pub mod tutor_prompt;

pub use topics_prompt::TOPIC_EXTRACTION_PROMPT;
pub use tutor_prompt::{build_tutor_instruction, BASE_TUTOR_PROMPT};
