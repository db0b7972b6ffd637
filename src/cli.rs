//! Command-line interface definition for the syllabus tutor
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, topic
//! extraction and inspection helpers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Syllabus Tutor - ask questions about your course syllabus
///
/// Upload a syllabus document to Gemini and chat with a tutor that answers
/// from it.
#[derive(Parser, Debug, Clone)]
#[command(name = "syllabus-tutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive tutoring session
    Chat {
        /// Syllabus to upload before the first question
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Preference tag to enable (repeatable, at most 3)
        #[arg(short, long = "prefer")]
        prefer: Vec<String>,
    },

    /// Upload a syllabus, ask one question and print the answer
    Ask {
        /// Syllabus file
        #[arg(short, long)]
        file: PathBuf,

        /// Question to ask
        #[arg(short, long)]
        prompt: String,

        /// Preference tag to enable (repeatable, at most 3)
        #[arg(long = "prefer")]
        prefer: Vec<String>,
    },

    /// Upload a syllabus and print its topic outline
    Topics {
        /// Syllabus file
        #[arg(short, long)]
        file: PathBuf,

        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how many API keys were loaded
    Keys,

    /// List the available preference tags
    Preferences,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Chat {
                file: None,
                prefer: Vec::new(),
            },
        }
    }
}
