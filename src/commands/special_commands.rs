//! Special commands parser for the interactive tutor
//!
//! Special commands let the student manage the session without sending a
//! question to the model:
//! - Upload or replace the syllabus
//! - Show the topic outline
//! - Select and remove preferences
//! - Clear the session, show status and help
//! - Exit
//!
//! Commands are prefixed with `/`. Command names are case-insensitive;
//! arguments keep their case so file paths survive.

use crate::preferences::Preference;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during an interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Upload a syllabus file, replacing the current one
    Upload(PathBuf),

    /// Show the outline of the current syllabus, extracting it if needed
    Topics,

    /// Select a preference
    Prefer(Preference),

    /// Deselect a preference
    Unprefer(Preference),

    /// List the catalog with the current selection marked
    ShowPreferences,

    /// Release the syllabus and clear the transcript
    Clear,

    /// Display document, quota and preference status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; the input is a question
    None,
}

fn required_arg<'a>(command: &str, arg: &'a str, usage: &str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(arg)
    }
}

fn preference_arg(command: &str, arg: &str) -> Result<Preference, CommandError> {
    let arg = required_arg(command, arg, &format!("{} <tag>", command))?;
    Preference::parse_str(arg).map_err(|_| CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    })
}

/// Parse a user input string into a special command
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for
/// anything that should be treated as a question.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use syllabus_tutor::commands::special_commands::{parse_special_command, SpecialCommand};
/// use syllabus_tutor::preferences::Preference;
///
/// let cmd = parse_special_command("/prefer visual").unwrap();
/// assert_eq!(cmd, SpecialCommand::Prefer(Preference::VisualExplanations));
///
/// let cmd = parse_special_command("What is a vector space?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/upload" | "/file" => {
            let path = required_arg("/upload", arg, "/upload <path>")?;
            Ok(SpecialCommand::Upload(PathBuf::from(path)))
        }

        "/topics" | "/outline" => no_arg("/topics", arg, SpecialCommand::Topics),

        "/prefer" => preference_arg("/prefer", arg).map(SpecialCommand::Prefer),
        "/unprefer" => preference_arg("/unprefer", arg).map(SpecialCommand::Unprefer),
        "/prefs" | "/preferences" => no_arg("/prefs", arg, SpecialCommand::ShowPreferences),

        "/clear" | "/reset" => no_arg("/clear", arg, SpecialCommand::Clear),
        "/status" => no_arg("/status", arg, SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "exit" | "quit" | "/exit" | "/quit" if arg.is_empty() => Ok(SpecialCommand::Exit),

        cmd if cmd.starts_with('/') => Err(CommandError::UnknownCommand(cmd.to_string())),

        _ => Ok(SpecialCommand::None),
    }
}

fn no_arg(
    command: &str,
    arg: &str,
    parsed: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    if arg.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        })
    }
}

/// Display help text for special commands
pub fn print_help() {
    let tags = Preference::ALL
        .iter()
        .map(|p| p.slug())
        .collect::<Vec<_>>()
        .join(", ");

    println!(
        r#"
Special Commands for the Syllabus Tutor
=======================================

SYLLABUS:
  /upload <path>    - Upload a syllabus (pdf, docx, txt, md, png, jpg, jpeg)
  /topics           - Show the topic outline of the current syllabus
  /clear            - Release the syllabus and clear the chat
  /reset            - Same as /clear

PREFERENCES (at most 3 active):
  /prefer <tag>     - Add a preference
  /unprefer <tag>   - Remove a preference
  /prefs            - Show all preferences and the active ones

  Tags: {}

SESSION:
  /status           - Show syllabus, message count and preferences
  /help             - Show this help message
  /?                - Same as /help
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Commands are case-insensitive
  - Any other text is a question about your syllabus
"#,
        tags
    );
}
