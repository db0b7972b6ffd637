/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`: Interactive tutoring session
- `ask`: Upload a syllabus and answer one question
- `topics`: Upload a syllabus and print its outline
- `keys`: Report the loaded API keys (masked)
- `preferences`: List the preference catalog

Every handler builds an [`Orchestrator`] over the shared credential pool and
drives a fresh [`SessionState`].
*/

use crate::config::{Config, SessionConfig};
use crate::credentials::CredentialPool;
use crate::error::{Result, TutorError};
use crate::preferences::{Preference, PreferenceSelection, MAX_PREFERENCES};
use crate::providers::GeminiProvider;
use crate::session::{IndexedDocument, Orchestrator, SessionState};
use colored::Colorize;
use prettytable::{row, Table};
use std::path::Path;
use std::sync::Arc;

// Special commands parser for the interactive session
pub mod special_commands;

/// Builds an orchestrator backed by the Gemini client
///
/// # Arguments
///
/// * `config` - Global configuration (model selection and timeouts)
/// * `pool` - Shared credential pool
/// * `session` - Session settings for this command
pub fn build_orchestrator(
    config: &Config,
    pool: Arc<CredentialPool>,
    session: SessionConfig,
) -> Result<Orchestrator> {
    let gemini = Arc::new(GeminiProvider::new(&config.gemini)?);
    Ok(Orchestrator::new(
        pool,
        gemini.clone(),
        gemini,
        &config.gemini,
        session,
    ))
}

/// Parses `--prefer` tags into a selection
///
/// # Errors
///
/// Returns an error for unknown tags or more than three distinct tags.
pub fn parse_preferences(tags: &[String]) -> Result<PreferenceSelection> {
    let preferences = tags
        .iter()
        .map(|tag| Preference::parse_str(tag))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(PreferenceSelection::from_preferences(preferences)?)
}

/// Reads a syllabus file and returns its bytes with the display name
pub fn read_syllabus(path: &Path) -> Result<(Vec<u8>, String)> {
    let display_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TutorError::Config(format!("Not a file path: {}", path.display()))
        })?;
    let bytes = std::fs::read(path)?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok((bytes, display_name))
}

/// Reads and indexes a syllabus, printing progress
async fn upload_syllabus(
    orchestrator: &Orchestrator,
    state: &mut SessionState,
    path: &Path,
) -> Result<IndexedDocument> {
    let (bytes, display_name) = read_syllabus(path)?;
    println!(
        "{}",
        format!("Uploading and indexing {}...", display_name).cyan()
    );
    let document = orchestrator
        .index_document(state, &bytes, &display_name)
        .await?;
    println!(
        "{}",
        format!("Syllabus '{}' indexed. Ask away!", document.display_name).green()
    );
    Ok(document)
}

/// Builds the catalog table with the active selection marked
fn preferences_table(selection: &PreferenceSelection) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Active", "Tag", "Label", "Instruction"]);
    for preference in Preference::ALL {
        let active = if selection.contains(preference) { "*" } else { "" };
        table.add_row(row![
            active,
            preference.slug(),
            preference.label(),
            preference.instruction()
        ]);
    }
    table
}

// Interactive session handler
pub mod chat {
    //! Interactive tutoring session.
    //!
    //! Runs a readline loop: special commands manage the session, any other
    //! line is a question about the current syllabus.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::session::Reply;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::PathBuf;

    /// Start an interactive tutoring session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `pool` - Shared credential pool
    /// * `file` - Optional syllabus to upload before the first prompt
    /// * `prefer` - Preference tags enabled at start
    pub async fn run_chat(
        config: Config,
        pool: Arc<CredentialPool>,
        file: Option<PathBuf>,
        prefer: Vec<String>,
    ) -> Result<()> {
        tracing::info!("Starting interactive tutoring session");

        let preferences = parse_preferences(&prefer)?;
        let orchestrator = build_orchestrator(&config, pool, config.session.clone())?;
        let mut state = SessionState::with_preferences(preferences);

        if orchestrator.pool().is_empty() {
            eprintln!(
                "{}",
                "No API keys configured. Set GEMINI_API_KEY_1, GEMINI_API_KEY_2 or GEMINI_API_KEY."
                    .yellow()
            );
        }

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(&orchestrator, &state);

        if let Some(path) = file {
            upload_and_report(&orchestrator, &mut state, &path).await;
        }

        run_session(&orchestrator, &mut state, &mut rl).await;
        println!("Goodbye!");
        Ok(())
    }

    /// Source of input lines for the interactive loop
    pub trait LineSource {
        /// Reads the next line, showing `prompt`
        fn read_line(&mut self, prompt: &str) -> rustyline::Result<String>;

        /// Adds a line to the input history
        fn remember(&mut self, line: &str) -> rustyline::Result<()>;
    }

    impl LineSource for DefaultEditor {
        fn read_line(&mut self, prompt: &str) -> rustyline::Result<String> {
            self.readline(prompt)
        }

        fn remember(&mut self, line: &str) -> rustyline::Result<()> {
            self.add_history_entry(line).map(|_| ())
        }
    }

    /// Runs the read loop until exit, then releases the session's document
    pub async fn run_session(
        orchestrator: &Orchestrator,
        state: &mut SessionState,
        input: &mut impl LineSource,
    ) {
        loop {
            match input.read_line(&format_prompt(orchestrator, state)) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Err(e) = input.remember(trimmed) {
                        tracing::warn!("Failed to record input history: {}", e);
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Upload(path) => {
                            upload_and_report(orchestrator, state, &path).await;
                        }
                        SpecialCommand::Topics => {
                            show_topics(orchestrator, state).await;
                        }
                        SpecialCommand::Prefer(preference) => {
                            match state.preferences_mut().add(preference) {
                                Ok(()) => println!(
                                    "{}\n",
                                    format!("Enabled: {}", preference.label()).green()
                                ),
                                Err(e) => eprintln!("{}\n", e.to_string().yellow()),
                            }
                        }
                        SpecialCommand::Unprefer(preference) => {
                            if state.preferences_mut().remove(preference) {
                                println!(
                                    "{}\n",
                                    format!("Disabled: {}", preference.label()).green()
                                );
                            } else {
                                println!("{} was not enabled\n", preference.label());
                            }
                        }
                        SpecialCommand::ShowPreferences => {
                            preferences_table(state.preferences()).printstd();
                            println!(
                                "{}/{} preferences active\n",
                                state.preferences().len(),
                                MAX_PREFERENCES
                            );
                        }
                        SpecialCommand::Clear => {
                            orchestrator.clear(state).await;
                            println!("{}\n", "Syllabus and chat cleared.".green());
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(orchestrator, state);
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            ask_and_report(orchestrator, state, trimmed).await;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        orchestrator.clear(state).await;
    }

    async fn upload_and_report(orchestrator: &Orchestrator, state: &mut SessionState, path: &Path) {
        match upload_syllabus(orchestrator, state, path).await {
            Ok(_) => {
                if let Some(outline) = state.outline() {
                    if !outline.is_empty() {
                        println!("\nTopics found in your syllabus:\n{}", outline);
                    }
                }
                println!();
            }
            Err(e) => eprintln!("{}\n", format!("Upload failed: {}", e).red()),
        }
    }

    async fn show_topics(orchestrator: &Orchestrator, state: &mut SessionState) {
        let outline = match state.outline() {
            Some(outline) => Some(outline.clone()),
            None => match orchestrator.refresh_topics(state).await {
                Ok(outline) => outline,
                Err(e) => {
                    eprintln!("{}\n", e.to_string().yellow());
                    return;
                }
            },
        };

        match outline {
            Some(outline) if !outline.is_empty() => println!("\n{}", outline),
            _ => println!("{}\n", "No topics could be extracted from this syllabus.".yellow()),
        }
    }

    async fn ask_and_report(orchestrator: &Orchestrator, state: &mut SessionState, prompt: &str) {
        if state.document().is_some() {
            println!("{}", "Thinking...".dimmed());
        }
        match orchestrator.ask(state, prompt).await {
            Ok(reply @ Reply::Unlocked) => println!("{}\n", reply.text().green()),
            Ok(Reply::Answer(text)) => println!("\n{}\n", text),
            Ok(Reply::Failed(e)) => eprintln!("{}\n", e.to_string().red()),
            Err(e) => eprintln!("{}\n", e.to_string().yellow()),
        }
    }

    fn format_prompt(orchestrator: &Orchestrator, state: &SessionState) -> String {
        let tag = match orchestrator.remaining_messages(state) {
            None => "[unlimited]".green().to_string(),
            Some(0) => "[limit reached]".red().to_string(),
            Some(left) => format!("[{} left]", left).cyan().to_string(),
        };
        let document = match state.document() {
            Some(document) => document.display_name.clone(),
            None => "no syllabus".to_string(),
        };
        format!("{} {} >> ", tag, document.bold())
    }

    fn print_welcome_banner(orchestrator: &Orchestrator, state: &SessionState) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            Syllabus Tutor Interactive Mode - Welcome!        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("API keys:     {}", orchestrator.pool().len());
        println!(
            "Message limit: {} questions per syllabus",
            orchestrator.config().user_message_quota
        );
        if !state.preferences().is_empty() {
            let labels = state
                .preferences()
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(", ");
            println!("Preferences:  {}", labels);
        }
        println!("\nUpload a syllabus with '/upload <path>'. Type '/help' for commands, 'exit' to quit\n");
    }

    /// Display session status
    ///
    /// Shows the live syllabus, question count, preferences and outline size.
    fn print_status_display(orchestrator: &Orchestrator, state: &SessionState) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Syllabus Tutor Session Status               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session:       {}", state.id());
        match state.document() {
            Some(document) => println!(
                "Syllabus:      {} ({})",
                document.display_name.bold(),
                document.name
            ),
            None => println!("Syllabus:      {}", "none".yellow()),
        }
        match orchestrator.remaining_messages(state) {
            None => println!(
                "Questions:     {} (unlimited)",
                state.user_message_count()
            ),
            Some(_) => println!(
                "Questions:     {}/{}",
                state.user_message_count(),
                orchestrator.config().user_message_quota
            ),
        }
        println!(
            "Preferences:   {}/{}",
            state.preferences().len(),
            MAX_PREFERENCES
        );
        for preference in state.preferences().iter() {
            println!("  - {}", preference.label());
        }
        match state.outline() {
            Some(outline) => println!("Topics:        {}", outline.len()),
            None => println!("Topics:        not extracted"),
        }
        println!();
    }
}

// One-shot question handler
pub mod ask {
    //! Upload, ask one question, release.

    use super::*;
    use crate::session::Reply;
    use std::path::PathBuf;

    /// Answer a single question about a syllabus
    ///
    /// The syllabus is released before returning, whether or not the
    /// question was answered.
    pub async fn run_ask(
        config: Config,
        pool: Arc<CredentialPool>,
        file: PathBuf,
        prompt: String,
        prefer: Vec<String>,
    ) -> Result<()> {
        let preferences = parse_preferences(&prefer)?;
        let session = SessionConfig {
            extract_topics_on_upload: false,
            ..config.session.clone()
        };
        let orchestrator = build_orchestrator(&config, pool, session)?;
        let mut state = SessionState::with_preferences(preferences);

        upload_syllabus(&orchestrator, &mut state, &file).await?;
        let outcome = orchestrator.ask(&mut state, &prompt).await;
        orchestrator.clear(&mut state).await;

        match outcome? {
            Reply::Failed(e) => Err(e.into()),
            reply => {
                println!("\n{}", reply.text());
                Ok(())
            }
        }
    }
}

// Topic outline handler
pub mod topics {
    //! Upload, extract the outline, release.

    use super::*;
    use std::path::PathBuf;

    /// Print the topic outline of a syllabus
    ///
    /// # Arguments
    ///
    /// * `json` - Print `{"topics": [...]}` instead of a numbered list
    pub async fn run_topics(
        config: Config,
        pool: Arc<CredentialPool>,
        file: PathBuf,
        json: bool,
    ) -> Result<()> {
        let session = SessionConfig {
            extract_topics_on_upload: false,
            ..config.session.clone()
        };
        let orchestrator = build_orchestrator(&config, pool, session)?;
        let mut state = SessionState::new();

        let (bytes, display_name) = read_syllabus(&file)?;
        orchestrator
            .index_document(&mut state, &bytes, &display_name)
            .await?;
        let outline = orchestrator.refresh_topics(&mut state).await;
        orchestrator.clear(&mut state).await;
        let outline = outline?;

        if json {
            let outline = outline.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&outline)?);
            return Ok(());
        }

        match outline {
            Some(outline) if !outline.is_empty() => print!("{}", outline),
            _ => println!("No topics could be extracted from {}", display_name),
        }
        Ok(())
    }
}

// Credential report handler
pub mod keys {
    //! Masked report of the loaded API keys.

    use super::*;
    use crate::credentials::KEY_SLOTS;

    /// Print how many keys were loaded, masked, in try order
    pub fn show_keys(config: &Config, pool: &CredentialPool) {
        if pool.is_empty() {
            println!("{}", "No API keys configured.".yellow());
            println!(
                "Set {} in the environment, {} or {}",
                KEY_SLOTS.join(", "),
                config.credentials.env_file.display(),
                config.credentials.secrets_file.display()
            );
            return;
        }

        let mut table = Table::new();
        table.add_row(row!["Order", "Key"]);
        for (index, credential) in pool.credentials().iter().enumerate() {
            table.add_row(row![index + 1, credential.masked()]);
        }

        println!("\nLoaded {} API key(s):\n", pool.len());
        table.printstd();
        println!();
    }
}

// Preference catalog handler
pub mod preferences {
    //! Preference catalog listing.

    use super::*;

    /// Print the preference catalog
    pub fn list_preferences() {
        println!(
            "\nAvailable preferences (at most {} at once):\n",
            MAX_PREFERENCES
        );
        preferences_table(&PreferenceSelection::new()).printstd();
        println!();
    }
}
