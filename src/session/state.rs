//! Per-session conversation state
//!
//! One [`SessionState`] value holds everything a single student's session
//! mutates: the transcript, the live syllabus, its outline, the selected
//! preferences and the unlock flag. The orchestrator takes it by `&mut`, so
//! one action completes before the next can start.

use crate::preferences::PreferenceSelection;
use crate::providers::{DocumentRef, RemoteFile};
use crate::topics::TopicOutline;
use std::fmt;
use uuid::Uuid;

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A syllabus that finished processing and can be referenced by questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    /// Resource name used to poll and release the file
    pub name: String,
    /// URI placed in generation requests
    pub uri: String,
    pub mime_type: String,
    /// Original file name shown to the student
    pub display_name: String,
}

impl IndexedDocument {
    /// Reference for a generation request
    pub fn document_ref(&self) -> DocumentRef {
        DocumentRef {
            uri: self.uri.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

impl From<RemoteFile> for IndexedDocument {
    fn from(file: RemoteFile) -> Self {
        Self {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
            display_name: file.display_name,
        }
    }
}

/// Mutable state of one chat session
#[derive(Debug, Clone)]
pub struct SessionState {
    id: Uuid,
    history: Vec<Message>,
    document: Option<IndexedDocument>,
    outline: Option<TopicOutline>,
    preferences: PreferenceSelection,
    unlocked: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            document: None,
            outline: None,
            preferences: PreferenceSelection::new(),
            unlocked: false,
        }
    }

    /// Starts a session with preferences already selected
    pub fn with_preferences(preferences: PreferenceSelection) -> Self {
        Self {
            preferences,
            ..Self::new()
        }
    }

    /// Identifier used in log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn document(&self) -> Option<&IndexedDocument> {
        self.document.as_ref()
    }

    pub fn outline(&self) -> Option<&TopicOutline> {
        self.outline.as_ref()
    }

    pub fn preferences(&self) -> &PreferenceSelection {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut PreferenceSelection {
        &mut self.preferences
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Number of questions asked against the current document
    pub fn user_message_count(&self) -> usize {
        self.history.iter().filter(|m| m.role == Role::User).count()
    }

    pub(crate) fn unlock(&mut self) {
        self.unlocked = true;
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Makes `document` the live syllabus with a fresh transcript
    pub(crate) fn attach_document(&mut self, document: IndexedDocument) {
        self.document = Some(document);
        self.history.clear();
        self.outline = None;
    }

    pub(crate) fn set_outline(&mut self, outline: Option<TopicOutline>) {
        self.outline = outline;
    }

    /// Detaches the live syllabus along with everything derived from it
    pub(crate) fn take_document(&mut self) -> Option<IndexedDocument> {
        self.history.clear();
        self.outline = None;
        self.document.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FileState;

    fn document(name: &str) -> IndexedDocument {
        IndexedDocument {
            name: name.to_string(),
            uri: format!("https://files/{}", name),
            mime_type: "application/pdf".to_string(),
            display_name: "syllabus.pdf".to_string(),
        }
    }

    #[test]
    fn test_new_session_is_empty_and_locked() {
        let state = SessionState::new();
        assert!(state.history().is_empty());
        assert!(state.document().is_none());
        assert!(state.outline().is_none());
        assert!(state.preferences().is_empty());
        assert!(!state.is_unlocked());
    }

    #[test]
    fn test_user_message_count_ignores_assistant() {
        let mut state = SessionState::new();
        state.push(Message::user("q1"));
        state.push(Message::assistant("a1"));
        state.push(Message::user("q2"));
        assert_eq!(state.user_message_count(), 2);
    }

    #[test]
    fn test_attach_document_resets_transcript() {
        let mut state = SessionState::new();
        state.attach_document(document("files/1"));
        state.push(Message::user("q"));
        state.set_outline(Some(TopicOutline::default()));

        state.attach_document(document("files/2"));
        assert!(state.history().is_empty());
        assert!(state.outline().is_none());
        assert_eq!(state.document().unwrap().name, "files/2");
    }

    #[test]
    fn test_take_document_clears_but_keeps_flags() {
        let mut state = SessionState::new();
        state.unlock();
        state.attach_document(document("files/1"));
        state.push(Message::user("q"));

        let taken = state.take_document().unwrap();
        assert_eq!(taken.name, "files/1");
        assert!(state.document().is_none());
        assert!(state.history().is_empty());
        assert!(state.is_unlocked());
        assert!(state.take_document().is_none());
    }

    #[test]
    fn test_indexed_document_from_remote_file() {
        let doc = IndexedDocument::from(RemoteFile {
            name: "files/9".to_string(),
            uri: "https://files/9".to_string(),
            mime_type: "image/png".to_string(),
            display_name: "notes.png".to_string(),
            state: FileState::Active,
        });
        assert_eq!(doc.document_ref().uri, "https://files/9");
        assert_eq!(doc.document_ref().mime_type, "image/png");
        assert_eq!(doc.display_name, "notes.png");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
