//! crates/studyspark_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Serde renames keep the persisted JSON camelCased so backup files
//! written by earlier versions of the app import cleanly.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The sign-in mechanism that produced the active profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Microsoft,
    Email,
}

/// The locally stored user profile. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_email: Option<String>,
    /// Preset avatar URL or an inline-encoded image (data URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

/// A generated study guide. Immutable once created, apart from deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuide {
    pub id: String,
    pub topic: String,
    /// Markdown.
    pub content: String,
    pub date_created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: String,
    pub topic: String,
    pub cards: Vec<Flashcard>,
    pub date_created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    /// Exactly four choices.
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer_index: usize,
    pub explanation: String,
    /// Short description for generating an image if needed (e.g. "Graph of y=2x").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
    /// Defaulted on import: quizzes saved by earlier app versions carried no id.
    #[serde(default)]
    pub id: String,
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    pub date_created: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One entry of the tutoring conversation. Append-only except for explicit clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// Inline-encoded attachment sent by the user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_url: Option<String>,
}

impl ChatMessage {
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            image: None,
            is_error: None,
            visual_url: None,
        }
    }

    pub fn user(text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            image,
            is_error: None,
            visual_url: None,
        }
    }
}

/// Requested difficulty for quiz generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full-state backup document written by the export operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub user: Option<User>,
    pub guides: Vec<StudyGuide>,
    pub flashcards: Vec<FlashcardSet>,
    pub quizzes: Vec<QuizData>,
    pub chat: Vec<ChatMessage>,
    pub version: String,
    pub timestamp: String,
}

/// The import-side view of a backup: every field independently optional, so a
/// partial document restores only the pieces it carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupImport {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub guides: Option<Vec<StudyGuide>>,
    #[serde(default)]
    pub flashcards: Option<Vec<FlashcardSet>>,
    #[serde(default)]
    pub quizzes: Option<Vec<QuizData>>,
    #[serde(default)]
    pub chat: Option<Vec<ChatMessage>>,
}

/// Time-derived entity id: milliseconds since the epoch, as a string.
/// Unique under normal single-threaded creation.
pub fn new_entity_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// ISO-8601 creation timestamp for new entities.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
