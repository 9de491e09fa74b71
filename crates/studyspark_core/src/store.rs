//! crates/studyspark_core/src/store.rs
//!
//! The application state store: single source of truth for the active user
//! profile and the four owned collections (study guides, flashcard sets,
//! quizzes, chat history). Every mutation persists exactly the piece of state
//! it touched to its own storage key, so a serialization failure in one
//! collection never affects another.

use crate::domain::{
    BackupDocument, BackupImport, ChatMessage, FlashcardSet, QuizData, StudyGuide, User,
};
use crate::ports::{PortError, PortResult, StorageService};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Storage keys, kept byte-for-byte identical to the original app so existing
/// backups and persisted state remain readable.
pub const KEY_USER: &str = "studyspark_user";
pub const KEY_GUIDES: &str = "studyspark_guides";
pub const KEY_FLASHCARDS: &str = "studyspark_flashcards";
pub const KEY_QUIZZES: &str = "studyspark_quizzes";
pub const KEY_CHAT: &str = "studyspark_chat_v1";

pub const BACKUP_VERSION: &str = "1.0.0";

/// Greeting seeded into the chat after an explicit clear.
pub const CHAT_CLEARED_GREETING: &str = "History cleared. What should we tackle next? 🧠";

//=========================================================================================
// Request Tokens
//=========================================================================================

/// The features whose in-flight generation requests are tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Explain,
    Guide,
    Flashcards,
    Quiz,
    Visual,
}

/// A ticket for one issued generation request. A response may only be applied
/// while its token is still the latest one issued for its feature; this closes
/// the last-writer-wins race between overlapping requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    feature: Feature,
    seq: u64,
}

/// Per-feature monotonic sequence of issued requests.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: HashMap<Feature, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token for `feature`, invalidating any earlier one.
    pub fn begin(&mut self, feature: Feature) -> RequestToken {
        let seq = self.latest.entry(feature).or_insert(0);
        *seq += 1;
        RequestToken { feature, seq: *seq }
    }

    /// Whether a response carrying `token` may still be applied.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.latest.get(&token.feature) == Some(&token.seq)
    }
}

//=========================================================================================
// AppStore
//=========================================================================================

/// Owns the active user and the four collections, synchronizing each to the
/// persistence port on every mutation. Constructed once at startup and passed
/// by reference to consumers.
pub struct AppStore {
    storage: Arc<dyn StorageService>,
    user: Option<User>,
    guides: Vec<StudyGuide>,
    flashcards: Vec<FlashcardSet>,
    quizzes: Vec<QuizData>,
    chat: Vec<ChatMessage>,
    requests: RequestTracker,
}

impl AppStore {
    /// Loads all state from storage. Each key is read independently; a
    /// missing or malformed blob yields the empty default for that key only,
    /// so one corrupt collection never takes down startup.
    pub fn load(storage: Arc<dyn StorageService>) -> Self {
        let user = load_or_default::<Option<User>>(storage.as_ref(), KEY_USER);
        let guides = load_or_default::<Vec<StudyGuide>>(storage.as_ref(), KEY_GUIDES);
        let flashcards = load_or_default::<Vec<FlashcardSet>>(storage.as_ref(), KEY_FLASHCARDS);
        let quizzes = load_or_default::<Vec<QuizData>>(storage.as_ref(), KEY_QUIZZES);
        let chat = load_or_default::<Vec<ChatMessage>>(storage.as_ref(), KEY_CHAT);

        Self {
            storage,
            user,
            guides,
            flashcards,
            quizzes,
            chat,
            requests: RequestTracker::new(),
        }
    }

    // --- Accessors ---

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn guides(&self) -> &[StudyGuide] {
        &self.guides
    }

    pub fn flashcards(&self) -> &[FlashcardSet] {
        &self.flashcards
    }

    pub fn quizzes(&self) -> &[QuizData] {
        &self.quizzes
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn requests(&mut self) -> &mut RequestTracker {
        &mut self.requests
    }

    // --- Session ---

    /// Sets the active user and persists it.
    pub fn login(&mut self, user: User) -> PortResult<()> {
        self.user = Some(user);
        self.persist_user()
    }

    /// Clears the active user and the chat history, removing both keys from
    /// storage. Study material (guides, flashcards, quizzes) is left intact
    /// for the next session on this machine.
    pub fn logout(&mut self) -> PortResult<()> {
        self.user = None;
        self.chat.clear();
        self.storage.remove(KEY_USER)?;
        self.storage.remove(KEY_CHAT)
    }

    // --- Study guides ---

    /// Prepends `guide` (most-recent-first ordering) and persists.
    pub fn save_guide(&mut self, guide: StudyGuide) -> PortResult<()> {
        self.guides.insert(0, guide);
        persist(self.storage.as_ref(), KEY_GUIDES, &self.guides)
    }

    /// Removes the guide with `id`, if present, preserving the order of the
    /// rest. Deleting an absent id is a no-op (the collection still persists).
    pub fn delete_guide(&mut self, id: &str) -> PortResult<()> {
        self.guides.retain(|g| g.id != id);
        persist(self.storage.as_ref(), KEY_GUIDES, &self.guides)
    }

    pub fn set_guides(&mut self, guides: Vec<StudyGuide>) -> PortResult<()> {
        self.guides = guides;
        persist(self.storage.as_ref(), KEY_GUIDES, &self.guides)
    }

    // --- Flashcard sets ---

    pub fn save_flashcards(&mut self, set: FlashcardSet) -> PortResult<()> {
        self.flashcards.insert(0, set);
        persist(self.storage.as_ref(), KEY_FLASHCARDS, &self.flashcards)
    }

    pub fn delete_flashcards(&mut self, id: &str) -> PortResult<()> {
        self.flashcards.retain(|s| s.id != id);
        persist(self.storage.as_ref(), KEY_FLASHCARDS, &self.flashcards)
    }

    pub fn set_flashcards(&mut self, sets: Vec<FlashcardSet>) -> PortResult<()> {
        self.flashcards = sets;
        persist(self.storage.as_ref(), KEY_FLASHCARDS, &self.flashcards)
    }

    // --- Quizzes ---

    pub fn save_quiz(&mut self, quiz: QuizData) -> PortResult<()> {
        self.quizzes.insert(0, quiz);
        persist(self.storage.as_ref(), KEY_QUIZZES, &self.quizzes)
    }

    pub fn delete_quiz(&mut self, id: &str) -> PortResult<()> {
        self.quizzes.retain(|q| q.id != id);
        persist(self.storage.as_ref(), KEY_QUIZZES, &self.quizzes)
    }

    pub fn set_quizzes(&mut self, quizzes: Vec<QuizData>) -> PortResult<()> {
        self.quizzes = quizzes;
        persist(self.storage.as_ref(), KEY_QUIZZES, &self.quizzes)
    }

    // --- Chat history ---

    pub fn push_chat_message(&mut self, message: ChatMessage) -> PortResult<()> {
        self.chat.push(message);
        persist(self.storage.as_ref(), KEY_CHAT, &self.chat)
    }

    pub fn set_chat(&mut self, messages: Vec<ChatMessage>) -> PortResult<()> {
        self.chat = messages;
        persist(self.storage.as_ref(), KEY_CHAT, &self.chat)
    }

    /// Resets the conversation to a single greeting from the model.
    pub fn clear_chat(&mut self) -> PortResult<()> {
        self.chat = vec![ChatMessage::model(CHAT_CLEARED_GREETING)];
        persist(self.storage.as_ref(), KEY_CHAT, &self.chat)
    }

    // --- Export / Import ---

    /// Snapshot of the full application state as a backup document.
    pub fn export(&self) -> BackupDocument {
        BackupDocument {
            user: self.user.clone(),
            guides: self.guides.clone(),
            flashcards: self.flashcards.clone(),
            quizzes: self.quizzes.clone(),
            chat: self.chat.clone(),
            version: BACKUP_VERSION.to_string(),
            timestamp: crate::domain::now_iso(),
        }
    }

    /// Serializes the backup document, returning `(suggested_filename, json)`.
    pub fn export_json(&self) -> PortResult<(String, String)> {
        let doc = self.export();
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let date = chrono::Utc::now().format("%Y-%m-%d");
        Ok((format!("StudySpark_Backup_{date}.json"), json))
    }

    /// Restores state from a backup document. The parse is all-or-nothing: a
    /// malformed file changes nothing and reports `InvalidData`. Fields absent
    /// from the document are left untouched (partial restore); each present
    /// field replaces its in-memory piece wholesale and is persisted.
    pub fn import_json(&mut self, json: &str) -> PortResult<()> {
        let backup: BackupImport = serde_json::from_str(json)
            .map_err(|_| PortError::InvalidData("invalid backup file".to_string()))?;

        if let Some(user) = backup.user {
            self.login(user)?;
        }
        if let Some(guides) = backup.guides {
            self.set_guides(guides)?;
        }
        if let Some(flashcards) = backup.flashcards {
            self.set_flashcards(flashcards)?;
        }
        if let Some(mut quizzes) = backup.quizzes {
            // Backups from the original app carried no quiz ids. Leaving them
            // all empty would make delete-by-id remove every legacy quiz at
            // once, so assign fresh distinct ids on the way in.
            for (i, quiz) in quizzes.iter_mut().enumerate() {
                if quiz.id.is_empty() {
                    quiz.id = format!("{}-{i}", crate::domain::new_entity_id());
                }
            }
            self.set_quizzes(quizzes)?;
        }
        if let Some(chat) = backup.chat {
            self.set_chat(chat)?;
        }
        Ok(())
    }

    // --- Internals ---

    fn persist_user(&self) -> PortResult<()> {
        match &self.user {
            Some(user) => persist(self.storage.as_ref(), KEY_USER, user),
            // Absence of the key, not a null value, represents "no user".
            None => self.storage.remove(KEY_USER),
        }
    }
}

/// Reads and deserializes one key, treating a missing or malformed blob as the
/// default value for `T`.
fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn StorageService, key: &str) -> T {
    match storage.load(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
        _ => T::default(),
    }
}

fn persist<T: Serialize>(storage: &dyn StorageService, key: &str, value: &T) -> PortResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
    storage.save(key, &raw)
}

//=========================================================================================
// Tests
//=========================================================================================
