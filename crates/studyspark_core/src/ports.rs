//! crates/studyspark_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like local storage,
//! generative-AI backends, or email delivery.

use crate::domain::{Difficulty, Flashcard, QuizQuestion};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Key-value persistence for named JSON blobs. The substrate is synchronous
/// (local files standing in for browser storage), so this port is too.
///
/// Values are raw JSON strings; deserialization and its fallback policy live
/// in the caller, so a corrupt blob never crashes the adapter.
pub trait StorageService: Send + Sync {
    /// Returns the stored blob for `key`, or `None` when the key is absent.
    fn load(&self, key: &str) -> PortResult<Option<String>>;
    fn save(&self, key: &str, raw: &str) -> PortResult<()>;
    /// Removes the key entirely. Absence, not an empty value, is the persisted
    /// representation of "no data" for keys like the user profile.
    fn remove(&self, key: &str) -> PortResult<()>;
}

/// The Socratic homework tutor: guides the student toward the answer without
/// ever revealing it. The "never reveal" contract is enforced at the prompt
/// level by the adapter; it cannot be verified locally.
#[async_trait]
pub trait TutorService: Send + Sync {
    /// `image` is an inline base64-encoded JPEG of the problem, if the student
    /// attached one.
    async fn explain(&self, text: &str, image: Option<&str>) -> PortResult<String>;
}

/// Structured study-content generation: guides, flashcards, quizzes.
#[async_trait]
pub trait ContentGenerationService: Send + Sync {
    /// Returns a Markdown study guide for `topic`.
    async fn generate_study_guide(&self, topic: &str) -> PortResult<String>;
    /// Returns `count` term/definition flashcards for `topic`.
    async fn generate_flashcards(&self, topic: &str, count: usize) -> PortResult<Vec<Flashcard>>;
    /// Returns a multiple-choice quiz (4 options per question, zero-based
    /// correct index) for `topic`.
    async fn generate_quiz(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> PortResult<Vec<QuizQuestion>>;
}

/// Educational diagram/graph generation.
#[async_trait]
pub trait VisualGenerationService: Send + Sync {
    /// Returns an inline image (data URL) for `prompt`.
    async fn generate_visual(&self, prompt: &str) -> PortResult<String>;
}

/// One-time-code delivery for onboarding verification.
#[async_trait]
pub trait EmailDeliveryService: Send + Sync {
    async fn send_code(&self, recipient: &str, display_name: &str, code: &str) -> PortResult<()>;
}
