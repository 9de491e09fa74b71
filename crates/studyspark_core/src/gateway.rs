//! crates/studyspark_core/src/gateway.rs
//!
//! The content generation gateway: a façade over the AI service ports that
//! applies the failure policy. Transport and parse errors stop here and come
//! out as an empty result, an absent value, or a canned user-facing message;
//! callers never see a raw port error.

use crate::domain::{Difficulty, Flashcard, QuizQuestion};
use crate::ports::{ContentGenerationService, TutorService, VisualGenerationService};
use std::sync::Arc;

/// Shown when the tutor backend is unreachable.
pub const TUTOR_FALLBACK: &str =
    "Sorry, I'm having a hard time connecting right now. Can you try rephrasing your question?";

/// Shown when the tutor answers with an empty body.
pub const TUTOR_EMPTY_NUDGE: &str =
    "I'm thinking... Let's look at this another way. What's the first thing you notice about this problem?";

/// Shown when study-guide generation fails.
pub const GUIDE_FALLBACK: &str = "Could not create the study guide.";

pub const DEFAULT_FLASHCARD_COUNT: usize = 5;

#[derive(Clone)]
pub struct ContentGateway {
    tutor: Arc<dyn TutorService>,
    content: Arc<dyn ContentGenerationService>,
    visual: Arc<dyn VisualGenerationService>,
}

impl ContentGateway {
    pub fn new(
        tutor: Arc<dyn TutorService>,
        content: Arc<dyn ContentGenerationService>,
        visual: Arc<dyn VisualGenerationService>,
    ) -> Self {
        Self {
            tutor,
            content,
            visual,
        }
    }

    /// Socratic homework help. Never fails: transport errors become the
    /// canned apology, an empty answer becomes a nudge to keep going.
    pub async fn explain(&self, text: &str, image: Option<&str>) -> String {
        match self.tutor.explain(text, image).await {
            Ok(answer) if answer.trim().is_empty() => TUTOR_EMPTY_NUDGE.to_string(),
            Ok(answer) => answer,
            Err(_) => TUTOR_FALLBACK.to_string(),
        }
    }

    /// Markdown study guide for `topic`, or the fallback string on failure.
    pub async fn study_guide(&self, topic: &str) -> String {
        self.content
            .generate_study_guide(topic)
            .await
            .unwrap_or_else(|_| GUIDE_FALLBACK.to_string())
    }

    /// Flashcards for `topic`; empty on any transport or parse failure.
    pub async fn flashcards(&self, topic: &str, count: usize) -> Vec<Flashcard> {
        self.content
            .generate_flashcards(topic, count)
            .await
            .unwrap_or_default()
    }

    /// Quiz questions for `topic`; empty on any transport or parse failure.
    pub async fn quiz(&self, topic: &str, difficulty: Difficulty) -> Vec<QuizQuestion> {
        self.content
            .generate_quiz(topic, difficulty)
            .await
            .unwrap_or_default()
    }

    /// Educational diagram for `prompt` as a data URL, or `None` on failure so
    /// callers can simply skip showing an image.
    pub async fn visual(&self, prompt: &str) -> Option<String> {
        self.visual.generate_visual(prompt).await.ok()
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;

    /// Mock AI ports that either succeed with fixed content or fail.
    struct MockAi {
        fail: bool,
    }

    #[async_trait]
    impl TutorService for MockAi {
        async fn explain(&self, _text: &str, _image: Option<&str>) -> PortResult<String> {
            if self.fail {
                Err(PortError::Unexpected("backend down".to_string()))
            } else {
                Ok("What do you notice about the exponents?".to_string())
            }
        }
    }

    #[async_trait]
    impl ContentGenerationService for MockAi {
        async fn generate_study_guide(&self, topic: &str) -> PortResult<String> {
            if self.fail {
                Err(PortError::Unexpected("backend down".to_string()))
            } else {
                Ok(format!("# {topic}\n\nKey ideas..."))
            }
        }

        async fn generate_flashcards(
            &self,
            _topic: &str,
            count: usize,
        ) -> PortResult<Vec<Flashcard>> {
            if self.fail {
                Err(PortError::InvalidData("unparsable body".to_string()))
            } else {
                Ok(vec![
                    Flashcard {
                        front: "Mitochondria".to_string(),
                        back: "Powerhouse of the cell".to_string(),
                    };
                    count
                ])
            }
        }

        async fn generate_quiz(
            &self,
            _topic: &str,
            _difficulty: Difficulty,
        ) -> PortResult<Vec<QuizQuestion>> {
            if self.fail {
                Err(PortError::InvalidData("unparsable body".to_string()))
            } else {
                Ok(vec![QuizQuestion {
                    question: "2 + 2?".to_string(),
                    options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                    correct_answer_index: 1,
                    explanation: "Addition.".to_string(),
                    visual_description: None,
                }])
            }
        }
    }

    #[async_trait]
    impl VisualGenerationService for MockAi {
        async fn generate_visual(&self, _prompt: &str) -> PortResult<String> {
            if self.fail {
                Err(PortError::Unexpected("backend down".to_string()))
            } else {
                Ok("data:image/png;base64,AAAA".to_string())
            }
        }
    }

    fn gateway(fail: bool) -> ContentGateway {
        let ai = Arc::new(MockAi { fail });
        ContentGateway::new(ai.clone(), ai.clone(), ai)
    }

    #[tokio::test]
    async fn flashcard_failure_degrades_to_empty() {
        assert!(gateway(true).flashcards("Biology", 5).await.is_empty());
        assert_eq!(gateway(false).flashcards("Biology", 5).await.len(), 5);
    }

    #[tokio::test]
    async fn quiz_failure_degrades_to_empty() {
        assert!(gateway(true).quiz("Algebra", Difficulty::Medium).await.is_empty());
        assert_eq!(
            gateway(false).quiz("Algebra", Difficulty::Hard).await.len(),
            1
        );
    }

    #[tokio::test]
    async fn explain_failure_becomes_canned_message() {
        assert_eq!(gateway(true).explain("solve x+1=2", None).await, TUTOR_FALLBACK);
        let ok = gateway(false).explain("solve x+1=2", None).await;
        assert!(ok.contains("exponents"));
    }

    #[tokio::test]
    async fn guide_failure_becomes_fallback_text() {
        assert_eq!(gateway(true).study_guide("Chemistry").await, GUIDE_FALLBACK);
    }

    #[tokio::test]
    async fn visual_failure_becomes_none() {
        assert!(gateway(true).visual("graph of y=2x").await.is_none());
        assert!(gateway(false).visual("graph of y=2x").await.is_some());
    }
}
