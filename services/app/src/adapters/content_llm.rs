//! services/app/src/adapters/content_llm.rs
//!
//! This module contains the adapter for study-content generation: guides,
//! flashcards, and quizzes. It implements the `ContentGenerationService` port
//! from the `core` crate. Flashcards and quizzes are requested as
//! schema-constrained JSON; the parse helpers validate the shape before
//! anything reaches the domain model.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use studyspark_core::{
    domain::{Difficulty, Flashcard, QuizQuestion},
    ports::{ContentGenerationService, PortError, PortResult},
};

/// Number of answer choices every quiz question must carry.
const QUIZ_OPTION_COUNT: usize = 4;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentGenerationService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiContentAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiContentAdapter {
    /// Creates a new `OpenAiContentAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// One plain or schema-constrained completion round trip, returning the
    /// raw text of the first choice.
    async fn complete(
        &self,
        prompt: String,
        response_format: Option<ResponseFormat>,
    ) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages).n(1);
        if let Some(format) = response_format {
            builder.response_format(format);
        }
        let request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Content LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Content LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}

//=========================================================================================
// Response Schemas and Parsing
//=========================================================================================

/// Structured outputs require an object at the schema root, so the arrays are
/// wrapped in a single-field object.
fn flashcard_schema() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: Some("A set of study flashcards.".to_string()),
            name: "flashcards".to_string(),
            schema: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "cards": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "front": { "type": "string" },
                                "back": { "type": "string" }
                            },
                            "required": ["front", "back"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["cards"],
                "additionalProperties": false
            })),
            strict: Some(true),
        },
    }
}

fn quiz_schema() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: Some("A multiple-choice quiz.".to_string()),
            name: "quiz".to_string(),
            schema: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "questions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "question": { "type": "string" },
                                "options": {
                                    "type": "array",
                                    "items": { "type": "string" }
                                },
                                "correctAnswerIndex": { "type": "integer" },
                                "explanation": { "type": "string" },
                                "visualDescription": { "type": ["string", "null"] }
                            },
                            "required": [
                                "question", "options", "correctAnswerIndex",
                                "explanation", "visualDescription"
                            ],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["questions"],
                "additionalProperties": false
            })),
            strict: Some(true),
        },
    }
}

#[derive(Deserialize)]
struct FlashcardEnvelope {
    cards: Vec<Flashcard>,
}

#[derive(Deserialize)]
struct QuizEnvelope {
    questions: Vec<QuizQuestion>,
}

/// Parses a flashcard payload, accepting both the wrapped object and a bare
/// array (providers are not perfectly consistent about the envelope).
fn parse_flashcards(raw: &str) -> PortResult<Vec<Flashcard>> {
    if let Ok(envelope) = serde_json::from_str::<FlashcardEnvelope>(raw) {
        return Ok(envelope.cards);
    }
    serde_json::from_str::<Vec<Flashcard>>(raw)
        .map_err(|e| PortError::InvalidData(format!("unparsable flashcard payload: {e}")))
}

/// Parses a quiz payload and drops any question that violates the fixed shape
/// (exactly four options, correct index in range).
fn parse_quiz(raw: &str) -> PortResult<Vec<QuizQuestion>> {
    let questions = if let Ok(envelope) = serde_json::from_str::<QuizEnvelope>(raw) {
        envelope.questions
    } else {
        serde_json::from_str::<Vec<QuizQuestion>>(raw)
            .map_err(|e| PortError::InvalidData(format!("unparsable quiz payload: {e}")))?
    };

    Ok(questions
        .into_iter()
        .filter(|q| {
            q.options.len() == QUIZ_OPTION_COUNT && q.correct_answer_index < QUIZ_OPTION_COUNT
        })
        .collect())
}

//=========================================================================================
// `ContentGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentGenerationService for OpenAiContentAdapter {
    /// Generates a Markdown study guide as a single free-text response.
    async fn generate_study_guide(&self, topic: &str) -> PortResult<String> {
        let prompt = format!(
            "Create a comprehensive study guide for: {topic}.\n\
             Focus on conceptual understanding. Use Markdown."
        );
        self.complete(prompt, None).await
    }

    async fn generate_flashcards(&self, topic: &str, count: usize) -> PortResult<Vec<Flashcard>> {
        let prompt = format!(
            "Create {count} study flashcards about: {topic}. \
             Focus on key terms and definitions."
        );
        let raw = self.complete(prompt, Some(flashcard_schema())).await?;
        parse_flashcards(&raw)
    }

    async fn generate_quiz(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> PortResult<Vec<QuizQuestion>> {
        let prompt = format!(
            "Create a 5-question multiple choice quiz about: {topic}. \
             Difficulty: {difficulty}. Each question has exactly 4 options."
        );
        let raw = self.complete(prompt, Some(quiz_schema())).await?;
        parse_quiz(&raw)
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashcards_parse_from_envelope_and_bare_array() {
        let enveloped = r#"{"cards":[{"front":"Osmosis","back":"Diffusion of water"}]}"#;
        assert_eq!(parse_flashcards(enveloped).unwrap().len(), 1);

        let bare = r#"[{"front":"Osmosis","back":"Diffusion of water"}]"#;
        assert_eq!(parse_flashcards(bare).unwrap().len(), 1);
    }

    #[test]
    fn unparsable_flashcard_payload_is_invalid_data() {
        let err = parse_flashcards("I cannot answer that.").unwrap_err();
        assert!(matches!(err, PortError::InvalidData(_)));
    }

    #[test]
    fn quiz_parse_keeps_only_well_formed_questions() {
        let raw = r#"{"questions":[
            {"question":"Good","options":["a","b","c","d"],"correctAnswerIndex":2,
             "explanation":"ok","visualDescription":null},
            {"question":"Three options","options":["a","b","c"],"correctAnswerIndex":0,
             "explanation":"bad","visualDescription":null},
            {"question":"Index out of range","options":["a","b","c","d"],"correctAnswerIndex":4,
             "explanation":"bad","visualDescription":"Graph of y=2x"}
        ]}"#;
        let questions = parse_quiz(raw).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Good");
        assert!(questions[0].visual_description.is_none());
    }

    #[test]
    fn quiz_visual_description_survives_parsing() {
        let raw = r#"[{"question":"Slope?","options":["0","1","2","3"],"correctAnswerIndex":2,
            "explanation":"Rise over run.","visualDescription":"Graph of y=2x"}]"#;
        let questions = parse_quiz(raw).unwrap();
        assert_eq!(
            questions[0].visual_description.as_deref(),
            Some("Graph of y=2x")
        );
    }

    #[test]
    fn unparsable_quiz_payload_is_invalid_data() {
        assert!(matches!(
            parse_quiz("{\"questions\": oops").unwrap_err(),
            PortError::InvalidData(_)
        ));
    }
}
