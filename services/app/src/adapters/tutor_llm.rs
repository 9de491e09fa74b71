//! services/app/src/adapters/tutor_llm.rs
//!
//! This module contains the adapter for the Socratic homework tutor.
//! It implements the `TutorService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are StudySpark, a world-class Socratic Tutor.

YOUR UNBREAKABLE OATH:
1. NEVER provide a final answer, solution, or value (e.g., "x = 5" or "The theme is betrayal").
2. If a student asks for the answer, politely refuse and explain that your goal is to help THEM find it.
3. Break complex problems into tiny, logical steps.
4. Focus on the "WHY" behind the concept.
5. Ask ONE targeted question at a time to lead the student to the next realization.
6. If they are completely lost, provide a conceptual hint or an analogy.
7. For multiple choice: Don't tell them which letter is right. Explain why the concepts in the options are different.

Response Tone: Encouraging, patient, and challenging.
Formatting: Use Markdown, bolding, and lists for readability."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use studyspark_core::ports::{PortError, PortResult, TutorService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TutorService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTutorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTutorAdapter {
    /// Creates a new `OpenAiTutorAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the user-message content, attaching the homework photo as an
    /// inline data URL when the student provided one.
    fn user_content(
        text: &str,
        image_base64: Option<&str>,
    ) -> Result<ChatCompletionRequestUserMessageContent, OpenAIError> {
        match image_base64 {
            Some(data) => {
                let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(format!("data:image/jpeg;base64,{data}"))
                            .build()?,
                    )
                    .build()?;
                let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(text)
                    .build()?;
                Ok(vec![image_part.into(), text_part.into()].into())
            }
            None => Ok(text.into()),
        }
    }
}

//=========================================================================================
// `TutorService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TutorService for OpenAiTutorAdapter {
    /// Guides the student through the problem without revealing the answer.
    /// The "never reveal" contract lives in the system instruction; it cannot
    /// be verified locally.
    async fn explain(&self, text: &str, image: Option<&str>) -> PortResult<String> {
        let content =
            Self::user_content(text, image).map_err(|e| PortError::Unexpected(e.to_string()))?;

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Tutor LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Tutor LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
