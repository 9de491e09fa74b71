//! services/app/src/adapters/visual.rs
//!
//! This module contains the adapter for educational diagram/graph generation.
//! It implements the `VisualGenerationService` port from the `core` crate by
//! calling the Gemini image model's REST endpoint directly and returning the
//! inline image as a data URL.

use async_trait::async_trait;
use serde::Deserialize;
use studyspark_core::ports::{PortError, PortResult, VisualGenerationService};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct GeminiVisualAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiVisualAdapter {
    /// Creates a new `GeminiVisualAdapter`.
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
        }
    }
}

/// Wraps the subject in the textbook-diagram style rules so every generated
/// visual shares the same academic look.
fn visual_prompt(subject: &str) -> String {
    format!(
        "Create a clear, educational, textbook-style diagram or graph for: {subject}.\n\n\
         STRICT RULES FOR MATH/GRAPHS:\n\
         1. If asking for a graph, draw a clean 2D Cartesian coordinate system on a WHITE background.\n\
         2. Axis lines must be black. Function line should be bold blue.\n\
         3. Geometry shapes must have clear black outlines and light shading.\n\n\
         General Style: Minimalist, academic, high contrast, white background."
    )
}

//=========================================================================================
// Response Shapes
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
}

//=========================================================================================
// `VisualGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VisualGenerationService for GeminiVisualAdapter {
    /// Generates one image and returns it inline as a `data:` URL.
    async fn generate_visual(&self, prompt: &str) -> PortResult<String> {
        let url = format!(
            "{GEMINI_API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": visual_prompt(prompt) }] }],
            "generationConfig": { "imageConfig": { "aspectRatio": "16:9" } }
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "image backend returned {status}: {detail}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PortError::InvalidData(e.to_string()))?;

        // The image comes back as one inline-data part among the candidates.
        let image = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data);

        match image {
            Some(inline) => Ok(format!("data:image/png;base64,{}", inline.data)),
            None => Err(PortError::InvalidData(
                "image backend returned no inline image".to_string(),
            )),
        }
    }
}
